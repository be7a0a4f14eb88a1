//! Alpha-blended compositing of the original and eroded images.

use ndarray::{Array2, Array3, ArrayView2};

use crate::error::ReductionError;
use crate::sample::SampleArray;

/// Blend one sample pair under an alpha weight.
///
/// The endpoints short-circuit so that `alpha == 0` returns the original
/// sample bit-for-bit and `alpha == 1` returns the eroded sample bit-for-bit;
/// only interior weights go through the arithmetic path.
#[inline]
fn blend(alpha: f64, original: f64, eroded: f64) -> f64 {
    if alpha == 0.0 {
        original
    } else if alpha == 1.0 {
        eroded
    } else {
        alpha * eroded + (1.0 - alpha) * original
    }
}

/// Compose the final image: `alpha * eroded + (1 - alpha) * original`.
///
/// The 2-D alpha mask is broadcast across channels for color input. Being a
/// convex combination, every output sample lies between the corresponding
/// original and eroded samples, and in [0, 1] whenever both inputs do.
///
/// # Errors
/// `ShapeMismatch` when the original and eroded images disagree in shape or
/// channel count, or when the alpha mask does not match their spatial shape.
pub fn compose_final(
    original: &SampleArray,
    eroded: &SampleArray,
    alpha: &ArrayView2<f64>,
) -> Result<SampleArray, ReductionError> {
    let spatial = original.spatial_shape();
    if eroded.spatial_shape() != spatial || eroded.channels() != original.channels() {
        return Err(ReductionError::ShapeMismatch {
            context: "compositing (original vs eroded)",
            expected: spatial,
            actual: eroded.spatial_shape(),
        });
    }
    if alpha.dim() != spatial {
        return Err(ReductionError::ShapeMismatch {
            context: "compositing (alpha mask)",
            expected: spatial,
            actual: alpha.dim(),
        });
    }

    Ok(match (original, eroded) {
        (SampleArray::Mono(orig), SampleArray::Mono(ero)) => {
            let out = Array2::from_shape_fn(spatial, |(y, x)| {
                blend(alpha[[y, x]], orig[[y, x]], ero[[y, x]])
            });
            SampleArray::Mono(out)
        }
        (SampleArray::Rgb(orig), SampleArray::Rgb(ero)) => {
            let (h, w, c) = orig.dim();
            let out = Array3::from_shape_fn((h, w, c), |(y, x, ch)| {
                blend(alpha[[y, x]], orig[[y, x, ch]], ero[[y, x, ch]])
            });
            SampleArray::Rgb(out)
        }
        // Channel counts were checked above.
        _ => unreachable!("channel count mismatch passed validation"),
    })
}
