//! Grayscale morphological erosion.
//!
//! Erosion replaces every sample with the minimum over a square flat
//! structuring element, shrinking bright compact features. Neighbors outside
//! the image are ignored (treated as the maximum possible value), so the
//! border is never artificially darkened into a false frame.

use ndarray::{Array2, Axis};

use crate::error::ReductionError;
use crate::sample::SampleArray;

/// Erode an image with a square structuring element.
///
/// The element has side `kernel_size` (odd, >= 1) and the erosion is applied
/// `iterations` times in sequence; color images erode per channel
/// independently. Output keeps the input's shape and value range.
///
/// A square element is separable, so each pass runs as a horizontal then a
/// vertical sliding minimum instead of a full 2-D window scan.
///
/// # Errors
/// `InvalidParameter` for an even or zero `kernel_size`, or `iterations < 1`.
pub fn erode(
    image: &SampleArray,
    kernel_size: usize,
    iterations: usize,
) -> Result<SampleArray, ReductionError> {
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(ReductionError::InvalidParameter {
            name: "kernel_size",
            value: kernel_size as f64,
            requirement: "must be an odd integer >= 1",
        });
    }
    if iterations < 1 {
        return Err(ReductionError::InvalidParameter {
            name: "erosion_iterations",
            value: iterations as f64,
            requirement: "must be >= 1",
        });
    }

    let radius = kernel_size / 2;
    Ok(match image {
        SampleArray::Mono(plane) => {
            let mut eroded = plane.clone();
            for _ in 0..iterations {
                eroded = erode_plane(&eroded, radius);
            }
            SampleArray::Mono(eroded)
        }
        SampleArray::Rgb(cube) => {
            let mut out = cube.clone();
            for channel in 0..cube.len_of(Axis(2)) {
                let mut plane = cube.index_axis(Axis(2), channel).to_owned();
                for _ in 0..iterations {
                    plane = erode_plane(&plane, radius);
                }
                out.index_axis_mut(Axis(2), channel).assign(&plane);
            }
            SampleArray::Rgb(out)
        }
    })
}

/// One erosion pass: sliding minimum over rows, then over columns.
fn erode_plane(plane: &Array2<f64>, radius: usize) -> Array2<f64> {
    if radius == 0 {
        return plane.clone();
    }
    let rows = sliding_min_rows(plane, radius);
    let cols = sliding_min_rows(&rows.t().to_owned(), radius);
    cols.t().to_owned()
}

/// Minimum over a `2 * radius + 1` window along each row, clamped to bounds.
fn sliding_min_rows(plane: &Array2<f64>, radius: usize) -> Array2<f64> {
    let (height, width) = plane.dim();
    let mut out = Array2::<f64>::zeros((height, width));

    for y in 0..height {
        for x in 0..width {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(width.saturating_sub(1));
            let mut min = f64::INFINITY;
            for t in lo..=hi {
                min = min.min(plane[[y, t]]);
            }
            out[[y, x]] = min;
        }
    }

    out
}
