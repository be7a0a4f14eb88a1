//! Star mask rasterization and smoothing.
//!
//! The rasterizer burns a filled disk around every candidate centroid into a
//! binary mask; the smoother turns that mask into a continuous alpha mask by
//! Gaussian blurring and cutting off near-zero residue.

use ndarray::{Array2, ArrayView2};

use crate::convolve2d::gaussian_blur;
use crate::detection::StarCandidate;
use crate::error::ReductionError;

/// Standard deviation of the optional second smoothing pass. The interactive
/// variant of the original tool always re-blurred the thresholded mask with
/// this fixed width.
const SECOND_PASS_SIGMA: f64 = 2.0;

/// Rasterize star candidates into a binary disk mask.
///
/// Every candidate whose rounded centroid lies inside `shape` contributes a
/// filled disk of the given radius; candidates centered outside the image are
/// skipped entirely. Overlapping disks union together, so the result depends
/// only on the candidate set and radius, never on iteration order.
///
/// Disk offsets are precomputed once, keeping the cost at
/// O(n_stars * radius^2) regardless of field density.
///
/// # Errors
/// `InvalidParameter` when `radius` is not positive.
pub fn rasterize_star_mask(
    candidates: &[StarCandidate],
    shape: (usize, usize),
    radius: f64,
) -> Result<Array2<bool>, ReductionError> {
    if !(radius > 0.0) {
        return Err(ReductionError::InvalidParameter {
            name: "mask_radius",
            value: radius,
            requirement: "must be positive",
        });
    }

    let (height, width) = shape;
    let mut mask = Array2::<bool>::from_elem(shape, false);

    let reach = radius.floor() as i64;
    let radius_sq = radius * radius;
    let mut offsets = Vec::new();
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            if (dy * dy + dx * dx) as f64 <= radius_sq {
                offsets.push((dy, dx));
            }
        }
    }

    for candidate in candidates {
        let cy = candidate.y.round() as i64;
        let cx = candidate.x.round() as i64;
        if cy < 0 || cy >= height as i64 || cx < 0 || cx >= width as i64 {
            continue;
        }

        for &(dy, dx) in &offsets {
            let y = cy + dy;
            let x = cx + dx;
            if y >= 0 && y < height as i64 && x >= 0 && x < width as i64 {
                mask[[y as usize, x as usize]] = true;
            }
        }
    }

    Ok(mask)
}

/// Smooth a binary mask into a continuous alpha mask in [0, 1].
///
/// The mask is Gaussian-blurred with standard deviation `sigma`, then every
/// value at or below `threshold` is cut to exactly 0 so diffuse haze far from
/// any star does not leak into the blend. The surviving values are *not*
/// renormalized: when the blur spreads a small disk the maximum stays below 1,
/// which keeps halos from forming around reduced stars.
///
/// With `double_smooth` the thresholded mask is blurred once more with a
/// fixed sigma of 2.0, reproducing the softer falloff of the interactive
/// variant. Single-pass is the canonical behavior.
///
/// # Errors
/// `InvalidParameter` when `sigma` is not positive or `threshold` lies
/// outside [0, 1].
pub fn smooth_star_mask(
    mask: &ArrayView2<bool>,
    sigma: f64,
    threshold: f64,
    double_smooth: bool,
) -> Result<Array2<f64>, ReductionError> {
    if !(sigma > 0.0) {
        return Err(ReductionError::InvalidParameter {
            name: "smooth_sigma",
            value: sigma,
            requirement: "must be positive",
        });
    }
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ReductionError::InvalidParameter {
            name: "smooth_threshold",
            value: threshold,
            requirement: "must lie in [0, 1]",
        });
    }

    let float_mask = mask.mapv(|m| if m { 1.0 } else { 0.0 });
    let blurred = gaussian_blur(&float_mask.view(), sigma);
    let mut alpha = blurred.mapv(|v| if v > threshold { v } else { 0.0 });

    if double_smooth {
        alpha = gaussian_blur(&alpha.view(), SECOND_PASS_SIGMA);
    }

    Ok(alpha)
}
