//! Point-source detection over a luminance array.
//!
//! The detector follows the classic threshold-segment-centroid scheme:
//! subtract the robust background median, mark every pixel whose residual
//! exceeds `threshold_sigma` standard deviations as a seed, group seeds into
//! 8-connected regions, and reduce each region to an intensity-weighted
//! sub-pixel centroid. Elongated regions fail the roundness gate, and
//! centroids closer together than one FWHM collapse onto the brightest of
//! the group, since a single point-spread profile of that width cannot
//! produce two resolvable sources at smaller separation.

pub mod centroid;
pub mod thresholding;

use ndarray::ArrayView2;

pub use centroid::{region_centroid, RegionCentroid};
pub use thresholding::{apply_threshold, connected_components, BoundingBox};

use crate::error::ReductionError;
use crate::stats::BackgroundStats;

/// A detected point source.
///
/// Produced by [`detect_stars`] and consumed by the mask rasterizer. The
/// output order is unspecified; treat the collection as a set.
#[derive(Debug, Clone, PartialEq)]
pub struct StarCandidate {
    /// Centroid x-coordinate (column), sub-pixel
    pub x: f64,
    /// Centroid y-coordinate (row), sub-pixel
    pub y: f64,
    /// Peak amplitude above the background median
    pub flux: f64,
}

/// Detect star candidates in a luminance array.
///
/// # Arguments
/// * `luminance` - 2-D luminance array in the same units the statistics were
///   computed in (detection thresholds are calibrated against raw units)
/// * `stats` - sigma-clipped background statistics of `luminance`
/// * `fwhm` - expected point-source full width at half maximum, pixels
/// * `threshold_sigma` - detection threshold in background standard deviations
/// * `max_aspect_ratio` - roundness gate for rejecting non-stellar blobs
///
/// # Returns
/// Candidates with sub-pixel centroids. Zero detections is a valid outcome
/// and returns an empty vector.
///
/// # Errors
/// * `EmptyInput` for a zero-sized luminance array
/// * `InvalidParameter` for non-positive `fwhm` or `threshold_sigma`
pub fn detect_stars(
    luminance: &ArrayView2<f64>,
    stats: &BackgroundStats,
    fwhm: f64,
    threshold_sigma: f64,
    max_aspect_ratio: f64,
) -> Result<Vec<StarCandidate>, ReductionError> {
    if !(fwhm > 0.0) {
        return Err(ReductionError::InvalidParameter {
            name: "fwhm",
            value: fwhm,
            requirement: "must be positive",
        });
    }
    if !(threshold_sigma > 0.0) {
        return Err(ReductionError::InvalidParameter {
            name: "threshold_sigma",
            value: threshold_sigma,
            requirement: "must be positive",
        });
    }
    if luminance.is_empty() {
        return Err(ReductionError::EmptyInput("star detection"));
    }

    let subtracted = luminance.mapv(|v| v - stats.median);
    let threshold = threshold_sigma * stats.stddev;

    let seeds = apply_threshold(&subtracted.view(), threshold);
    let (labels, bboxes) = connected_components(&seeds.view());

    let mut regions: Vec<RegionCentroid> = Vec::with_capacity(bboxes.len());
    for (index, bbox) in bboxes.iter().enumerate() {
        let label = index as u32 + 1;
        if let Some(region) = region_centroid(&subtracted.view(), &labels.view(), label, bbox) {
            if region.is_round(max_aspect_ratio) {
                regions.push(region);
            }
        }
    }

    let candidates = merge_by_separation(regions, fwhm);
    log::debug!(
        "detected {} candidates ({} raw regions, threshold {:.4})",
        candidates.len(),
        bboxes.len(),
        threshold
    );

    Ok(candidates)
}

/// Collapse centroids closer than `min_separation` onto the brightest one.
///
/// Regions are visited in descending peak order (ties broken by position so
/// the result does not depend on input order); a region survives only if no
/// brighter survivor lies within `min_separation` pixels.
fn merge_by_separation(mut regions: Vec<RegionCentroid>, min_separation: f64) -> Vec<StarCandidate> {
    regions.sort_by(|a, b| {
        b.peak
            .total_cmp(&a.peak)
            .then(a.y.total_cmp(&b.y))
            .then(a.x.total_cmp(&b.x))
    });

    let min_sep_sq = min_separation * min_separation;
    let mut kept: Vec<StarCandidate> = Vec::with_capacity(regions.len());

    for region in regions {
        let crowded = kept.iter().any(|star| {
            let dx = star.x - region.x;
            let dy = star.y - region.y;
            dx * dx + dy * dy < min_sep_sq
        });
        if !crowded {
            kept.push(StarCandidate {
                x: region.x,
                y: region.y,
                flux: region.peak,
            });
        }
    }

    kept
}
