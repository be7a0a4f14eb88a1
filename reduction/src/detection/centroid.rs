//! Intensity-weighted centroiding and shape moments for labeled regions.

use ndarray::ArrayView2;

use super::thresholding::BoundingBox;

/// Centroid and shape characterization of one labeled region.
///
/// Positions are sub-pixel; shape comes from the eigenvalues of the second
/// central moment (covariance) matrix.
#[derive(Debug, Clone)]
pub struct RegionCentroid {
    /// Centroid x-coordinate (column), sub-pixel
    pub x: f64,
    /// Centroid y-coordinate (row), sub-pixel
    pub y: f64,
    /// Maximum pixel value inside the region
    pub peak: f64,
    /// Aspect ratio from covariance eigenvalues (1.0 = circular)
    pub aspect_ratio: f64,
    /// Estimated diameter in pixels from the mean eigenvalue
    pub diameter: f64,
}

impl RegionCentroid {
    /// Roundness gate: stellar images are near-circular, so a region whose
    /// major/minor axis ratio exceeds `max_aspect_ratio` is treated as an
    /// artifact (streak, diffraction spike, cosmic ray track).
    pub fn is_round(&self, max_aspect_ratio: f64) -> bool {
        self.aspect_ratio <= max_aspect_ratio
    }
}

/// Compute the intensity-weighted centroid of a labeled region.
///
/// Weights are the pixel values of `image`; callers pass the
/// background-subtracted luminance so that weights are non-negative inside a
/// region that passed thresholding.
///
/// # Arguments
/// * `image` - weight image (background-subtracted luminance)
/// * `labels` - label image from connected component analysis
/// * `label` - region to measure (labels start at 1)
/// * `bbox` - bounding box of the region
///
/// # Returns
/// `None` when the region carries no positive weight, which cannot happen
/// for regions produced by a strict positive threshold.
pub fn region_centroid(
    image: &ArrayView2<f64>,
    labels: &ArrayView2<u32>,
    label: u32,
    bbox: &BoundingBox,
) -> Option<RegionCentroid> {
    let mut m00 = 0.0;
    let mut m10 = 0.0;
    let mut m01 = 0.0;
    let mut m20 = 0.0;
    let mut m02 = 0.0;
    let mut m11 = 0.0;
    let mut peak = f64::MIN;

    for row in bbox.min_row..=bbox.max_row {
        for col in bbox.min_col..=bbox.max_col {
            if labels[[row, col]] != label {
                continue;
            }
            let intensity = image[[row, col]];
            peak = peak.max(intensity);

            m00 += intensity;
            m10 += col as f64 * intensity;
            m01 += row as f64 * intensity;
            m20 += (col as f64) * (col as f64) * intensity;
            m02 += (row as f64) * (row as f64) * intensity;
            m11 += (row as f64) * (col as f64) * intensity;
        }
    }

    if m00 < f64::EPSILON {
        return None;
    }

    let x = m10 / m00;
    let y = m01 / m00;

    // Central moments relative to the centroid.
    let mu20 = m20 / m00 - x * x;
    let mu02 = m02 / m00 - y * y;
    let mu11 = m11 / m00 - x * y;

    // Eigenvalues of the covariance matrix give the principal axes.
    let sum = mu20 + mu02;
    let diff = mu20 - mu02;
    let discriminant = (4.0 * mu11 * mu11 + diff * diff).sqrt();
    let lambda1 = (sum + discriminant) / 2.0;
    let lambda2 = (sum - discriminant) / 2.0;

    // A single-pixel region has no measurable extent in either axis; it is a
    // point, not a streak, so it counts as perfectly round. Only a region
    // that is extended along one axis and flat along the other is elongated.
    let aspect_ratio = if lambda2 > f64::EPSILON {
        (lambda1 / lambda2).abs()
    } else if lambda1 > f64::EPSILON {
        f64::INFINITY
    } else {
        1.0
    };

    // Eigenvalues are variances: 2*sqrt gives a radius, doubled for diameter.
    let diameter = 4.0 * ((lambda1 + lambda2) / 2.0).max(0.0).sqrt();

    Some(RegionCentroid {
        x,
        y,
        peak,
        aspect_ratio,
        diameter,
    })
}
