//! Pipeline entry point: parameters, orchestration, and the result bundle.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::composite::compose_final;
use crate::detection::detect_stars;
use crate::error::ReductionError;
use crate::mask::{rasterize_star_mask, smooth_star_mask};
use crate::morphology::erode;
use crate::sample::SampleArray;
use crate::stats::sigma_clipped_stats;

/// Processing parameters for one reduction run.
///
/// Supplied by the caller (typically an interactive layer); the pipeline
/// re-validates everything and fails fast on out-of-range values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReductionParams {
    /// Expected point-source full width at half maximum, pixels (> 0)
    pub fwhm: f64,
    /// Detection threshold in background standard deviations (> 0)
    pub threshold_sigma: f64,
    /// Radius of the disk burned around each detected star, pixels (> 0)
    pub mask_radius: f64,
    /// Side of the square erosion element (odd, >= 1)
    pub kernel_size: usize,
    /// Number of sequential erosion passes (>= 1)
    pub erosion_iterations: usize,
    /// Gaussian sigma for mask smoothing, pixels (> 0)
    pub smooth_sigma: f64,
    /// Alpha cutoff below which the smoothed mask becomes exactly 0 ([0, 1])
    pub smooth_threshold: f64,
    /// Background clip level for sigma-clipped statistics (> 0)
    pub clip_sigma: f64,
    /// Roundness gate: maximum major/minor axis ratio for a valid star
    pub max_aspect_ratio: f64,
    /// Re-blur the thresholded mask with a fixed sigma of 2.0 (the softer
    /// falloff of the interactive variant; single-pass is canonical)
    pub double_smooth: bool,
}

impl Default for ReductionParams {
    fn default() -> Self {
        Self {
            fwhm: 3.0,
            threshold_sigma: 5.5,
            mask_radius: 3.5,
            kernel_size: 3,
            erosion_iterations: 2,
            smooth_sigma: 2.0,
            smooth_threshold: 0.1,
            clip_sigma: 3.0,
            max_aspect_ratio: 2.5,
            double_smooth: false,
        }
    }
}

impl ReductionParams {
    /// Validate every parameter, failing on the first violation.
    pub fn validate(&self) -> Result<(), ReductionError> {
        let positive: [(&'static str, f64); 5] = [
            ("fwhm", self.fwhm),
            ("threshold_sigma", self.threshold_sigma),
            ("mask_radius", self.mask_radius),
            ("smooth_sigma", self.smooth_sigma),
            ("clip_sigma", self.clip_sigma),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ReductionError::InvalidParameter {
                    name,
                    value,
                    requirement: "must be positive",
                });
            }
        }
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(ReductionError::InvalidParameter {
                name: "kernel_size",
                value: self.kernel_size as f64,
                requirement: "must be an odd integer >= 1",
            });
        }
        if self.erosion_iterations < 1 {
            return Err(ReductionError::InvalidParameter {
                name: "erosion_iterations",
                value: self.erosion_iterations as f64,
                requirement: "must be >= 1",
            });
        }
        if !(0.0..=1.0).contains(&self.smooth_threshold) {
            return Err(ReductionError::InvalidParameter {
                name: "smooth_threshold",
                value: self.smooth_threshold,
                requirement: "must lie in [0, 1]",
            });
        }
        if !(self.max_aspect_ratio >= 1.0) {
            return Err(ReductionError::InvalidParameter {
                name: "max_aspect_ratio",
                value: self.max_aspect_ratio,
                requirement: "must be >= 1",
            });
        }
        Ok(())
    }
}

/// Everything one reduction run produces.
///
/// Intermediate arrays are returned alongside the final image so an
/// interactive caller can inspect or display any stage without re-running.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    /// Alpha-blended result, same shape as the display input
    pub final_image: SampleArray,
    /// Smoothed mask actually used for blending, in [0, 1]
    pub alpha_mask: Array2<f64>,
    /// Raw union-of-disks star mask
    pub binary_mask: Array2<bool>,
    /// Display input after erosion
    pub eroded_image: SampleArray,
    /// Number of detected star candidates
    pub star_count: usize,
}

/// Run the full star reduction pipeline.
///
/// `raw` is the unnormalized sample data used for background statistics and
/// detection (thresholds are calibrated against raw units); `display` is the
/// [0, 1]-normalized image used for erosion and compositing, usually the
/// normalized form of the same frame. Both must share a spatial shape.
///
/// The detection branch (statistics, detection, rasterization, smoothing)
/// and the erosion branch are independent and run concurrently; the
/// compositor joins them.
///
/// Zero detections is success, not an error: the masks come back all zero
/// and the final image equals the display input exactly.
pub fn reduce_stars(
    raw: &SampleArray,
    display: &SampleArray,
    params: &ReductionParams,
) -> Result<Reduction, ReductionError> {
    params.validate()?;

    let spatial = raw.spatial_shape();
    if display.spatial_shape() != spatial {
        return Err(ReductionError::ShapeMismatch {
            context: "pipeline inputs (raw vs display)",
            expected: spatial,
            actual: display.spatial_shape(),
        });
    }

    let (mask_branch, erosion_branch) = rayon::join(
        || -> Result<(Array2<bool>, Array2<f64>, usize), ReductionError> {
            let luminance = raw.luminance();
            let stats = sigma_clipped_stats(luminance.view(), params.clip_sigma)?;
            let candidates = detect_stars(
                &luminance.view(),
                &stats,
                params.fwhm,
                params.threshold_sigma,
                params.max_aspect_ratio,
            )?;
            let binary = rasterize_star_mask(&candidates, spatial, params.mask_radius)?;
            let alpha = smooth_star_mask(
                &binary.view(),
                params.smooth_sigma,
                params.smooth_threshold,
                params.double_smooth,
            )?;
            Ok((binary, alpha, candidates.len()))
        },
        || erode(display, params.kernel_size, params.erosion_iterations),
    );

    let (binary_mask, alpha_mask, star_count) = mask_branch?;
    let eroded_image = erosion_branch?;

    let final_image = compose_final(display, &eroded_image, &alpha_mask.view())?;
    log::info!("reduced {} stars", star_count);

    Ok(Reduction {
        final_image,
        alpha_mask,
        binary_mask,
        eroded_image,
        star_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_default_params_validate() {
        assert!(ReductionParams::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_each_bad_field() {
        let cases: Vec<ReductionParams> = vec![
            ReductionParams {
                fwhm: 0.0,
                ..Default::default()
            },
            ReductionParams {
                threshold_sigma: -2.0,
                ..Default::default()
            },
            ReductionParams {
                mask_radius: 0.0,
                ..Default::default()
            },
            ReductionParams {
                kernel_size: 4,
                ..Default::default()
            },
            ReductionParams {
                erosion_iterations: 0,
                ..Default::default()
            },
            ReductionParams {
                smooth_sigma: 0.0,
                ..Default::default()
            },
            ReductionParams {
                smooth_threshold: 1.2,
                ..Default::default()
            },
            ReductionParams {
                clip_sigma: 0.0,
                ..Default::default()
            },
            ReductionParams {
                max_aspect_ratio: 0.5,
                ..Default::default()
            },
        ];

        for params in cases {
            assert!(
                matches!(
                    params.validate(),
                    Err(ReductionError::InvalidParameter { .. })
                ),
                "expected rejection for {params:?}"
            );
        }
    }

    #[test]
    fn test_mismatched_inputs_rejected() {
        let raw = SampleArray::Mono(Array2::<f64>::zeros((8, 8)));
        let display = SampleArray::Mono(Array2::<f64>::zeros((8, 9)));

        assert!(matches!(
            reduce_stars(&raw, &display, &ReductionParams::default()),
            Err(ReductionError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_flat_image_short_pipeline() {
        let raw = SampleArray::Mono(Array2::<f64>::zeros((10, 10)));
        let display = raw.clone();

        let result = reduce_stars(&raw, &display, &ReductionParams::default()).unwrap();
        assert_eq!(result.star_count, 0);
        assert!(result.binary_mask.iter().all(|&m| !m));
        assert!(result.alpha_mask.iter().all(|&a| a == 0.0));
        assert_eq!(result.final_image, display);
    }
}
