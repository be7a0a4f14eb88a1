//! Robust background statistics via iterative sigma clipping.
//!
//! Star fields are mostly background with a sparse population of bright
//! outliers, so plain mean/stddev overestimate the sky level. The estimator
//! here repeatedly rejects samples far from the running median until the
//! surviving set stabilizes.

use ndarray::ArrayView2;

use crate::error::ReductionError;

/// Hard cap on clipping iterations so pathological inputs cannot loop
/// unboundedly. Convergence is almost always reached in 2-3 passes.
pub const MAX_CLIP_ITERATIONS: usize = 5;

/// Robust background estimate over the final surviving sample set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundStats {
    /// Mean of the surviving samples
    pub mean: f64,
    /// Median of the surviving samples
    pub median: f64,
    /// Population standard deviation of the surviving samples
    pub stddev: f64,
}

/// Compute sigma-clipped background statistics of a luminance array.
///
/// Starting from the full finite sample set, samples farther than
/// `clip_sigma` standard deviations from the current median are excluded and
/// the statistics recomputed, until the surviving set stops changing or
/// [`MAX_CLIP_ITERATIONS`] is reached. Non-finite samples are dropped before
/// the first pass.
///
/// # Arguments
/// * `luminance` - 2-D luminance array
/// * `clip_sigma` - clip level in standard deviations (must be positive)
///
/// # Errors
/// * `EmptyInput` when no finite sample exists
/// * `InvalidParameter` when `clip_sigma` is not positive
pub fn sigma_clipped_stats(
    luminance: ArrayView2<f64>,
    clip_sigma: f64,
) -> Result<BackgroundStats, ReductionError> {
    if !(clip_sigma > 0.0) {
        return Err(ReductionError::InvalidParameter {
            name: "clip_sigma",
            value: clip_sigma,
            requirement: "must be positive",
        });
    }

    let mut surviving: Vec<f64> = luminance.iter().copied().filter(|v| v.is_finite()).collect();
    if surviving.is_empty() {
        return Err(ReductionError::EmptyInput("background statistics"));
    }

    let mut stats = describe(&mut surviving);
    for _ in 0..MAX_CLIP_ITERATIONS {
        let cutoff = clip_sigma * stats.stddev;
        let before = surviving.len();
        surviving.retain(|&v| (v - stats.median).abs() <= cutoff);
        if surviving.len() == before {
            break;
        }
        stats = describe(&mut surviving);
    }

    Ok(stats)
}

/// Mean, median and population stddev of a non-empty sample set.
///
/// Sorts the slice in place for the median.
fn describe(samples: &mut [f64]) -> BackgroundStats {
    samples.sort_by(f64::total_cmp);

    let n = samples.len();
    let median = if n % 2 == 0 {
        (samples[n / 2 - 1] + samples[n / 2]) / 2.0
    } else {
        samples[n / 2]
    };

    let mean = samples.iter().sum::<f64>() / n as f64;
    let variance = samples.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;

    BackgroundStats {
        mean,
        median,
        stddev: variance.sqrt(),
    }
}
