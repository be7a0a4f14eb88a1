//! Result cache for interactive re-parameterization.
//!
//! An interactive caller re-runs the pipeline on every slider change, usually
//! over the same frame. Instead of global mutable state, the cache is an
//! explicit value keyed by the frame identity plus the exact parameter tuple.
//! Loading a different frame invalidates everything cached for the previous
//! one.

use std::collections::HashMap;
use std::sync::Arc;

use crate::pipeline::{Reduction, ReductionParams};

/// Hashable key derived from the bit patterns of a parameter set.
///
/// Floats are keyed by `to_bits`, so two parameter sets hit the same entry
/// only when every field is bitwise identical. NaN parameters never reach the
/// cache because the pipeline rejects them at validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamKey {
    fwhm: u64,
    threshold_sigma: u64,
    mask_radius: u64,
    kernel_size: usize,
    erosion_iterations: usize,
    smooth_sigma: u64,
    smooth_threshold: u64,
    clip_sigma: u64,
    max_aspect_ratio: u64,
    double_smooth: bool,
}

impl From<&ReductionParams> for ParamKey {
    fn from(params: &ReductionParams) -> Self {
        Self {
            fwhm: params.fwhm.to_bits(),
            threshold_sigma: params.threshold_sigma.to_bits(),
            mask_radius: params.mask_radius.to_bits(),
            kernel_size: params.kernel_size,
            erosion_iterations: params.erosion_iterations,
            smooth_sigma: params.smooth_sigma.to_bits(),
            smooth_threshold: params.smooth_threshold.to_bits(),
            clip_sigma: params.clip_sigma.to_bits(),
            max_aspect_ratio: params.max_aspect_ratio.to_bits(),
            double_smooth: params.double_smooth,
        }
    }
}

/// Cache of pipeline results for the frame currently being worked on.
#[derive(Debug, Default)]
pub struct ReductionCache {
    frame_id: Option<u64>,
    entries: HashMap<ParamKey, Arc<Reduction>>,
}

impl ReductionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached result for this frame and parameter set.
    pub fn get(&self, frame_id: u64, params: &ReductionParams) -> Option<Arc<Reduction>> {
        if self.frame_id != Some(frame_id) {
            return None;
        }
        self.entries.get(&ParamKey::from(params)).cloned()
    }

    /// Store a result. Caching a different frame drops every entry of the
    /// previous one first.
    pub fn insert(
        &mut self,
        frame_id: u64,
        params: &ReductionParams,
        result: Reduction,
    ) -> Arc<Reduction> {
        if self.frame_id != Some(frame_id) {
            self.entries.clear();
            self.frame_id = Some(frame_id);
        }
        let shared = Arc::new(result);
        self.entries.insert(ParamKey::from(params), shared.clone());
        shared
    }

    /// Number of cached parameter sets for the current frame.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries and forget the current frame.
    pub fn clear(&mut self) {
        self.frame_id = None;
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::reduce_stars;
    use crate::sample::SampleArray;
    use ndarray::Array2;

    fn dummy_result() -> Reduction {
        let image = SampleArray::Mono(Array2::<f64>::zeros((6, 6)));
        reduce_stars(&image, &image, &ReductionParams::default()).unwrap()
    }

    #[test]
    fn test_hit_requires_same_frame_and_params() {
        let mut cache = ReductionCache::new();
        let params = ReductionParams::default();
        cache.insert(1, &params, dummy_result());

        assert!(cache.get(1, &params).is_some());
        assert!(cache.get(2, &params).is_none());

        let other = ReductionParams {
            smooth_sigma: 4.0,
            ..Default::default()
        };
        assert!(cache.get(1, &other).is_none());
    }

    #[test]
    fn test_new_frame_evicts_previous_entries() {
        let mut cache = ReductionCache::new();
        let params = ReductionParams::default();
        cache.insert(1, &params, dummy_result());
        assert_eq!(cache.len(), 1);

        cache.insert(2, &params, dummy_result());
        assert_eq!(cache.len(), 1);
        assert!(cache.get(1, &params).is_none());
        assert!(cache.get(2, &params).is_some());
    }

    #[test]
    fn test_distinct_params_coexist() {
        let mut cache = ReductionCache::new();
        let a = ReductionParams::default();
        let b = ReductionParams {
            erosion_iterations: 5,
            ..Default::default()
        };

        cache.insert(7, &a, dummy_result());
        cache.insert(7, &b, dummy_result());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut cache = ReductionCache::new();
        cache.insert(1, &ReductionParams::default(), dummy_result());
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(1, &ReductionParams::default()).is_none());
    }
}
