//! Sample array container, orientation canonicalization, and normalization.
//!
//! Raw frames arrive either as a single 2-D plane or as a 3-D color cube.
//! Color cubes are canonicalized to channel-last `(H, W, 3)` on construction,
//! mirroring the FITS convention where planes sometimes come channel-first.

use ndarray::{Array2, Array3, Axis};

/// An image as delivered by the decoding layer: one plane or three channels.
///
/// All pipeline stages operate on this container or on 2-D projections of it.
/// Stages never mutate their input; every transformation returns a new array.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleArray {
    /// Single-channel image, `(rows, cols)`
    Mono(Array2<f64>),
    /// Three-channel image, channel-last `(rows, cols, 3)`
    Rgb(Array3<f64>),
}

impl SampleArray {
    /// Canonicalize a 3-D cube to channel-last orientation.
    ///
    /// A `(3, H, W)` cube is transposed to `(H, W, 3)`; a channel-last cube
    /// passes through unchanged. When both the first and last axes have
    /// length 3 the channel-first interpretation wins.
    pub fn from_cube(cube: Array3<f64>) -> Self {
        let shape = cube.dim();
        if shape.0 == 3 {
            let transposed = cube.permuted_axes([1, 2, 0]);
            SampleArray::Rgb(transposed.as_standard_layout().into_owned())
        } else {
            SampleArray::Rgb(cube)
        }
    }

    /// Spatial shape `(rows, cols)`, independent of channel count.
    pub fn spatial_shape(&self) -> (usize, usize) {
        match self {
            SampleArray::Mono(a) => a.dim(),
            SampleArray::Rgb(a) => {
                let (h, w, _) = a.dim();
                (h, w)
            }
        }
    }

    /// Number of channels: 1 for mono, 3 for color.
    pub fn channels(&self) -> usize {
        match self {
            SampleArray::Mono(_) => 1,
            SampleArray::Rgb(_) => 3,
        }
    }

    /// Total number of samples across all channels.
    pub fn len(&self) -> usize {
        match self {
            SampleArray::Mono(a) => a.len(),
            SampleArray::Rgb(a) => a.len(),
        }
    }

    /// True when the array holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Global minimum and maximum over finite samples only.
    ///
    /// Returns `None` when no finite sample exists (empty or all-NaN input).
    pub fn finite_min_max(&self) -> Option<(f64, f64)> {
        let mut min_max: Option<(f64, f64)> = None;
        let mut scan = |v: f64| {
            if v.is_finite() {
                min_max = match min_max {
                    None => Some((v, v)),
                    Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                };
            }
        };
        match self {
            SampleArray::Mono(a) => a.iter().copied().for_each(&mut scan),
            SampleArray::Rgb(a) => a.iter().copied().for_each(&mut scan),
        }
        min_max
    }

    /// Rescale all samples to the [0, 1] range.
    ///
    /// The affine map `(x - min) / (max - min)` uses the global finite
    /// min/max; non-finite samples are excluded from the range computation
    /// and propagate through the map unchanged in kind (NaN stays NaN).
    ///
    /// A flat image (`max == min`) is a documented degenerate case, not an
    /// error: the input is returned unchanged and a warning is logged.
    pub fn normalized(&self) -> SampleArray {
        match self.finite_min_max() {
            Some((lo, hi)) if hi > lo => {
                let span = hi - lo;
                self.map(|v| (v - lo) / span)
            }
            _ => {
                log::warn!("flat or non-finite image: normalization left data unchanged");
                self.clone()
            }
        }
    }

    /// 2-D luminance projection used for background statistics and detection.
    ///
    /// Color input reduces to the per-pixel channel mean. This is a plain
    /// average, not a perceptual luma weighting; on color data with
    /// differently scaled channels it biases detection toward the brightest
    /// channel.
    pub fn luminance(&self) -> Array2<f64> {
        match self {
            SampleArray::Mono(a) => a.clone(),
            SampleArray::Rgb(a) => {
                a.map_axis(Axis(2), |px| px.sum() / px.len() as f64)
            }
        }
    }

    /// Apply a scalar function to every sample, preserving shape.
    pub fn map<F>(&self, f: F) -> SampleArray
    where
        F: Fn(f64) -> f64,
    {
        match self {
            SampleArray::Mono(a) => SampleArray::Mono(a.mapv(&f)),
            SampleArray::Rgb(a) => SampleArray::Rgb(a.mapv(&f)),
        }
    }
}

impl From<Array2<f64>> for SampleArray {
    fn from(plane: Array2<f64>) -> Self {
        SampleArray::Mono(plane)
    }
}

impl From<Array3<f64>> for SampleArray {
    fn from(cube: Array3<f64>) -> Self {
        SampleArray::from_cube(cube)
    }
}
