//! Separable Gaussian convolution for mask smoothing.
//!
//! The smoother only ever needs an isotropic Gaussian, so the 2-D convolution
//! is implemented as two 1-D passes (rows, then columns). At the borders the
//! kernel weights are renormalized over the in-bounds support, so samples
//! outside the image are ignored rather than assumed black. This matches the
//! eroder's border policy: neither stage invents a dark frame around the
//! image.

use ndarray::{Array2, ArrayView2};

/// Kernel truncation radius in standard deviations.
const KERNEL_TRUNCATE: f64 = 4.0;

/// Build a normalized 1-D Gaussian kernel of standard deviation `sigma`.
///
/// The kernel extends `ceil(4 sigma)` taps to each side (at least one) and
/// sums to 1.
///
/// # Panics
/// Debug-asserts that `sigma` is positive; callers validate upstream.
pub fn gaussian_kernel_1d(sigma: f64) -> Vec<f64> {
    debug_assert!(sigma > 0.0, "kernel sigma must be positive, got {sigma}");

    let radius = ((KERNEL_TRUNCATE * sigma).ceil() as usize).max(1);
    let denom = 2.0 * sigma * sigma;

    let mut kernel: Vec<f64> = (-(radius as isize)..=radius as isize)
        .map(|t| (-(t * t) as f64 / denom).exp())
        .collect();

    let sum: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Convolve an image with an isotropic Gaussian of standard deviation `sigma`.
///
/// Border handling renormalizes the kernel over in-bounds taps, so a constant
/// image convolves to itself everywhere, including the edges.
///
/// # Arguments
/// * `image` - input 2-D array
/// * `sigma` - Gaussian standard deviation in pixels (positive)
///
/// # Returns
/// A new array of the same shape; the input is untouched.
pub fn gaussian_blur(image: &ArrayView2<f64>, sigma: f64) -> Array2<f64> {
    let kernel = gaussian_kernel_1d(sigma);
    let rows = convolve_rows(image, &kernel);
    let transposed = convolve_rows(&rows.t(), &kernel);
    transposed.t().to_owned()
}

/// Convolve every row with `kernel`, renormalizing weights at the borders.
fn convolve_rows(image: &ArrayView2<f64>, kernel: &[f64]) -> Array2<f64> {
    let (height, width) = image.dim();
    let radius = kernel.len() / 2;
    let mut out = Array2::<f64>::zeros((height, width));

    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            let mut weight = 0.0;
            for (k, &w) in kernel.iter().enumerate() {
                let tap = x as isize + k as isize - radius as isize;
                if tap >= 0 && (tap as usize) < width {
                    acc += w * image[[y, tap as usize]];
                    weight += w;
                }
            }
            out[[y, x]] = acc / weight;
        }
    }

    out
}
