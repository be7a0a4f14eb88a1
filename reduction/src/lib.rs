//! Localized star reduction for astronomical images.
//!
//! Shrinks the apparent size and brightness of stars while leaving extended
//! structures (nebulae, galaxies) untouched. The pipeline detects point
//! sources against a sigma-clipped background estimate, burns a disk mask
//! around each detection, erodes the whole image morphologically, and blends
//! the eroded image back into the original through the smoothed mask:
//!
//! ```text
//! final = alpha * eroded + (1 - alpha) * original
//! ```
//!
//! The crate works purely on in-memory arrays. Decoding frames from disk,
//! rendering results, and collecting parameters are caller concerns; the demo
//! binary under `src/bin/` shows one such caller.
//!
//! # Example
//!
//! ```
//! use ndarray::Array2;
//! use reduction::{reduce_stars, ReductionParams, SampleArray};
//!
//! let mut frame = Array2::<f64>::from_elem((64, 64), 100.0);
//! frame[[20, 20]] = 5000.0;
//!
//! let raw = SampleArray::Mono(frame);
//! let display = raw.normalized();
//!
//! let result = reduce_stars(&raw, &display, &ReductionParams::default())?;
//! assert_eq!(result.star_count, 1);
//! # Ok::<(), reduction::ReductionError>(())
//! ```

pub mod cache;
pub mod composite;
pub mod convolve2d;
pub mod detection;
pub mod error;
pub mod mask;
pub mod morphology;
pub mod pipeline;
pub mod sample;
pub mod stats;

pub use cache::ReductionCache;
pub use composite::compose_final;
pub use detection::{detect_stars, StarCandidate};
pub use error::ReductionError;
pub use mask::{rasterize_star_mask, smooth_star_mask};
pub use morphology::erode;
pub use pipeline::{reduce_stars, Reduction, ReductionParams};
pub use sample::SampleArray;
pub use stats::{sigma_clipped_stats, BackgroundStats, MAX_CLIP_ITERATIONS};
