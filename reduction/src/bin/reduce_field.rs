//! Star reduction demo tool
//!
//! Runs the reduction pipeline on a grayscale PNG, or on a generated
//! synthetic star field when no input is given, and writes the result back
//! out as PNG. All file handling lives here; the library itself only ever
//! sees in-memory arrays.
//!
//! # Usage
//!
//! ```bash
//! # Reduce stars in an image with default parameters
//! cargo run --release --bin reduce_field -- -i frame.png -o reduced.png
//!
//! # Stronger reduction, and dump the alpha mask for inspection
//! cargo run --release --bin reduce_field -- -i frame.png -o reduced.png \
//!     --kernel-size 5 --iterations 3 --mask-png alpha.png
//!
//! # No input: process a seeded synthetic field
//! cargo run --release --bin reduce_field -- -o reduced.png --stars 40
//! ```

use std::path::PathBuf;

use clap::Parser;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use reduction::{reduce_stars, ReductionParams, SampleArray};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input PNG (grayscale; converted if not). Omit to use a synthetic field
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output PNG for the final image
    #[arg(short, long, default_value = "reduced.png")]
    output: PathBuf,

    /// Optional output PNG for the alpha mask
    #[arg(long)]
    mask_png: Option<PathBuf>,

    /// Expected star FWHM in pixels
    #[arg(long, default_value = "3.0")]
    fwhm: f64,

    /// Detection threshold in background sigmas
    #[arg(long, default_value = "5.5")]
    threshold_sigma: f64,

    /// Disk radius burned around each star, pixels
    #[arg(long, default_value = "3.5")]
    mask_radius: f64,

    /// Erosion element side (odd)
    #[arg(long, default_value = "3")]
    kernel_size: usize,

    /// Erosion passes
    #[arg(long, default_value = "2")]
    iterations: usize,

    /// Mask smoothing sigma, pixels
    #[arg(long, default_value = "2.0")]
    smooth_sigma: f64,

    /// Mask cutoff in [0, 1]
    #[arg(long, default_value = "0.1")]
    smooth_threshold: f64,

    /// Number of stars in the synthetic field
    #[arg(long, default_value = "25")]
    stars: usize,

    /// Synthetic field edge length in pixels
    #[arg(long, default_value = "512")]
    size: usize,

    /// RNG seed for the synthetic field
    #[arg(long, default_value = "12345")]
    seed: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let raw = match &cli.input {
        Some(path) => {
            println!("Loading image: {}", path.display());
            load_png(path)?
        }
        None => {
            println!(
                "No input given; generating a {}x{} synthetic field with {} stars",
                cli.size, cli.size, cli.stars
            );
            synthetic_field(cli.size, cli.stars, cli.seed)
        }
    };

    let (height, width) = raw.dim();
    println!("Image dimensions: {}x{}", width, height);

    let params = ReductionParams {
        fwhm: cli.fwhm,
        threshold_sigma: cli.threshold_sigma,
        mask_radius: cli.mask_radius,
        kernel_size: cli.kernel_size,
        erosion_iterations: cli.iterations,
        smooth_sigma: cli.smooth_sigma,
        smooth_threshold: cli.smooth_threshold,
        ..Default::default()
    };

    let raw = SampleArray::Mono(raw);
    let display = raw.normalized();

    let start = std::time::Instant::now();
    let result = reduce_stars(&raw, &display, &params)?;
    println!(
        "Reduced {} stars in {:.1} ms",
        result.star_count,
        start.elapsed().as_secs_f64() * 1000.0
    );

    save_png(&cli.output, &result.final_image.luminance())?;
    println!("Saved final image: {}", cli.output.display());

    if let Some(mask_path) = &cli.mask_png {
        save_png(mask_path, &result.alpha_mask)?;
        println!("Saved alpha mask: {}", mask_path.display());
    }

    Ok(())
}

/// Load a PNG as a 2-D f64 array (converted to grayscale if needed).
fn load_png(path: &PathBuf) -> Result<Array2<f64>, Box<dyn std::error::Error>> {
    let gray = image::open(path)?.to_luma8();
    let (width, height) = gray.dimensions();

    let mut data = Array2::zeros((height as usize, width as usize));
    for (x, y, pixel) in gray.enumerate_pixels() {
        data[[y as usize, x as usize]] = pixel[0] as f64;
    }
    Ok(data)
}

/// Save a [0, 1] array as an 8-bit grayscale PNG.
fn save_png(path: &PathBuf, data: &Array2<f64>) -> Result<(), Box<dyn std::error::Error>> {
    let (height, width) = data.dim();
    let mut out = image::GrayImage::new(width as u32, height as u32);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let v = data[[y as usize, x as usize]].clamp(0.0, 1.0);
        *pixel = image::Luma([(v * 255.0).round() as u8]);
    }
    out.save(path)?;
    Ok(())
}

/// Generate a star field: uniform background noise plus Gaussian PSFs.
fn synthetic_field(size: usize, num_stars: usize, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut field = Array2::<f64>::zeros((size, size));

    let background = 400.0;
    for v in field.iter_mut() {
        *v = background + rng.gen_range(-20.0..20.0);
    }

    let margin = 8;
    for _ in 0..num_stars {
        let x = rng.gen_range(margin..size - margin) as f64;
        let y = rng.gen_range(margin..size - margin) as f64;
        let amplitude = rng.gen_range(500.0..8000.0);
        let sigma: f64 = 3.0 / 2.3548;

        let reach = (4.0 * sigma).ceil() as i64;
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let py = y as i64 + dy;
                let px = x as i64 + dx;
                if py < 0 || px < 0 || py >= size as i64 || px >= size as i64 {
                    continue;
                }
                let r2 = (dy * dy + dx * dx) as f64;
                field[[py as usize, px as usize]] +=
                    amplitude * (-r2 / (2.0 * sigma * sigma)).exp();
            }
        }
    }

    field
}
