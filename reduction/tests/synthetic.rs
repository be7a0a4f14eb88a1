//! End-to-end pipeline tests on synthetic star frames built from pure
//! ndarray data, no external files involved.

use ndarray::{Array2, Array3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use reduction::{reduce_stars, ReductionCache, ReductionParams, SampleArray};

/// Create a synthetic frame: uniform background, optional seeded noise, and
/// Gaussian PSFs at the given (x, y, amplitude) positions.
fn create_synthetic_frame(
    width: usize,
    height: usize,
    background: f64,
    noise_amplitude: f64,
    stars: &[(f64, f64, f64)],
) -> Array2<f64> {
    let mut frame = Array2::<f64>::from_elem((height, width), background);

    if noise_amplitude > 0.0 {
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        for pixel in frame.iter_mut() {
            *pixel += rng.gen_range(-noise_amplitude..noise_amplitude);
        }
    }

    // PSF with FWHM ~3 pixels (sigma = FWHM / 2.3548)
    let sigma = 3.0 / 2.3548;
    let sigma2 = sigma * sigma;
    for &(x_center, y_center, amplitude) in stars {
        let radius = 7i64;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let px = x_center.round() as i64 + dx;
                let py = y_center.round() as i64 + dy;
                if px < 0 || py < 0 || px >= width as i64 || py >= height as i64 {
                    continue;
                }
                let rx = px as f64 - x_center;
                let ry = py as f64 - y_center;
                let r2 = rx * rx + ry * ry;
                frame[[py as usize, px as usize]] += amplitude * (-r2 / (2.0 * sigma2)).exp();
            }
        }
    }

    frame
}

fn pixels(image: &SampleArray) -> Vec<f64> {
    match image {
        SampleArray::Mono(a) => a.iter().copied().collect(),
        SampleArray::Rgb(a) => a.iter().copied().collect(),
    }
}

#[test]
fn test_flat_zero_frame_passes_through_unchanged() {
    let _ = env_logger::builder().is_test(true).try_init();

    let raw = SampleArray::Mono(Array2::<f64>::zeros((10, 10)));
    let display = raw.clone();

    let result = reduce_stars(&raw, &display, &ReductionParams::default()).unwrap();

    assert_eq!(result.star_count, 0);
    assert!(result.binary_mask.iter().all(|&m| !m));
    assert!(result.alpha_mask.iter().all(|&a| a == 0.0));
    // Zero detections composite to the original, bit for bit.
    assert_eq!(result.final_image, display);
}

#[test]
fn test_single_10_sigma_source_is_found_and_reduced() {
    // Uniform background with bounded noise; the star peak sits 10 noise
    // sigmas above it while the detection threshold is 5.
    let noise_amplitude = 6.0;
    let noise_sigma = noise_amplitude / 3.0f64.sqrt();
    let frame = create_synthetic_frame(
        64,
        64,
        500.0,
        noise_amplitude,
        &[(30.0, 33.0, 10.0 * noise_sigma)],
    );

    let raw = SampleArray::Mono(frame);
    let display = raw.normalized();
    let params = ReductionParams {
        fwhm: 3.0,
        threshold_sigma: 5.0,
        ..Default::default()
    };

    let result = reduce_stars(&raw, &display, &params).unwrap();
    assert_eq!(result.star_count, 1);

    // The mask sits on the star, not elsewhere.
    assert!(result.binary_mask[[33, 30]]);
    assert!(!result.binary_mask[[10, 10]]);

    // The star center dims; far-away background is untouched.
    let (SampleArray::Mono(disp), SampleArray::Mono(fin)) = (&display, &result.final_image)
    else {
        panic!("expected mono");
    };
    assert!(fin[[33, 30]] < disp[[33, 30]]);
    assert_eq!(fin[[5, 55]], disp[[5, 55]]);
}

#[test]
fn test_radius_coverage_of_single_bright_pixel() {
    let mut frame = Array2::<f64>::zeros((100, 100));
    frame[[50, 50]] = 1000.0;

    let raw = SampleArray::Mono(frame);
    let display = raw.normalized();
    let params = ReductionParams {
        mask_radius: 3.0,
        ..Default::default()
    };

    let result = reduce_stars(&raw, &display, &params).unwrap();
    assert_eq!(result.star_count, 1);

    for y in 0..100 {
        for x in 0..100 {
            let dx = x as f64 - 50.0;
            let dy = y as f64 - 50.0;
            let inside = dx * dx + dy * dy <= 9.0;
            assert_eq!(
                result.binary_mask[[y, x]],
                inside,
                "binary mask disagrees with the radius-3 disk at ({y}, {x})"
            );
        }
    }
}

#[test]
fn test_final_image_is_convex_combination() {
    let frame = create_synthetic_frame(
        96,
        96,
        300.0,
        15.0,
        &[(20.0, 25.0, 900.0), (70.0, 40.0, 600.0), (45.0, 80.0, 1200.0)],
    );

    let raw = SampleArray::Mono(frame);
    let display = raw.normalized();
    let result = reduce_stars(&raw, &display, &ReductionParams::default()).unwrap();
    assert!(result.star_count >= 3);

    let disp = pixels(&display);
    let ero = pixels(&result.eroded_image);
    let fin = pixels(&result.final_image);

    for ((o, e), f) in disp.iter().zip(ero.iter()).zip(fin.iter()) {
        // Tiny slack for last-ulp rounding when original and eroded coincide.
        let lo = o.min(*e) - 1e-12;
        let hi = o.max(*e) + 1e-12;
        assert!(
            lo <= *f && *f <= hi,
            "final sample {f} escapes [{lo}, {hi}]"
        );
    }
}

#[test]
fn test_alpha_zero_region_is_bitwise_original() {
    let frame = create_synthetic_frame(64, 64, 200.0, 10.0, &[(32.0, 32.0, 800.0)]);

    let raw = SampleArray::Mono(frame);
    let display = raw.normalized();
    let result = reduce_stars(&raw, &display, &ReductionParams::default()).unwrap();

    let (SampleArray::Mono(disp), SampleArray::Mono(fin)) = (&display, &result.final_image)
    else {
        panic!("expected mono");
    };

    let mut zero_alpha_pixels = 0;
    for ((y, x), &a) in result.alpha_mask.indexed_iter() {
        if a == 0.0 {
            zero_alpha_pixels += 1;
            assert_eq!(fin[[y, x]], disp[[y, x]]);
        }
    }
    assert!(zero_alpha_pixels > 0, "expected untouched background pixels");
}

#[test]
fn test_star_count_monotone_in_threshold() {
    let frame = create_synthetic_frame(
        128,
        128,
        250.0,
        12.0,
        &[
            (20.0, 20.0, 2000.0),
            (90.0, 30.0, 700.0),
            (50.0, 70.0, 260.0),
            (100.0, 100.0, 120.0),
            (30.0, 110.0, 60.0),
        ],
    );

    let raw = SampleArray::Mono(frame);
    let display = raw.normalized();

    let mut previous = usize::MAX;
    for threshold_sigma in [3.0, 6.0, 12.0, 40.0, 500.0] {
        let params = ReductionParams {
            threshold_sigma,
            ..Default::default()
        };
        let count = reduce_stars(&raw, &display, &params).unwrap().star_count;
        assert!(
            count <= previous,
            "raising the threshold to {threshold_sigma} increased the count to {count}"
        );
        previous = count;
    }
}

#[test]
fn test_erosion_strength_monotone() {
    let frame = create_synthetic_frame(64, 64, 300.0, 10.0, &[(32.0, 32.0, 1000.0)]);
    let raw = SampleArray::Mono(frame);
    let display = raw.normalized();

    let weak = ReductionParams {
        erosion_iterations: 1,
        ..Default::default()
    };
    let strong = ReductionParams {
        erosion_iterations: 4,
        ..Default::default()
    };

    let weak_eroded = pixels(&reduce_stars(&raw, &display, &weak).unwrap().eroded_image);
    let strong_eroded = pixels(&reduce_stars(&raw, &display, &strong).unwrap().eroded_image);

    for (s, w) in strong_eroded.iter().zip(weak_eroded.iter()) {
        assert!(s <= w, "more erosion passes brightened a pixel");
    }
}

#[test]
fn test_rgb_frame_round_trip() {
    let plane = create_synthetic_frame(48, 48, 150.0, 8.0, &[(24.0, 24.0, 900.0)]);
    let mut cube = Array3::<f64>::zeros((48, 48, 3));
    for ch in 0..3 {
        let scale = 1.0 - 0.2 * ch as f64;
        for ((y, x), &v) in plane.indexed_iter() {
            cube[[y, x, ch]] = v * scale;
        }
    }

    let raw = SampleArray::from_cube(cube);
    let display = raw.normalized();
    let result = reduce_stars(&raw, &display, &ReductionParams::default()).unwrap();

    assert_eq!(result.star_count, 1);
    assert_eq!(result.final_image.spatial_shape(), (48, 48));
    assert_eq!(result.final_image.channels(), 3);

    // Convexity holds per channel under the broadcast alpha.
    let disp = pixels(&display);
    let ero = pixels(&result.eroded_image);
    let fin = pixels(&result.final_image);
    for ((o, e), f) in disp.iter().zip(ero.iter()).zip(fin.iter()) {
        assert!(o.min(*e) - 1e-12 <= *f && *f <= o.max(*e) + 1e-12);
    }
}

#[test]
fn test_cache_returns_identical_result() {
    let frame = create_synthetic_frame(48, 48, 220.0, 9.0, &[(20.0, 30.0, 700.0)]);
    let raw = SampleArray::Mono(frame);
    let display = raw.normalized();
    let params = ReductionParams::default();

    let mut cache = ReductionCache::new();
    assert!(cache.get(1, &params).is_none());

    let fresh = reduce_stars(&raw, &display, &params).unwrap();
    let stored = cache.insert(1, &params, fresh.clone());
    let hit = cache.get(1, &params).expect("cache hit after insert");

    assert_eq!(*hit, fresh);
    assert_eq!(*stored, fresh);

    // A different parameter tuple misses and must be recomputed.
    let other = ReductionParams {
        erosion_iterations: 3,
        ..Default::default()
    };
    assert!(cache.get(1, &other).is_none());
}

#[test]
fn test_double_smooth_mode_runs_and_spreads_alpha() {
    let frame = create_synthetic_frame(64, 64, 180.0, 10.0, &[(32.0, 32.0, 900.0)]);
    let raw = SampleArray::Mono(frame);
    let display = raw.normalized();

    let single = reduce_stars(&raw, &display, &ReductionParams::default()).unwrap();
    let double = reduce_stars(
        &raw,
        &display,
        &ReductionParams {
            double_smooth: true,
            ..Default::default()
        },
    )
    .unwrap();

    let single_support = single.alpha_mask.iter().filter(|&&a| a > 0.0).count();
    let double_support = double.alpha_mask.iter().filter(|&&a| a > 0.0).count();
    assert!(double_support >= single_support);
}
