use approx::assert_relative_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};

use fluxwarp_image::Raster;
use fluxwarp_imgproc::{
    parallel::ExecutionStrategy,
    warp::{
        area, compose, finalize, map_point, order_corners_anticlockwise, projection_matrix, reorder,
        rotation_matrix, scale_matrix, translation_matrix, warp_flux, Quad, WarpConfig, WarpError,
        WarpedRaster, IDENTITY,
    },
};

fn random_raster(width: usize, height: usize, seed: u64) -> Raster<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width * height)
        .map(|_| rng.random_range(0.0..100.0))
        .collect();
    Raster::new([width, height].into(), data).unwrap()
}

#[test]
fn test_identity_is_exact() -> Result<(), WarpError> {
    let src = random_raster(13, 7, 0);
    let output = warp_flux(&src, &IDENTITY, &WarpConfig::default())?;

    assert_eq!(output.raster.size(), src.size());
    assert_eq!(output.num_missing, 0);
    assert_eq!(output.plan.reference_offset, [1, 1]);
    assert_eq!(output.raster.as_slice(), src.as_slice());
    Ok(())
}

#[test]
fn test_identity_keeps_integer_samples() -> Result<(), WarpError> {
    let src = Raster::<u16>::from_fn([5, 4].into(), |x, y| (x * 100 + y) as u16);
    let done = finalize::<u16>(warp_flux(&src, &IDENTITY, &WarpConfig::default())?, None);

    match done.raster {
        WarpedRaster::Native(raster) => assert_eq!(raster, src),
        WarpedRaster::Float(_) => panic!("expected native output"),
    }
    Ok(())
}

#[test]
fn test_flux_conserved_under_affine() -> Result<(), WarpError> {
    let src = random_raster(24, 17, 1);
    let m = compose(&rotation_matrix(30.0), &scale_matrix(1.7, 1.7));
    let output = warp_flux(&src, &m, &WarpConfig::default())?;

    assert_relative_eq!(output.raster.sum(), src.sum(), max_relative = 1e-6);
    assert_relative_eq!(output.plan.unit_pixel_area, 1.0 / (1.7 * 1.7), epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_flux_conserved_under_projective() -> Result<(), WarpError> {
    let src = random_raster(20, 20, 2);
    let m = compose(
        &projection_matrix(2e-3, -1e-3),
        &translation_matrix(3.25, -1.5),
    );
    let output = warp_flux(&src, &m, &WarpConfig::default())?;

    assert_relative_eq!(output.raster.sum(), src.sum(), max_relative = 1e-6);
    Ok(())
}

#[test]
fn test_thread_count_invariance() -> Result<(), WarpError> {
    let mut src = random_raster(31, 23, 3);
    src.set(4, 5, f64::NAN)?;
    src.set(17, 11, f64::NAN)?;
    let m = compose(&rotation_matrix(-17.0), &projection_matrix(1e-3, 2e-3));

    let reference = warp_flux(
        &src,
        &m,
        &WarpConfig::default().with_strategy(ExecutionStrategy::Serial),
    )?;

    for strategy in [
        ExecutionStrategy::Fixed(1),
        ExecutionStrategy::Fixed(2),
        ExecutionStrategy::Fixed(8),
        ExecutionStrategy::GlobalPool,
    ] {
        let config = WarpConfig::default().with_strategy(strategy);
        let output = warp_flux(&src, &m, &config)?;

        assert_eq!(output.num_missing, reference.num_missing);
        let same_bits = output
            .raster
            .as_slice()
            .iter()
            .zip(reference.raster.as_slice())
            .all(|(a, b)| a.to_bits() == b.to_bits());
        assert!(same_bits, "output differs with {strategy:?}");
    }
    Ok(())
}

#[test]
fn test_missing_input_rescaling() -> Result<(), WarpError> {
    let src = Raster::<f64>::new(
        [3, 3].into(),
        vec![1.0, 2.0, 5.0, 3.0, f64::NAN, 5.0, 5.0, 5.0, 5.0],
    )?;
    let m = translation_matrix(0.5, 0.5);

    // output pixel (1, 1) covers a quarter of inputs (0, 0), (1, 0), (0, 1) and the missing centre
    let lenient = WarpConfig::default().with_max_missing_fraction(0.5);
    let output = warp_flux(&src, &m, &lenient)?;
    assert_eq!(output.raster.size(), [4, 4].into());
    let value = output.raster.get(1, 1).copied().unwrap_or(f64::NAN);
    assert_relative_eq!(value, (0.25 + 0.5 + 0.75) * 4.0 / 3.0, epsilon = 1e-12);

    let strict = WarpConfig::default().with_max_missing_fraction(0.1);
    let output = warp_flux(&src, &m, &strict)?;
    assert!(output.raster.get(1, 1).is_some_and(|v| v.is_nan()));
    assert!(output.num_missing >= 4);

    let zeroed = warp_flux(&src, &m, &strict.with_zero_for_missing(true))?;
    assert_eq!(zeroed.raster.get(1, 1), Some(&0.0));
    assert_eq!(zeroed.num_missing, 0);
    Ok(())
}

#[test]
fn test_corner_ordering_idempotent() {
    let mut rng = StdRng::seed_from_u64(4);
    for _ in 0..50 {
        let m = compose(
            &rotation_matrix(rng.random_range(-180.0..180.0)),
            &projection_matrix(rng.random_range(-1e-2..1e-2), rng.random_range(-1e-2..1e-2)),
        );
        let raw: Quad =
            [[-0.5, -0.5], [0.5, -0.5], [-0.5, 0.5], [0.5, 0.5]].map(|p| map_point(&m, p));

        let order = order_corners_anticlockwise(&raw);
        let ordered = reorder(&raw, &order);
        assert!(area(&ordered) > 0.0);
        assert_eq!(order_corners_anticlockwise(&ordered), [0, 1, 2, 3]);
    }
}

#[test]
fn test_rotation_90_swaps_dimensions() -> Result<(), WarpError> {
    let src = random_raster(9, 4, 5);
    let output = warp_flux(&src, &rotation_matrix(90.0), &WarpConfig::default())?;

    assert_eq!(output.raster.size(), [4, 9].into());
    assert_eq!(output.num_missing, 0);
    assert_relative_eq!(output.raster.sum(), src.sum(), max_relative = 1e-9);

    // input column x and row y sit at (x + 1, y + 1) and land on (-(y + 1), x + 1)
    let [ox, oy] = output.plan.reference_offset;
    assert_eq!(output.plan.reference_offset, [-4, 1]);
    for (x, y) in [(0usize, 0usize), (8, 3), (2, 1)] {
        let (u, v) = ((-(y as i64 + 1) - ox) as usize, (x as i64 + 1 - oy) as usize);
        let expected = src.get(x, y).copied().unwrap_or(f64::NAN);
        let actual = output.raster.get(u, v).copied().unwrap_or(f64::NAN);
        assert_relative_eq!(actual, expected, epsilon = 1e-9);
    }
    Ok(())
}

#[test]
fn test_rotation_30_canvas() -> Result<(), WarpError> {
    let src = Raster::<f64>::from_size_val([6, 5].into(), 1.0)?;
    let output = warp_flux(&src, &rotation_matrix(30.0), &WarpConfig::default())?;

    assert_eq!(output.raster.size(), [8, 8].into());
    assert_eq!(output.plan.reference_offset, [-2, 1]);
    assert_relative_eq!(output.raster.sum(), src.sum(), max_relative = 1e-9);

    // the bottom corner of the input, at (0.18, 0.68), only reaches x = 0, 1 and 2 in the first row
    let first_row = &output.raster.as_slice()[..8];
    for (i, v) in first_row.iter().enumerate() {
        assert_eq!(v.is_nan(), !(2..=4).contains(&i), "column {i}: {v}");
    }
    // x = 2 holds the sliver of input below y = 1.5 and right of x = 1.5
    assert_relative_eq!(first_row[4], 0.0027767, epsilon = 1e-6);
    Ok(())
}
