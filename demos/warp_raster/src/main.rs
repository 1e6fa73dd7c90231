use argh::FromArgs;

use fluxwarp::{
    image::{Pixel, Raster},
    imgproc::warp::{
        self, FinalizedWarp, Homography, LinearWcs, WarpConfig, WarpJob, WarpSink, WarpedRaster,
    },
};

#[derive(FromArgs)]
/// Warp a synthetic star field and report the conserved flux
struct Args {
    /// width of the input raster
    #[argh(option, default = "64")]
    width: usize,

    /// height of the input raster
    #[argh(option, default = "48")]
    height: usize,

    /// warp matrix, 4 or 9 comma separated row-major coefficients
    #[argh(option, short = 'm')]
    matrix: Option<String>,

    /// rotation in degrees, applied after the matrix
    #[argh(option, short = 'r', default = "0.0")]
    rotate: f64,

    /// isotropic scale factor, applied after the rotation
    #[argh(option, short = 's', default = "1.0")]
    scale: f64,

    /// number of worker threads, the global pool when omitted
    #[argh(option, short = 't')]
    threads: Option<usize>,

    /// largest tolerated fraction of missing input per output pixel
    #[argh(option, default = "0.8")]
    max_missing_frac: f64,

    /// write 0 instead of NaN for output pixels without input
    #[argh(switch)]
    zero_for_missing: bool,

    /// store the output as u16 counts instead of f32
    #[argh(switch)]
    counts: bool,

    /// keep the output as f64
    #[argh(switch)]
    force_float: bool,
}

/// Prints a short summary of each finalized warp.
struct SummarySink {
    input_flux: f64,
}

impl<T: Pixel> WarpSink<T> for SummarySink {
    type Error = std::io::Error;

    fn persist(&mut self, result: &FinalizedWarp<T>) -> Result<(), Self::Error> {
        use std::io::Write;

        let mut out = std::io::stdout().lock();
        let size = result.raster.size();
        writeln!(
            out,
            "output: {}x{} {} raster, offset {:?}",
            size.width,
            size.height,
            result.raster.type_name(),
            result.reference_offset
        )?;
        writeln!(out, "missing pixels: {}", result.num_missing)?;
        writeln!(
            out,
            "flux: input {:.6}, output {:.6}",
            self.input_flux,
            result.raster.sum()
        )?;
        for keyword in &result.keywords {
            writeln!(
                out,
                "{:<8}= {:>20.12e} / {}",
                keyword.name, keyword.value, keyword.comment
            )?;
        }
        if let Some(wcs) = &result.wcs {
            writeln!(out, "CRPIX = {:?}", wcs.crpix)?;
            writeln!(out, "PC    = {:?}", wcs.pc)?;
        }
        if let WarpedRaster::Float(raster) = &result.raster {
            let peak = raster
                .as_slice()
                .iter()
                .copied()
                .filter(|v| !v.is_nan())
                .fold(f64::MIN, f64::max);
            writeln!(out, "peak: {peak:.6}")?;
        }
        Ok(())
    }
}

// a few gaussian stars on a flat background, with a column of bad pixels
fn star_field(width: usize, height: usize) -> Raster<f32> {
    let stars = [
        (0.3, 0.4, 2.0, 500.0),
        (0.7, 0.6, 1.5, 300.0),
        (0.5, 0.2, 3.0, 150.0),
    ];
    let bad_column = width / 5;
    Raster::from_fn([width, height].into(), |x, y| {
        if x == bad_column && y % 3 == 0 {
            return f32::NAN;
        }
        let mut v = 10.0;
        for (fx, fy, sigma, amp) in stars {
            let dx = x as f64 - fx * width as f64;
            let dy = y as f64 - fy * height as f64;
            v += amp * (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp();
        }
        v as f32
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut m = match &args.matrix {
        Some(s) => warp::parse_matrix(s)?,
        None => warp::IDENTITY,
    };
    if args.rotate != 0.0 {
        m = warp::compose(&m, &warp::rotation_matrix(args.rotate));
    }
    if args.scale != 1.0 {
        m = warp::compose(&m, &warp::scale_matrix(args.scale, args.scale));
    }
    let homography = Homography::new(m)?;
    log::info!("warp matrix: {:?}", homography.matrix());

    let mut config = WarpConfig::default()
        .with_max_missing_fraction(args.max_missing_frac)
        .with_zero_for_missing(args.zero_for_missing)
        .with_force_float(args.force_float);
    if let Some(n) = args.threads {
        config = config.with_num_threads(n);
    }

    let src = star_field(args.width, args.height);
    let wcs = LinearWcs {
        crpix: [args.width as f64 / 2.0, args.height as f64 / 2.0],
        cdelt: [2.8e-4, 2.8e-4],
        ..Default::default()
    };

    if args.counts {
        let counts = src.cast::<u16>();
        let mut sink = SummarySink {
            input_flux: counts.sum(),
        };
        let output = WarpJob::new(&counts, homography, config)?.run()?;
        sink.persist(&warp::finalize::<u16>(output, Some(&wcs)))?;
    } else {
        let mut sink = SummarySink {
            input_flux: src.sum(),
        };
        let output = WarpJob::new(&src, homography, config)?.run()?;
        sink.persist(&warp::finalize::<f32>(output, Some(&wcs)))?;
    }

    Ok(())
}
