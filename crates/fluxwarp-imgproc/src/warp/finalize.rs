use std::any::TypeId;

use fluxwarp_image::{Pixel, Raster, RasterSize};

use super::{homography::Homography, job::WarpOutput, wcs::LinearWcs};

/// Comment attached to every warp matrix keyword.
pub const MATRIX_KEYWORD_COMMENT: &str = "Warp matrix element value.";

/// One element of the warp matrix, recorded alongside the output for provenance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatrixKeyword {
    /// Keyword name, `WMTX{row}_{col}`.
    pub name: String,
    /// One-based matrix row.
    pub row: usize,
    /// One-based matrix column.
    pub col: usize,
    /// The matrix element.
    pub value: f64,
    /// Human readable description.
    pub comment: String,
}

/// The nine forward matrix elements as provenance keywords, row by row.
///
/// # Example
///
/// ```
/// use fluxwarp_imgproc::warp::{provenance_keywords, Homography};
///
/// let keywords = provenance_keywords(&Homography::identity());
///
/// assert_eq!(keywords.len(), 9);
/// assert_eq!(keywords[5].name, "WMTX2_3");
/// assert_eq!(keywords[8].value, 1.0);
/// ```
pub fn provenance_keywords(homography: &Homography) -> Vec<MatrixKeyword> {
    homography
        .matrix()
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let (row, col) = (i / 3 + 1, i % 3 + 1);
            MatrixKeyword {
                name: format!("WMTX{row}_{col}"),
                row,
                col,
                value,
                comment: MATRIX_KEYWORD_COMMENT.to_string(),
            }
        })
        .collect()
}

/// The output raster in its final sample type.
#[derive(Debug, Clone, PartialEq)]
pub enum WarpedRaster<T> {
    /// Converted back to the input sample type.
    Native(Raster<T>),
    /// Kept as `f64`.
    Float(Raster<f64>),
}

impl<T: Pixel> WarpedRaster<T> {
    /// The size of the raster.
    pub fn size(&self) -> RasterSize {
        match self {
            WarpedRaster::Native(r) => r.size(),
            WarpedRaster::Float(r) => r.size(),
        }
    }

    /// Name of the sample type.
    pub fn type_name(&self) -> &'static str {
        match self {
            WarpedRaster::Native(_) => T::NAME,
            WarpedRaster::Float(_) => f64::NAME,
        }
    }

    /// Number of blank samples.
    pub fn num_blank(&self) -> usize {
        match self {
            WarpedRaster::Native(r) => r.num_blank(),
            WarpedRaster::Float(r) => r.num_blank(),
        }
    }

    /// Sum of the non-blank samples.
    pub fn sum(&self) -> f64 {
        match self {
            WarpedRaster::Native(r) => r.sum(),
            WarpedRaster::Float(r) => r.sum(),
        }
    }
}

/// A completed warp, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedWarp<T> {
    /// The output raster.
    pub raster: WarpedRaster<T>,
    /// Number of output pixels written as missing.
    pub num_missing: usize,
    /// Transform-space position of the first output pixel.
    pub reference_offset: [i64; 2],
    /// The warp matrix as provenance keywords.
    pub keywords: Vec<MatrixKeyword>,
    /// The coordinate system of the output, when the input had one.
    pub wcs: Option<LinearWcs>,
}

/// Convert a joined warp into its final form.
///
/// The raster stays `f64` when the job asked for it or the input already was `f64`; otherwise it
/// is converted back to `T`, with missing pixels becoming `T::BLANK`.
///
/// # Example
///
/// ```
/// use fluxwarp_image::Raster;
/// use fluxwarp_imgproc::warp::{finalize, warp_flux, WarpConfig, WarpedRaster, IDENTITY};
///
/// let src = Raster::<u16>::from_size_val([2, 2].into(), 7).unwrap();
/// let output = warp_flux(&src, &IDENTITY, &WarpConfig::default()).unwrap();
/// let done = finalize::<u16>(output, None);
///
/// assert!(matches!(done.raster, WarpedRaster::Native(ref r) if r.as_slice() == &[7; 4]));
/// assert_eq!(done.keywords.len(), 9);
/// ```
pub fn finalize<T: Pixel>(output: WarpOutput, wcs: Option<&LinearWcs>) -> FinalizedWarp<T> {
    let reference_offset = output.plan.reference_offset;
    let keywords = provenance_keywords(&output.homography);
    let wcs = wcs.map(|wcs| wcs.warped(&output.homography, reference_offset));

    let raster = if output.force_float || TypeId::of::<T>() == TypeId::of::<f64>() {
        WarpedRaster::Float(output.raster)
    } else {
        WarpedRaster::Native(output.raster.cast::<T>())
    };
    log::debug!(
        "warp job finalized: {} {} raster",
        raster.type_name(),
        raster.size()
    );

    FinalizedWarp {
        raster,
        num_missing: output.num_missing,
        reference_offset,
        keywords,
        wcs,
    }
}

/// Destination of finalized warps, such as an image file writer.
pub trait WarpSink<T: Pixel> {
    /// The error type of the destination.
    type Error;

    /// Store one finalized warp.
    fn persist(&mut self, result: &FinalizedWarp<T>) -> Result<(), Self::Error>;
}
