/// An error type for the raster module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RasterError {
    /// Error when the sample buffer does not match the raster size.
    #[error("Data length ({0}) does not match the raster size ({1})")]
    InvalidDataLength(usize, usize),

    /// Error when the pixel count of a raster size overflows `usize`.
    #[error("Raster size ({0}x{1}) has too many pixels")]
    SizeOverflow(usize, usize),

    /// Error when a pixel coordinate is outside the raster.
    #[error("Pixel index ({0}, {1}) is out of bounds ({2}, {3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),
}
