use crate::{error::RasterError, pixel::Pixel};

/// Raster size in pixels
///
/// A struct to represent the size of a raster in pixels.
///
/// # Examples
///
/// ```
/// use fluxwarp_image::RasterSize;
///
/// let size = RasterSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(size.width, 10);
/// assert_eq!(size.height, 20);
/// assert_eq!(size.num_pixels(), 200);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RasterSize {
    /// Width of the raster in pixels
    pub width: usize,
    /// Height of the raster in pixels
    pub height: usize,
}

impl RasterSize {
    /// Number of pixels covered by the raster.
    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }

    /// Number of pixels covered by the raster, or `None` if it overflows `usize`.
    pub fn checked_num_pixels(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }
}

impl std::fmt::Display for RasterSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "RasterSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for RasterSize {
    fn from(size: [usize; 2]) -> Self {
        RasterSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// A single band raster stored as a flat, row-major sample buffer.
///
/// The sample at column `x` and row `y` lives at index `y * width + x`. Missing samples carry the
/// [`Pixel::BLANK`] value of the sample type.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster<T> {
    size: RasterSize,
    data: Vec<T>,
}

impl<T: Pixel> Raster<T> {
    /// Create a new raster from sample data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the raster in pixels.
    /// * `data` - The row-major samples of the raster.
    ///
    /// # Errors
    ///
    /// If the length of the sample data does not match the raster size, or the size holds more
    /// pixels than `usize` can count, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use fluxwarp_image::{Raster, RasterSize};
    ///
    /// let raster = Raster::<f32>::new(
    ///    RasterSize {
    ///       width: 3,
    ///       height: 2,
    ///    },
    ///    vec![0.0f32; 3 * 2],
    /// ).unwrap();
    ///
    /// assert_eq!(raster.width(), 3);
    /// assert_eq!(raster.height(), 2);
    /// ```
    pub fn new(size: RasterSize, data: Vec<T>) -> Result<Self, RasterError> {
        let expected = checked_len(size)?;
        if data.len() != expected {
            return Err(RasterError::InvalidDataLength(data.len(), expected));
        }
        Ok(Self { size, data })
    }

    /// Create a new raster with every sample set to `val`.
    pub fn from_size_val(size: RasterSize, val: T) -> Result<Self, RasterError> {
        let data = vec![val; checked_len(size)?];
        Raster::new(size, data)
    }

    /// Create a new raster by evaluating `f(x, y)` at every pixel.
    pub fn from_fn(size: RasterSize, f: impl Fn(usize, usize) -> T) -> Self {
        let data = (0..size.height)
            .flat_map(|y| (0..size.width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self { size, data }
    }

    /// Get the size of the raster in pixels.
    pub fn size(&self) -> RasterSize {
        self.size
    }

    /// Get the width of the raster in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the raster in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// The samples as a row-major slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The samples as a mutable row-major slice.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the raster and return its sample buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Get the sample at column `x` and row `y`, or `None` outside the raster.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.data.get(y * self.size.width + x)
    }

    /// Set the sample at column `x` and row `y`.
    pub fn set(&mut self, x: usize, y: usize, val: T) -> Result<(), RasterError> {
        let (width, height) = (self.size.width, self.size.height);
        if x >= width || y >= height {
            return Err(RasterError::PixelIndexOutOfBounds(x, y, width, height));
        }
        self.data[y * width + x] = val;
        Ok(())
    }

    /// Number of samples carrying the blank value.
    pub fn num_blank(&self) -> usize {
        self.data.iter().filter(|v| v.is_blank()).count()
    }

    /// Sum of all non-blank samples, as `f64`.
    pub fn sum(&self) -> f64 {
        self.data
            .iter()
            .filter(|v| !v.is_blank())
            .map(|v| v.to_f64())
            .sum()
    }

    /// Convert the samples to another type, carrying blanks over.
    ///
    /// # Examples
    ///
    /// ```
    /// use fluxwarp_image::{Pixel, Raster, RasterSize};
    ///
    /// let raster = Raster::<f64>::new([2, 1].into(), vec![3.6, f64::NAN]).unwrap();
    /// let raster_u8 = raster.cast::<u8>();
    ///
    /// assert_eq!(raster_u8.as_slice(), &[4, u8::BLANK]);
    /// ```
    pub fn cast<U: Pixel>(&self) -> Raster<U> {
        Raster {
            size: self.size,
            data: self.data.iter().map(|v| U::from_f64(v.to_f64())).collect(),
        }
    }
}

fn checked_len(size: RasterSize) -> Result<usize, RasterError> {
    size.checked_num_pixels()
        .ok_or(RasterError::SizeOverflow(size.width, size.height))
}
