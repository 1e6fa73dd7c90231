use num_traits::{Bounded, NumCast};

/// Trait for raster sample types.
///
/// Every sample type reserves one value, [`Pixel::BLANK`], to mark missing data. Floating point
/// samples use NaN; integer samples use an extreme of their range, which therefore can never be
/// produced by [`Pixel::from_f64`] for a finite input.
///
/// Send and Sync are required to share a raster across the resampling workers.
pub trait Pixel: Copy + Default + PartialEq + Send + Sync + std::fmt::Debug + 'static {
    /// The value marking a missing sample.
    const BLANK: Self;

    /// Short name of the sample type.
    const NAME: &'static str;

    /// Returns true if the sample marks missing data.
    fn is_blank(&self) -> bool;

    /// Convert the sample to `f64`, mapping the blank value to NaN.
    fn to_f64(self) -> f64;

    /// Convert a `f64` value to the sample type.
    ///
    /// NaN maps to [`Pixel::BLANK`]. Integer types round to the nearest value and saturate at the
    /// closest representable value that is not the blank.
    fn from_f64(x: f64) -> Self;
}

impl Pixel for f32 {
    const BLANK: Self = f32::NAN;
    const NAME: &'static str = "f32";

    fn is_blank(&self) -> bool {
        self.is_nan()
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(x: f64) -> Self {
        x as f32
    }
}

impl Pixel for f64 {
    const BLANK: Self = f64::NAN;
    const NAME: &'static str = "f64";

    fn is_blank(&self) -> bool {
        self.is_nan()
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(x: f64) -> Self {
        x
    }
}

// `$usable` is the closest value to the blank that still counts as valid data.
macro_rules! impl_integer_pixel {
    ($t:ty, $blank:expr, $usable:expr) => {
        impl Pixel for $t {
            const BLANK: Self = $blank;
            const NAME: &'static str = stringify!($t);

            fn is_blank(&self) -> bool {
                *self == Self::BLANK
            }

            fn to_f64(self) -> f64 {
                if self.is_blank() {
                    f64::NAN
                } else {
                    self as f64
                }
            }

            fn from_f64(x: f64) -> Self {
                if x.is_nan() {
                    return Self::BLANK;
                }
                let rounded = x.round();
                let value = <$t as NumCast>::from(rounded).unwrap_or(if rounded < 0.0 {
                    <$t as Bounded>::min_value()
                } else {
                    <$t as Bounded>::max_value()
                });
                if value == Self::BLANK {
                    $usable
                } else {
                    value
                }
            }
        }
    };
}

impl_integer_pixel!(u8, u8::MAX, u8::MAX - 1);
impl_integer_pixel!(u16, u16::MAX, u16::MAX - 1);
impl_integer_pixel!(i16, i16::MIN, i16::MIN + 1);
impl_integer_pixel!(i32, i32::MIN, i32::MIN + 1);
impl_integer_pixel!(i64, i64::MIN, i64::MIN + 1);
