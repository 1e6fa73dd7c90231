#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use fluxwarp_image as image;

#[doc(inline)]
pub use fluxwarp_imgproc as imgproc;
