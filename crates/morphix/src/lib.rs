#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use morphix_image as image;

#[doc(inline)]
pub use morphix_imgproc as imgproc;
