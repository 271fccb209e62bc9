//! Input assets: background image decoding and caption text layout.

pub mod decode;
pub mod text;

pub use decode::{BackgroundImage, DecodedImage, decode_background};
pub use text::{TextBrush, TextLayoutEngine};
