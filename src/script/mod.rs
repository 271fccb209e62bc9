//! Narration script records and the caption schedule derived from them.

pub mod model;
pub mod timeline;
