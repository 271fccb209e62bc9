//! Frame composition: caption layout, frame clock, and the CPU compositor.

pub mod caption;
pub mod clock;
pub mod compositor;
pub mod frame;

pub use caption::{FixedAdvanceMeasure, TextMeasure, display_units, wrap_caption};
pub use clock::{FrameClock, Pacing};
pub use compositor::{CompositeSummary, FrameCompositor, FrameTick};
pub use frame::FrameRGBA;
