//! Speech synthesis: engine abstraction, audio capture, and the `espeak-ng` backend.

pub mod capture;
pub mod engine;
pub mod espeak;
pub mod synthesizer;
