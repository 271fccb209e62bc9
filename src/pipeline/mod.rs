//! The synthesis state machine and everything it owns for one run.

pub mod cancel;
pub mod orchestrator;
pub mod progress;
pub mod recording;
pub mod resources;
pub mod state;

pub use cancel::CancelToken;
pub use orchestrator::{SynthesisOrchestrator, VideoExport};
pub use progress::{ProgressReporter, ProgressSink};
pub use recording::Recording;
pub use resources::{ResourceKind, ResourceLedger, ResourceSnapshot};
pub use state::PipelineState;
