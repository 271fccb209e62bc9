use crate::foundation::error::{FailureKind, VoxframeError, VoxframeResult};

/// Lifecycle of one synthesis run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PipelineState {
    #[default]
    Idle,
    SynthesizingAudio,
    Compositing,
    Finalizing,
    Done,
    Failed(FailureKind),
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }

    pub fn can_transition(self, to: Self) -> bool {
        use PipelineState::*;
        match (self, to) {
            (Idle, SynthesizingAudio)
            | (SynthesizingAudio, Compositing)
            | (Compositing, Finalizing)
            | (Finalizing, Done) => true,
            (from, Failed(_)) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Validate and take the edge `self -> to`.
    pub fn transition(self, to: Self) -> VoxframeResult<Self> {
        if !self.can_transition(to) {
            return Err(VoxframeError::validation(format!(
                "illegal pipeline transition {self:?} -> {to:?}"
            )));
        }
        Ok(to)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/state.rs"]
mod tests;
