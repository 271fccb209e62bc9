pub type VoxframeResult<T> = Result<T, VoxframeError>;

/// Failure taxonomy surfaced by the synthesis pipeline.
///
/// Every subordinate failure is mapped to exactly one variant at the orchestrator boundary.
#[derive(thiserror::Error, Debug)]
pub enum VoxframeError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported capability: {0}")]
    UnsupportedCapability(String),

    #[error("speech synthesis error: {0}")]
    Synthesis(String),

    #[error("resource load error: {0}")]
    ResourceLoad(String),

    #[error("capture error: {0}")]
    Capture(String),

    #[error("encoding unsupported: {0}")]
    EncodingUnsupported(String),

    #[error("synthesis cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Flat classification of [`VoxframeError`], recorded by the pipeline state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FailureKind {
    Validation,
    UnsupportedCapability,
    Synthesis,
    ResourceLoad,
    Capture,
    EncodingUnsupported,
    Cancelled,
    Other,
}

impl VoxframeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedCapability(msg.into())
    }

    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    pub fn resource_load(msg: impl Into<String>) -> Self {
        Self::ResourceLoad(msg.into())
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    pub fn encoding_unsupported(msg: impl Into<String>) -> Self {
        Self::EncodingUnsupported(msg.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::UnsupportedCapability(_) => FailureKind::UnsupportedCapability,
            Self::Synthesis(_) => FailureKind::Synthesis,
            Self::ResourceLoad(_) => FailureKind::ResourceLoad,
            Self::Capture(_) => FailureKind::Capture,
            Self::EncodingUnsupported(_) => FailureKind::EncodingUnsupported,
            Self::Cancelled => FailureKind::Cancelled,
            Self::Other(_) => FailureKind::Other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
