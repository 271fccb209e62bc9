use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Kinds of transient resources held during one synthesis run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// An open audio-capture graph collecting engine output.
    AudioCapture,
    /// An active muxer recording session.
    Recorder,
    /// A temporary file or in-flight asset handle.
    TempHandle,
}

/// Point-in-time count of live resources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub audio_captures: usize,
    pub recorders: usize,
    pub temp_handles: usize,
}

impl ResourceSnapshot {
    pub fn is_idle(self) -> bool {
        self.audio_captures == 0 && self.recorders == 0 && self.temp_handles == 0
    }
}

#[derive(Debug, Default)]
struct Counts {
    audio_captures: AtomicUsize,
    recorders: AtomicUsize,
    temp_handles: AtomicUsize,
}

impl Counts {
    fn slot(&self, kind: ResourceKind) -> &AtomicUsize {
        match kind {
            ResourceKind::AudioCapture => &self.audio_captures,
            ResourceKind::Recorder => &self.recorders,
            ResourceKind::TempHandle => &self.temp_handles,
        }
    }
}

/// Shared counter of live resources, owned by one orchestrator.
///
/// Every acquisition returns a [`ResourceGuard`]; the count only drops when the guard does, so a
/// non-idle snapshot after a run means something escaped its scope.
#[derive(Clone, Debug, Default)]
pub struct ResourceLedger {
    counts: Arc<Counts>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, kind: ResourceKind) -> ResourceGuard {
        self.counts.slot(kind).fetch_add(1, Ordering::SeqCst);
        tracing::trace!(?kind, "resource acquired");
        ResourceGuard {
            counts: self.counts.clone(),
            kind,
        }
    }

    pub fn live(&self, kind: ResourceKind) -> usize {
        self.counts.slot(kind).load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            audio_captures: self.live(ResourceKind::AudioCapture),
            recorders: self.live(ResourceKind::Recorder),
            temp_handles: self.live(ResourceKind::TempHandle),
        }
    }
}

/// Scoped claim on one resource slot; releases on drop.
#[derive(Debug)]
pub struct ResourceGuard {
    counts: Arc<Counts>,
    kind: ResourceKind,
}

impl ResourceGuard {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        self.counts.slot(self.kind).fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(kind = ?self.kind, "resource released");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/resources.rs"]
mod tests;
