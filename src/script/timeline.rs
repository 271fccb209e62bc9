use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::script::model::NarrationScript;

/// Precomputed caption schedule for one script.
///
/// Section `i` is active on `[ends[i-1], ends[i])`; elapsed times at or past the total keep the
/// last section active.
#[derive(Clone, Debug)]
pub struct CaptionTimeline {
    ends: Vec<f64>,
}

impl CaptionTimeline {
    pub fn new(script: &NarrationScript) -> VoxframeResult<Self> {
        Self::from_durations(script.sections.iter().map(|s| s.duration))
    }

    pub fn from_durations(durations: impl IntoIterator<Item = f64>) -> VoxframeResult<Self> {
        let mut ends = Vec::new();
        let mut acc = 0.0f64;
        for d in durations {
            if !d.is_finite() || d <= 0.0 {
                return Err(VoxframeError::validation(
                    "caption durations must be finite and > 0",
                ));
            }
            acc += d;
            ends.push(acc);
        }
        if ends.is_empty() {
            return Err(VoxframeError::validation(
                "caption timeline needs at least one section",
            ));
        }
        Ok(Self { ends })
    }

    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Sum of all section durations.
    pub fn total(&self) -> f64 {
        self.ends.last().copied().unwrap_or(0.0)
    }

    /// Index of the section active at `elapsed_secs`.
    ///
    /// First section whose cumulative end strictly exceeds `elapsed_secs`, else the last one.
    /// Negative and NaN inputs are treated as 0.
    pub fn active_section(&self, elapsed_secs: f64) -> usize {
        let t = if elapsed_secs.is_nan() {
            0.0
        } else {
            elapsed_secs.max(0.0)
        };
        let idx = self.ends.partition_point(|&end| end <= t);
        idx.min(self.ends.len() - 1)
    }

    /// Start time of section `idx`, in seconds.
    pub fn section_start(&self, idx: usize) -> f64 {
        match idx {
            0 => 0.0,
            i => self.ends[(i - 1).min(self.ends.len() - 1)],
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/timeline.rs"]
mod tests;
