use crate::foundation::error::{VoxframeError, VoxframeResult};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Tolerance between the declared and realised export durations, in seconds.
pub const DURATION_TOLERANCE_SECS: f64 = 1.0;

/// One timed caption span of a narration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Section {
    /// Caption text shown while this section is active.
    pub text: String,
    /// Declared duration in seconds.
    pub duration: f64,
}

impl Section {
    pub fn new(text: impl Into<String>, duration: f64) -> Self {
        Self {
            text: text.into(),
            duration,
        }
    }
}

/// Timed narration script consumed by the synthesis pipeline.
///
/// The record is produced upstream (by a content-generation collaborator) and is read-only here.
/// JSON accepts both snake_case field names and the camelCase names used by the upstream
/// producer (`estimatedDuration`, `contentId`, and `script` for the narration text).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NarrationScript {
    pub id: String,
    #[serde(default, alias = "contentId", skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    /// Full narration text passed to the speech engine.
    #[serde(alias = "script")]
    pub text: String,
    /// Caption sections in playback order.
    pub sections: Vec<Section>,
    #[serde(default, alias = "estimatedDuration")]
    pub estimated_total_duration: f64,
}

impl NarrationScript {
    /// Build a script whose estimated duration is the sum of its section durations.
    pub fn new(id: impl Into<String>, text: impl Into<String>, sections: Vec<Section>) -> Self {
        let estimated_total_duration = sections.iter().map(|s| s.duration).sum();
        Self {
            id: id.into(),
            content_id: None,
            text: text.into(),
            sections,
            estimated_total_duration,
        }
    }

    /// Parse a script from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> VoxframeResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| VoxframeError::validation(format!("parse narration script JSON: {e}")))
    }

    /// Parse a script from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> VoxframeResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            VoxframeError::validation(format!(
                "open narration script JSON '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check the record shape. Content is never interpreted beyond this.
    pub fn validate(&self) -> VoxframeResult<()> {
        if self.id.trim().is_empty() {
            return Err(VoxframeError::validation("script id must be non-empty"));
        }
        if self.text.trim().is_empty() {
            return Err(VoxframeError::validation(
                "script narration text must be non-empty",
            ));
        }
        if self.sections.is_empty() {
            return Err(VoxframeError::validation(
                "script must contain at least one section",
            ));
        }
        for (i, s) in self.sections.iter().enumerate() {
            if !s.duration.is_finite() || s.duration <= 0.0 {
                return Err(VoxframeError::validation(format!(
                    "section {i} duration must be finite and > 0 (got {})",
                    s.duration
                )));
            }
            if s.text.trim().is_empty() {
                return Err(VoxframeError::validation(format!(
                    "section {i} caption text must be non-empty"
                )));
            }
        }
        if !self.estimated_total_duration.is_finite() || self.estimated_total_duration < 0.0 {
            return Err(VoxframeError::validation(
                "estimated_total_duration must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// Sum of declared section durations.
    pub fn sections_total(&self) -> f64 {
        self.sections.iter().map(|s| s.duration).sum()
    }

    /// Authoritative stop time for the compositor, in seconds.
    ///
    /// The section sum governs; a diverging `estimated_total_duration` is only reported.
    pub fn declared_duration(&self) -> f64 {
        let total = self.sections_total();
        if self.estimated_total_duration > 0.0
            && (total - self.estimated_total_duration).abs() > DURATION_TOLERANCE_SECS
        {
            tracing::warn!(
                script = %self.id,
                sections_total = total,
                estimated = self.estimated_total_duration,
                "estimated duration diverges from section sum; section sum governs"
            );
        }
        total
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/model.rs"]
mod tests;
