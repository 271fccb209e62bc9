use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::assets::text::TextLayoutEngine;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::render::clock::Pacing;
use crate::speech::synthesizer::SpeechOpts;

/// Settings for one [`crate::SynthesisOrchestrator`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub canvas: Canvas,
    pub fps: Fps,
    pub speech: SpeechOpts,
    /// TTF/OTF used for captions. When unset, an installed CJK-capable font is looked up.
    pub font_path: Option<PathBuf>,
    /// `false` renders background and progress bar only, with no caption glyphs or readout.
    pub draw_text: bool,
    pub out_dir: PathBuf,
    pub pacing: Pacing,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            fps: Fps::default(),
            speech: SpeechOpts::default(),
            font_path: None,
            draw_text: true,
            out_dir: PathBuf::from("."),
            pacing: Pacing::Offline,
        }
    }
}

impl PipelineConfig {
    pub fn from_path(path: &Path) -> VoxframeResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text).map_err(|e| {
            VoxframeError::validation(format!("invalid config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> VoxframeResult<()> {
        self.canvas.validate()?;
        Fps::new(self.fps.num, self.fps.den)?;
        self.speech.validate()?;
        if self.out_dir.as_os_str().is_empty() {
            return Err(VoxframeError::validation("out_dir must be non-empty"));
        }
        Ok(())
    }

    /// Resolve the caption font: the configured file, else an installed system font.
    ///
    /// `Ok(None)` only when `draw_text` is off. A missing configured file is
    /// [`VoxframeError::ResourceLoad`]; no usable font at all is
    /// [`VoxframeError::UnsupportedCapability`].
    pub fn caption_font(&self) -> VoxframeResult<Option<TextLayoutEngine>> {
        if !self.draw_text {
            return Ok(None);
        }
        if let Some(path) = &self.font_path {
            return TextLayoutEngine::from_font_path(path).map(Some).map_err(|e| {
                VoxframeError::resource_load(format!(
                    "failed to load caption font '{}': {e}",
                    path.display()
                ))
            });
        }
        TextLayoutEngine::from_system_fonts()
            .map(Some)
            .ok_or_else(|| {
                VoxframeError::unsupported(
                    "no caption font configured and none found on this host; set font_path",
                )
            })
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
