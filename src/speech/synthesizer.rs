use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::resources::ResourceLedger;
use crate::speech::capture::{AudioCapture, AudioTrack};
use crate::speech::engine::{DEFAULT_LOCALE, SpeechEngine, Utterance, UtteranceEvent, select_voice};
use std::ops::ControlFlow;
use std::time::Duration;

/// Voice parameters for one synthesis.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpeechOpts {
    pub locale: String,
    pub rate: f32,
    pub pitch: f32,
    /// Silence appended after end-of-utterance, in milliseconds.
    pub tail_ms: u64,
}

impl Default for SpeechOpts {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            rate: 0.9,
            pitch: 1.0,
            tail_ms: 100,
        }
    }
}

impl SpeechOpts {
    pub fn validate(&self) -> VoxframeResult<()> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(VoxframeError::validation("speech rate must be finite and > 0"));
        }
        if !self.pitch.is_finite() || self.pitch <= 0.0 {
            return Err(VoxframeError::validation(
                "speech pitch must be finite and > 0",
            ));
        }
        Ok(())
    }
}

/// Drives a [`SpeechEngine`] and captures its output into an [`AudioTrack`].
pub struct SpeechSynthesizer<'a> {
    engine: &'a mut dyn SpeechEngine,
    opts: SpeechOpts,
}

impl<'a> SpeechSynthesizer<'a> {
    pub fn new(engine: &'a mut dyn SpeechEngine, opts: SpeechOpts) -> Self {
        Self { engine, opts }
    }

    /// Build the utterance for `text`, choosing a locale-matching voice when one exists.
    pub fn prepare(&mut self, text: &str) -> VoxframeResult<Utterance> {
        if text.trim().is_empty() {
            return Err(VoxframeError::validation(
                "narration text must be non-empty",
            ));
        }
        self.opts.validate()?;
        if !self.engine.is_available() {
            return Err(VoxframeError::unsupported(format!(
                "speech engine '{}' is not available on this host",
                self.engine.name()
            )));
        }

        let voices = self.engine.voices()?;
        let voice = select_voice(&voices, &self.opts.locale).cloned();
        match &voice {
            Some(v) => tracing::debug!(voice = %v.id, locale = %self.opts.locale, "selected voice"),
            None => tracing::debug!(
                locale = %self.opts.locale,
                available = voices.len(),
                "no locale voice; using engine default"
            ),
        }

        Ok(Utterance {
            text: text.to_string(),
            lang: self.opts.locale.clone(),
            rate: self.opts.rate,
            pitch: self.opts.pitch,
            voice,
        })
    }

    /// Speak `text` and return the captured audio.
    ///
    /// Resolves only after the engine signals end-of-utterance. The capture graph is released on
    /// every return path.
    #[tracing::instrument(skip_all, fields(engine = self.engine.name(), chars = text.chars().count()))]
    pub fn synthesize(
        &mut self,
        text: &str,
        ledger: &ResourceLedger,
        cancel: &CancelToken,
    ) -> VoxframeResult<AudioTrack> {
        let utterance = self.prepare(text)?;
        cancel.check()?;

        let mut capture = AudioCapture::open(ledger, Duration::from_millis(self.opts.tail_ms));
        let mut ended = false;
        let mut failure: Option<VoxframeError> = None;

        let spoke = self.engine.speak(&utterance, &mut |event| {
            if cancel.is_cancelled() {
                return ControlFlow::Break(());
            }
            match event {
                UtteranceEvent::Audio(chunk) => {
                    if ended {
                        failure = Some(VoxframeError::synthesis(
                            "engine emitted audio after end-of-utterance",
                        ));
                        return ControlFlow::Break(());
                    }
                    if let Err(e) = capture.push(chunk) {
                        failure = Some(e);
                        return ControlFlow::Break(());
                    }
                    ControlFlow::Continue(())
                }
                UtteranceEvent::End => {
                    ended = true;
                    ControlFlow::Continue(())
                }
                UtteranceEvent::Error(detail) => {
                    failure = Some(VoxframeError::synthesis(detail));
                    ControlFlow::Break(())
                }
            }
        });

        cancel.check()?;
        if let Some(e) = failure {
            return Err(e);
        }
        spoke.map_err(|e| match e {
            VoxframeError::Other(inner) => VoxframeError::synthesis(format!("{inner:#}")),
            other => other,
        })?;
        if !ended {
            return Err(VoxframeError::synthesis(
                "engine stopped without signalling end-of-utterance",
            ));
        }

        let track = capture.finish()?;
        tracing::info!(
            secs = track.duration_secs(),
            sample_rate = track.sample_rate,
            "speech captured"
        );
        Ok(track)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/speech/synthesizer.rs"]
mod tests;
