use crate::foundation::error::VoxframeResult;
use std::ops::ControlFlow;

/// Default narration locale (Mandarin, mainland).
pub const DEFAULT_LOCALE: &str = "zh-CN";

/// A voice offered by a speech engine.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Voice {
    /// Identifier passed back to the engine when selecting this voice.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Primary language tag, e.g. `cmn` or `en-US`.
    pub language: String,
    /// Extra language tags this voice answers to, e.g. `zh`.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Voice {
    pub fn new(id: impl Into<String>, name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: language.into(),
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    fn answers_to(&self, prefix: &str) -> bool {
        std::iter::once(&self.language)
            .chain(self.aliases.iter())
            .any(|tag| tag.to_ascii_lowercase().starts_with(prefix))
    }
}

/// One spoken rendering request.
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// BCP-47 style locale, e.g. `zh-CN`.
    pub lang: String,
    /// Speaking rate multiplier, 1.0 is the engine's normal speed.
    pub rate: f32,
    /// Pitch multiplier, 1.0 is the engine's normal pitch.
    pub pitch: f32,
    /// Explicit voice; `None` lets the engine pick its default.
    pub voice: Option<Voice>,
}

/// Interleaved PCM emitted by an engine while speaking.
#[derive(Clone, Debug, PartialEq)]
pub struct PcmChunk {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved samples in `[-1, 1]`.
    pub samples: Vec<f32>,
}

/// Events emitted by [`SpeechEngine::speak`], in order.
#[derive(Clone, Debug, PartialEq)]
pub enum UtteranceEvent {
    Audio(PcmChunk),
    /// End of utterance. No audio follows.
    End,
    /// The engine failed mid-utterance.
    Error(String),
}

/// A text-to-speech backend.
///
/// Engines deliver audio incrementally through `on_event` while the utterance is being spoken.
/// When the callback returns [`ControlFlow::Break`] the engine must stop promptly and return.
pub trait SpeechEngine: Send {
    /// Short engine name used in logs.
    fn name(&self) -> &str;

    /// Whether the engine can be used on this host.
    fn is_available(&mut self) -> bool;

    /// Voices installed for this engine.
    fn voices(&mut self) -> VoxframeResult<Vec<Voice>>;

    /// Speak `utterance`, streaming events until `End`, `Error`, or a break request.
    fn speak(
        &mut self,
        utterance: &Utterance,
        on_event: &mut dyn FnMut(UtteranceEvent) -> ControlFlow<()>,
    ) -> VoxframeResult<()>;
}

/// Pick the first voice whose language matches the locale's primary subtag.
///
/// `zh-CN` matches voices tagged `zh`, `zh-TW`, or aliased to `zh`. `None` means "use the engine
/// default".
pub fn select_voice<'a>(voices: &'a [Voice], locale: &str) -> Option<&'a Voice> {
    let primary = locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if primary.is_empty() {
        return None;
    }
    voices.iter().find(|v| v.answers_to(&primary))
}

#[cfg(test)]
#[path = "../../tests/unit/speech/engine.rs"]
mod tests;
