use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::assets::decode::{BackgroundImage, DecodedImage, decode_background};
use crate::config::PipelineConfig;
use crate::encode::muxer::{
    AssetRef, CombinedStream, MuxProfile, RecordingRequest, StreamMuxer, VideoSource,
};
use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::progress::{ProgressReporter, ProgressSink};
use crate::pipeline::recording::Recording;
use crate::pipeline::resources::ResourceLedger;
use crate::pipeline::state::PipelineState;
use crate::render::clock::FrameClock;
use crate::render::compositor::FrameCompositor;
use crate::script::model::NarrationScript;
use crate::speech::capture::AudioTrack;
use crate::speech::engine::SpeechEngine;
use crate::speech::synthesizer::SpeechSynthesizer;

/// Finished narrated video.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoExport {
    pub id: Uuid,
    pub source_script_id: String,
    pub asset: AssetRef,
    pub duration_seconds: f64,
    pub created_at: DateTime<Utc>,
    pub mime_type: String,
    extension: &'static str,
}

impl VideoExport {
    /// Download name, `narration_video_<id>.<ext>`.
    pub fn suggested_file_name(&self) -> String {
        format!("{}.{}", asset_name(self.id), self.extension)
    }
}

fn asset_name(id: Uuid) -> String {
    format!("narration_video_{id}")
}

/// Audio and optional background, both ready.
struct Inputs {
    audio: AudioTrack,
    background: Option<DecodedImage>,
}

/// Runs the narration pipeline: speech, then compositing and recording, then finalizing.
///
/// One instance runs one synthesis at a time (`synthesize` takes `&mut self`). Every resource a
/// run acquires is released before `synthesize` returns, on success and failure alike; the
/// ledger returned by [`SynthesisOrchestrator::resources`] shows that.
pub struct SynthesisOrchestrator<E, M> {
    engine: E,
    muxer: M,
    config: PipelineConfig,
    ledger: ResourceLedger,
    state: PipelineState,
}

impl<E: SpeechEngine, M: StreamMuxer> SynthesisOrchestrator<E, M> {
    pub fn new(engine: E, muxer: M, config: PipelineConfig) -> Self {
        Self {
            engine,
            muxer,
            config,
            ledger: ResourceLedger::new(),
            state: PipelineState::Idle,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// State reached by the last run.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn resources(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn muxer(&self) -> &M {
        &self.muxer
    }

    pub fn into_parts(self) -> (E, M) {
        (self.engine, self.muxer)
    }

    /// Turn `script` into a narrated caption video.
    ///
    /// Progress is non-decreasing and reaches 100 only when an export is returned.
    #[tracing::instrument(skip_all, fields(script = %script.id, sections = script.sections.len()))]
    pub fn synthesize(
        &mut self,
        script: &NarrationScript,
        background: Option<BackgroundImage>,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> VoxframeResult<VideoExport> {
        self.state = PipelineState::Idle;
        let mut reporter = ProgressReporter::new(progress);

        let result = self.run(script, background, &mut reporter, cancel);
        let result = result.and_then(|export| {
            self.advance(PipelineState::Done)?;
            Ok(export)
        });

        match result {
            Ok(export) => {
                reporter.done();
                tracing::info!(
                    export = %export.id,
                    secs = export.duration_seconds,
                    mime = %export.mime_type,
                    "synthesis done"
                );
                Ok(export)
            }
            Err(e) => {
                let e = self.classify(e);
                let failed = PipelineState::Failed(e.kind());
                self.state = self.state.transition(failed).unwrap_or(failed);
                tracing::warn!(state = ?self.state, error = %e, "synthesis failed");
                Err(e)
            }
        }
    }

    fn advance(&mut self, to: PipelineState) -> VoxframeResult<()> {
        self.state = self.state.transition(to)?;
        tracing::info!(state = ?to, "pipeline state");
        Ok(())
    }

    /// Map an unclassified error to the kind owned by the current stage.
    fn classify(&self, e: VoxframeError) -> VoxframeError {
        match e {
            VoxframeError::Other(inner) => match self.state {
                PipelineState::SynthesizingAudio => VoxframeError::synthesis(format!("{inner:#}")),
                PipelineState::Compositing | PipelineState::Finalizing => {
                    VoxframeError::capture(format!("{inner:#}"))
                }
                _ => VoxframeError::Other(inner),
            },
            other => other,
        }
    }

    fn run(
        &mut self,
        script: &NarrationScript,
        background: Option<BackgroundImage>,
        reporter: &mut ProgressReporter<'_>,
        cancel: &CancelToken,
    ) -> VoxframeResult<VideoExport> {
        script.validate()?;
        self.config.validate()?;
        let declared = script.declared_duration();
        if let Some(content_id) = &script.content_id {
            tracing::debug!(content_id = %content_id, "script source");
        }
        cancel.check()?;

        self.advance(PipelineState::SynthesizingAudio)?;
        reporter.emit(ProgressReporter::SYNTHESIZING);
        let profile = self.muxer.negotiate()?;
        let text = self.config.caption_font()?;
        let inputs = self.gather_inputs(script, background.as_ref(), cancel)?;
        reporter.emit(ProgressReporter::AUDIO_READY);
        cancel.check()?;

        self.advance(PipelineState::Compositing)?;
        let mut compositor = FrameCompositor::new(
            self.config.canvas,
            self.config.fps,
            script,
            inputs.background.as_ref(),
            text,
        )?;
        let video = VideoSource {
            canvas: self.config.canvas,
            fps: self.config.fps,
            frames: compositor.frame_count(),
        };
        tracing::debug!(
            declared,
            audio_secs = inputs.audio.duration_secs(),
            frames = video.frames,
            "compositing"
        );

        let id = Uuid::new_v4();
        let stream = CombinedStream::new(video, inputs.audio)?;
        let mut recording = Recording::start(
            &mut self.muxer,
            RecordingRequest {
                stream,
                asset_name: asset_name(id),
                out_dir: self.config.out_dir.clone(),
                ledger: self.ledger.clone(),
            },
        )?;
        reporter.emit(ProgressReporter::COMPOSITING);

        let mut clock = FrameClock::new(self.config.fps, self.config.pacing);
        let summary = compositor.run(&mut clock, cancel, &mut |tick| {
            recording.push(tick.index, tick.frame)?;
            reporter.compositing(tick.completion);
            Ok(())
        })?;

        self.state = self.state.transition(PipelineState::Finalizing)?;
        tracing::info!(state = ?self.state, "pipeline state");
        reporter.emit(ProgressReporter::FINALIZING);
        cancel.check()?;
        let muxed = recording.stop(summary)?;

        Ok(export_for(id, script, muxed.asset, muxed.frames, profile, self.config.fps))
    }

    /// Synthesize speech while the background decodes on a scoped thread.
    fn gather_inputs(
        &mut self,
        script: &NarrationScript,
        background: Option<&BackgroundImage>,
        cancel: &CancelToken,
    ) -> VoxframeResult<Inputs> {
        let opts = self.config.speech.clone();
        let ledger = &self.ledger;
        let engine = &mut self.engine;

        let (audio, decoded) = std::thread::scope(|s| {
            let decode = background.map(|bg| s.spawn(move || decode_background(bg)));
            let audio = SpeechSynthesizer::new(engine, opts).synthesize(&script.text, ledger, cancel);
            let decoded = decode.map(|h| {
                h.join().unwrap_or_else(|_| {
                    Err(VoxframeError::resource_load("background decode thread panicked"))
                })
            });
            (audio, decoded)
        });

        cancel.check()?;
        let audio = audio?;
        let background = decoded.transpose()?;
        Ok(Inputs { audio, background })
    }
}

fn export_for(
    id: Uuid,
    script: &NarrationScript,
    asset: AssetRef,
    frames: u64,
    profile: MuxProfile,
    fps: crate::foundation::core::Fps,
) -> VideoExport {
    VideoExport {
        id,
        source_script_id: script.id.clone(),
        asset,
        duration_seconds: fps.frames_to_secs(frames),
        created_at: Utc::now(),
        mime_type: profile.mime_type.to_string(),
        extension: profile.extension,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/orchestrator.rs"]
mod tests;
