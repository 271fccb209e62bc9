use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::speech::engine::{PcmChunk, SpeechEngine, Utterance, UtteranceEvent, Voice};
use std::io::{BufReader, Read, Write};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

const CHUNK_FRAMES: usize = 2048;
const NORMAL_WPM: f32 = 175.0;
const NORMAL_PITCH: f32 = 50.0;

/// Speech engine backed by the system `espeak-ng` binary.
///
/// Audio is read from the WAV stream `espeak-ng --stdout` writes while it speaks, so chunks reach
/// the capture as they are produced.
pub struct EspeakEngine {
    program: PathBuf,
    voices: Option<Vec<Voice>>,
}

impl Default for EspeakEngine {
    fn default() -> Self {
        Self::new("espeak-ng")
    }
}

impl EspeakEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            voices: None,
        }
    }
}

impl SpeechEngine for EspeakEngine {
    fn name(&self) -> &str {
        "espeak-ng"
    }

    fn is_available(&mut self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn voices(&mut self) -> VoxframeResult<Vec<Voice>> {
        if let Some(v) = &self.voices {
            return Ok(v.clone());
        }
        let out = Command::new(&self.program)
            .arg("--voices")
            .stderr(Stdio::null())
            .output()
            .map_err(|e| {
                VoxframeError::unsupported(format!(
                    "failed to run '{} --voices': {e}",
                    self.program.display()
                ))
            })?;
        if !out.status.success() {
            return Err(VoxframeError::unsupported(format!(
                "'{} --voices' exited with status {}",
                self.program.display(),
                out.status
            )));
        }
        let voices = parse_voice_list(&String::from_utf8_lossy(&out.stdout));
        self.voices = Some(voices.clone());
        Ok(voices)
    }

    fn speak(
        &mut self,
        utterance: &Utterance,
        on_event: &mut dyn FnMut(UtteranceEvent) -> ControlFlow<()>,
    ) -> VoxframeResult<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(speak_args(utterance))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            VoxframeError::unsupported(format!(
                "failed to spawn '{}' (is it installed and on PATH?): {e}",
                self.program.display()
            ))
        })?;
        let pipes = (child.stdin.take(), child.stdout.take(), child.stderr.take());
        let guard = ChildGuard(Some(child));
        let (Some(mut stdin), Some(stdout), Some(mut stderr)) = pipes else {
            return Err(VoxframeError::synthesis(
                "failed to open espeak-ng stdio pipes (unexpected)",
            ));
        };

        let text = utterance.text.clone();
        let stdin_feed = std::thread::spawn(move || stdin.write_all(text.as_bytes()));
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok::<_, std::io::Error>(bytes)
        });

        let flow = match stream_wav(BufReader::new(stdout), on_event) {
            Ok(flow) => flow,
            Err(e) => {
                drop(guard);
                let _ = on_event(UtteranceEvent::Error(e.to_string()));
                return Ok(());
            }
        };
        if flow.is_break() {
            // Dropping the guard kills the process.
            return Ok(());
        }

        let Some(mut child) = guard.release() else {
            return Err(VoxframeError::synthesis("espeak-ng process handle lost"));
        };
        let status = child
            .wait()
            .map_err(|e| VoxframeError::synthesis(format!("failed to wait for espeak-ng: {e}")))?;
        let fed = stdin_feed
            .join()
            .map_err(|_| VoxframeError::synthesis("espeak-ng stdin feed thread panicked"))?;
        let stderr_bytes = stderr_drain
            .join()
            .map_err(|_| VoxframeError::synthesis("espeak-ng stderr drain thread panicked"))?
            .unwrap_or_default();

        if !status.success() {
            let detail = String::from_utf8_lossy(&stderr_bytes);
            let _ = on_event(UtteranceEvent::Error(format!(
                "espeak-ng exited with status {status}: {}",
                detail.trim()
            )));
            return Ok(());
        }
        if let Err(e) = fed {
            let _ = on_event(UtteranceEvent::Error(format!(
                "failed to write text to espeak-ng: {e}"
            )));
            return Ok(());
        }

        let _ = on_event(UtteranceEvent::End);
        Ok(())
    }
}

/// Kills the child on drop unless released.
struct ChildGuard(Option<Child>);

impl ChildGuard {
    fn release(mut self) -> Option<Child> {
        self.0.take()
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.0.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Read a WAV stream incrementally and forward fixed-size chunks.
///
/// A stream that ends before its declared length (espeak-ng writes a placeholder length when the
/// output is a pipe) is treated as complete.
fn stream_wav<R: Read>(
    reader: R,
    on_event: &mut dyn FnMut(UtteranceEvent) -> ControlFlow<()>,
) -> VoxframeResult<ControlFlow<()>> {
    let mut wav = hound::WavReader::new(reader)
        .map_err(|e| VoxframeError::synthesis(format!("invalid WAV stream from engine: {e}")))?;
    let spec = wav.spec();
    let channels = spec.channels;
    let sample_rate = spec.sample_rate;
    let chunk_len = CHUNK_FRAMES * usize::from(channels.max(1));

    let mut buf = Vec::<f32>::with_capacity(chunk_len);
    let mut emit = |buf: &mut Vec<f32>| -> ControlFlow<()> {
        if buf.is_empty() {
            return ControlFlow::Continue(());
        }
        on_event(UtteranceEvent::Audio(PcmChunk {
            sample_rate,
            channels,
            samples: std::mem::take(buf),
        }))
    };

    match spec.sample_format {
        hound::SampleFormat::Float => {
            for s in wav.samples::<f32>() {
                match s {
                    Ok(v) => buf.push(v),
                    Err(e) if is_truncated_stream(&e) => break,
                    Err(e) => {
                        return Err(VoxframeError::synthesis(format!("WAV decode failed: {e}")));
                    }
                }
                if buf.len() >= chunk_len && emit(&mut buf).is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }
        }
        hound::SampleFormat::Int => {
            let scale = 1.0f32 / (1u64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            for s in wav.samples::<i32>() {
                match s {
                    Ok(v) => buf.push(v as f32 * scale),
                    Err(e) if is_truncated_stream(&e) => break,
                    Err(e) => {
                        return Err(VoxframeError::synthesis(format!("WAV decode failed: {e}")));
                    }
                }
                if buf.len() >= chunk_len && emit(&mut buf).is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }
        }
    }

    if buf.len() % usize::from(channels.max(1)) != 0 {
        let whole = buf.len() - buf.len() % usize::from(channels.max(1));
        buf.truncate(whole);
    }
    Ok(emit(&mut buf))
}

fn is_truncated_stream(e: &hound::Error) -> bool {
    matches!(e, hound::Error::IoError(io) if io.kind() == std::io::ErrorKind::UnexpectedEof)
}

/// Command line for one utterance. `-v` is passed only for an explicit voice so that
/// espeak-ng otherwise speaks with its own default.
pub(crate) fn speak_args(utterance: &Utterance) -> Vec<String> {
    let mut args = vec![
        "--stdout".to_string(),
        "--stdin".to_string(),
        "-s".to_string(),
        rate_to_wpm(utterance.rate).to_string(),
        "-p".to_string(),
        pitch_to_espeak(utterance.pitch).to_string(),
    ];
    if let Some(voice) = &utterance.voice {
        args.push("-v".to_string());
        args.push(voice.id.clone());
    }
    args
}

/// Map a rate multiplier to espeak-ng words-per-minute.
pub(crate) fn rate_to_wpm(rate: f32) -> u32 {
    (NORMAL_WPM * rate).round().clamp(80.0, 450.0) as u32
}

/// Map a pitch multiplier to espeak-ng's 0..=99 pitch scale.
pub(crate) fn pitch_to_espeak(pitch: f32) -> u32 {
    (NORMAL_PITCH * pitch).round().clamp(0.0, 99.0) as u32
}

/// Parse `espeak-ng --voices` output.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  cmn             --/M      Chinese_(Mandarin) sit/cmn              (zh-cmn 5)(zh 5)
/// ```
pub(crate) fn parse_voice_list(out: &str) -> Vec<Voice> {
    let mut voices = Vec::new();
    for line in out.lines().skip(1) {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 5 {
            continue;
        }
        let language = cols[1];
        let name = cols[3].replace('_', " ");
        let aliases: Vec<String> = cols[5..]
            .join(" ")
            .split('(')
            .filter_map(|part| part.split_whitespace().next())
            .map(|tag| tag.trim_end_matches(')').to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        voices.push(Voice::new(language, name, language).with_aliases(aliases));
    }
    voices
}

#[cfg(test)]
#[path = "../../tests/unit/speech/espeak.rs"]
mod tests;
