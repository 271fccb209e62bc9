use std::collections::HashSet;
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use anyhow::Context;

use crate::encode::muxer::{
    AssetRef, Container, MuxProfile, MuxedAsset, RecordingRequest, StreamMuxer,
};
use crate::foundation::core::{Canvas, FrameIndex};
use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::foundation::math::mul_div255_u16;
use crate::pipeline::resources::{ResourceGuard, ResourceKind};
use crate::render::frame::FrameRGBA;

/// Opaque color that translucent frame pixels are flattened onto before encoding.
const FLATTEN_BG: [u8; 4] = [0, 0, 0, 255];

/// Muxer backed by the system `ffmpeg` binary.
///
/// Frames are streamed as raw RGBA on stdin; the narration track is written to a temporary
/// `f32le` file first. Output goes to a temp file in the request's `out_dir` and is renamed into
/// place only when ffmpeg exits cleanly.
pub struct FfmpegMuxer {
    program: PathBuf,
    profile: Option<MuxProfile>,
    session: Option<FfmpegSession>,
}

struct FfmpegSession {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<Vec<u8>>>,
    canvas: Canvas,
    scratch: Vec<u8>,
    next: u64,
    profile: MuxProfile,
    final_path: PathBuf,
    // Both temp paths delete their file on drop.
    audio_tmp: tempfile::TempPath,
    output_tmp: tempfile::TempPath,
    _guards: [ResourceGuard; 2],
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegMuxer {
    pub fn new() -> Self {
        Self::with_program("ffmpeg")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            profile: None,
            session: None,
        }
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn list_encoders(&self) -> VoxframeResult<HashSet<String>> {
        let out = Command::new(&self.program)
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| {
                VoxframeError::unsupported(format!(
                    "ffmpeg is required for encoding, but '{}' could not be run: {e}",
                    self.program.display()
                ))
            })?;
        if !out.status.success() {
            return Err(VoxframeError::unsupported(format!(
                "'{} -encoders' exited with status {}",
                self.program.display(),
                out.status
            )));
        }
        Ok(parse_encoder_list(&String::from_utf8_lossy(&out.stdout)))
    }

    fn spawn(&self, request: &RecordingRequest, profile: MuxProfile) -> VoxframeResult<FfmpegSession> {
        let video = *request.stream.video();
        let audio = request.stream.audio();

        let out_dir = &request.out_dir;
        std::fs::create_dir_all(out_dir).with_context(|| {
            format!("failed to create output directory '{}'", out_dir.display())
        })?;

        let audio_guard = request.ledger.acquire(ResourceKind::TempHandle);
        let audio_tmp = write_f32le_temp(&audio.samples).map_err(|e| {
            VoxframeError::capture(format!("failed to stage narration audio: {e:#}"))
        })?;

        let output_guard = request.ledger.acquire(ResourceKind::TempHandle);
        let output_tmp = tempfile::Builder::new()
            .prefix(".voxframe_")
            .suffix(&format!(".{}", profile.extension))
            .tempfile_in(out_dir)
            .map_err(|e| VoxframeError::capture(format!("failed to create output file: {e}")))?
            .into_temp_path();

        let final_path = out_dir.join(format!("{}.{}", request.asset_name, profile.extension));

        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args(encode_args(
            video.canvas,
            video.fps.num,
            video.fps.den,
            audio.sample_rate,
            audio.channels,
            &audio_tmp,
            profile,
        ))
        .arg(&*output_tmp);
        tracing::debug!(?cmd, "spawning ffmpeg");

        let mut child = cmd.spawn().map_err(|e| {
            VoxframeError::unsupported(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child.stdin.take();
        let stderr = child.stderr.take();
        let (Some(stdin), Some(mut stderr)) = (stdin, stderr) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(VoxframeError::capture(
                "failed to open ffmpeg stdio pipes (unexpected)",
            ));
        };
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            let _ = stderr.read_to_end(&mut bytes);
            bytes
        });

        Ok(FfmpegSession {
            child,
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
            canvas: video.canvas,
            scratch: vec![0u8; video.canvas.frame_len_bytes()],
            next: 0,
            profile,
            final_path,
            audio_tmp,
            output_tmp,
            _guards: [audio_guard, output_guard],
        })
    }
}

impl StreamMuxer for FfmpegMuxer {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn negotiate(&mut self) -> VoxframeResult<MuxProfile> {
        let encoders = self.list_encoders()?;
        let profile = MuxProfile::choose(|name| encoders.contains(name)).ok_or_else(|| {
            VoxframeError::encoding_unsupported(format!(
                "no supported encoder pair found (wanted {})",
                MuxProfile::PREFERENCE
                    .iter()
                    .map(|p| format!("{}+{}", p.video_encoder, p.audio_encoder))
                    .collect::<Vec<_>>()
                    .join(" or ")
            ))
        })?;
        tracing::debug!(mime = profile.mime_type, "negotiated mux profile");
        self.profile = Some(profile);
        Ok(profile)
    }

    fn begin(&mut self, request: RecordingRequest) -> VoxframeResult<()> {
        let Some(profile) = self.profile else {
            return Err(VoxframeError::validation("muxer begin called before negotiate"));
        };
        if self.session.is_some() {
            return Err(VoxframeError::validation("muxer is already recording"));
        }
        self.session = Some(self.spawn(&request, profile)?);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> VoxframeResult<()> {
        let result = match self.session.as_mut() {
            Some(session) => session.write_frame(idx, frame, FLATTEN_BG),
            None => Err(VoxframeError::capture("frame pushed with no active recording")),
        };
        if result.is_err() {
            self.abort();
        }
        result
    }

    fn finish(&mut self) -> VoxframeResult<MuxedAsset> {
        let Some(session) = self.session.take() else {
            return Err(VoxframeError::capture("finish called with no active recording"));
        };
        session.finish()
    }

    fn abort(&mut self) {
        if let Some(mut session) = self.session.take() {
            drop(session.stdin.take());
            let _ = session.child.kill();
            let _ = session.child.wait();
            if let Some(h) = session.stderr_drain.take() {
                let _ = h.join();
            }
            tracing::debug!(frames = session.next, "ffmpeg recording aborted");
        }
    }
}

impl Drop for FfmpegMuxer {
    fn drop(&mut self) {
        self.abort();
    }
}

impl FfmpegSession {
    fn write_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA, bg: [u8; 4]) -> VoxframeResult<()> {
        if frame.width != self.canvas.width || frame.height != self.canvas.height {
            return Err(VoxframeError::capture(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.canvas.width, self.canvas.height
            )));
        }
        if idx.0 != self.next {
            return Err(VoxframeError::capture(format!(
                "frame {} pushed out of order (expected {})",
                idx.0, self.next
            )));
        }
        flatten_to_opaque_rgba8(&mut self.scratch, &frame.data, frame.premultiplied, bg)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(VoxframeError::capture("ffmpeg stdin is already closed"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            VoxframeError::capture(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.next += 1;
        Ok(())
    }

    fn finish(mut self) -> VoxframeResult<MuxedAsset> {
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| VoxframeError::capture(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr = self
            .stderr_drain
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        if !status.success() {
            return Err(VoxframeError::capture(format!(
                "ffmpeg exited with status {status}: {}",
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        let FfmpegSession {
            output_tmp,
            final_path,
            profile,
            next,
            audio_tmp,
            ..
        } = self;
        drop(audio_tmp);
        output_tmp.persist(&final_path).map_err(|e| {
            VoxframeError::capture(format!(
                "failed to move encoded asset to '{}': {}",
                final_path.display(),
                e.error
            ))
        })?;
        tracing::info!(path = %final_path.display(), frames = next, "asset written");

        Ok(MuxedAsset {
            asset: AssetRef::File(final_path),
            profile,
            frames: next,
        })
    }
}

fn encode_args(
    canvas: Canvas,
    fps_num: u32,
    fps_den: u32,
    sample_rate: u32,
    channels: u16,
    audio_path: &Path,
    profile: MuxProfile,
) -> Vec<OsString> {
    let size = format!("{}x{}", canvas.width, canvas.height);
    let rate = format!("{fps_num}/{fps_den}");
    let ar = sample_rate.to_string();
    let ac = channels.to_string();

    let mut args: Vec<OsString> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-y",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
        size.as_str(),
        "-r",
        rate.as_str(),
        "-i",
        "pipe:0",
        "-f",
        "f32le",
        "-ar",
        ar.as_str(),
        "-ac",
        ac.as_str(),
        "-i",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(audio_path.as_os_str().to_owned());

    // Pad the narration with silence and let the frame stream decide where the asset ends.
    args.extend(
        [
            "-map",
            "0:v:0",
            "-map",
            "1:a:0",
            "-af",
            "apad",
            "-shortest",
            "-c:v",
            profile.video_encoder,
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            profile.audio_encoder,
            "-ar",
            "48000",
            "-b:a",
            "128k",
        ]
        .into_iter()
        .map(OsString::from),
    );
    let container_args: &[&str] = match profile.container {
        Container::WebM => &["-b:v", "2M", "-f", "webm"],
        Container::Mp4 => &["-movflags", "+faststart", "-f", "mp4"],
    };
    args.extend(container_args.iter().copied().map(OsString::from));
    args
}

fn write_f32le_temp(samples: &[f32]) -> anyhow::Result<tempfile::TempPath> {
    let mut file = tempfile::Builder::new()
        .prefix("voxframe_audio_")
        .suffix(".f32le")
        .tempfile()
        .context("create temp audio file")?;
    let mut bytes = Vec::<u8>::with_capacity(samples.len() * 4);
    for &sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    file.write_all(&bytes).context("write temp audio file")?;
    file.flush().context("flush temp audio file")?;
    Ok(file.into_temp_path())
}

/// Parse `ffmpeg -encoders` output into the set of encoder names.
///
/// ```text
///  V....D libvpx               libvpx VP8 (codec vp8)
///  A....D libopus              libopus Opus (codec opus)
/// ```
pub(crate) fn parse_encoder_list(out: &str) -> HashSet<String> {
    out.lines()
        .skip_while(|l| !l.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|l| {
            let mut cols = l.split_whitespace();
            let flags = cols.next()?;
            let name = cols.next()?;
            (flags.len() == 6).then(|| name.to_string())
        })
        .collect()
}

fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg_rgba: [u8; 4],
) -> VoxframeResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(VoxframeError::capture(
            "frame data length does not match the recording canvas",
        ));
    }

    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let fg = if src_is_premul {
                u16::from(s[c])
            } else {
                mul_div255_u16(u16::from(s[c]), a)
            };
            d[c] = (fg + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
