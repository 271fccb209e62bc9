use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use voxframe::{
    BackgroundImage, CancelToken, EspeakEngine, FfmpegMuxer, FrameCompositor, InMemoryMuxer,
    NarrationScript, PipelineConfig, SpeechEngine, StreamMuxer, SynthesisOrchestrator,
    decode_background,
};

#[derive(Parser, Debug)]
#[command(name = "voxframe", version)]
struct Cli {
    /// espeak-ng binary used for speech.
    #[arg(long, global = true, default_value = "espeak-ng")]
    espeak: PathBuf,

    /// ffmpeg binary used for muxing.
    #[arg(long, global = true, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize a narrated caption video (requires `espeak-ng` and `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Run the pipeline without encoding and print the frame manifest.
    Preview(PreviewArgs),
    /// Render a single compositor frame as a PNG.
    Frame(FrameArgs),
    /// List speech engine voices.
    Voices,
    /// Report speech engine availability and the negotiated mux profile.
    Check,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Narration script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Background image file.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Declared mime type of the background image (guessed from the extension if omitted).
    #[arg(long, requires = "image")]
    mime: Option<String>,

    /// Pipeline config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Caption font (TTF/OTF); overrides the config.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Draw background and progress bar only, without captions.
    #[arg(long, conflicts_with = "font")]
    no_text: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output directory; overrides the config.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Write the manifest JSON here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Elapsed time of the frame, in seconds.
    #[arg(long)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(ref args) => cmd_render(&cli, args),
        Command::Preview(ref args) => cmd_preview(&cli, args),
        Command::Frame(ref args) => cmd_frame(args),
        Command::Voices => cmd_voices(&cli),
        Command::Check => cmd_check(&cli),
    }
}

fn load_config(input: &InputArgs) -> anyhow::Result<PipelineConfig> {
    let mut cfg = match &input.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(font) = &input.font {
        cfg.font_path = Some(font.clone());
    }
    if input.no_text {
        cfg.draw_text = false;
    }
    Ok(cfg)
}

fn load_background(input: &InputArgs) -> anyhow::Result<Option<BackgroundImage>> {
    let Some(path) = &input.image else {
        return Ok(None);
    };
    let mime = match &input.mime {
        Some(m) => m.clone(),
        None => path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(BackgroundImage::mime_for_extension)
            .map(str::to_string)
            .with_context(|| {
                format!(
                    "cannot guess mime type of '{}'; pass --mime",
                    path.display()
                )
            })?,
    };
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    Ok(Some(BackgroundImage::new(bytes, mime)))
}

fn print_progress(p: f64) {
    eprint!("\rprogress: {p:5.1}%");
    if p >= 100.0 {
        eprintln!();
    }
}

fn cmd_render(cli: &Cli, args: &RenderArgs) -> anyhow::Result<()> {
    let script = NarrationScript::from_path(&args.input.script)?;
    let mut cfg = load_config(&args.input)?;
    if let Some(dir) = &args.out_dir {
        cfg.out_dir = dir.clone();
    }
    let background = load_background(&args.input)?;

    let engine = EspeakEngine::new(&cli.espeak);
    let muxer = FfmpegMuxer::with_program(&cli.ffmpeg);
    let mut orch = SynthesisOrchestrator::new(engine, muxer, cfg);

    let result = orch.synthesize(&script, background, &mut print_progress, &CancelToken::new());
    let export = match result {
        Ok(export) => export,
        Err(e) => {
            eprintln!();
            return Err(e.into());
        }
    };

    if let Some(path) = export.asset.path() {
        println!("{}", path.display());
    }
    eprintln!(
        "export {} ({:.2}s, {})",
        export.id, export.duration_seconds, export.mime_type
    );
    Ok(())
}

fn cmd_preview(cli: &Cli, args: &PreviewArgs) -> anyhow::Result<()> {
    let script = NarrationScript::from_path(&args.input.script)?;
    let cfg = load_config(&args.input)?;
    let background = load_background(&args.input)?;

    let mut orch =
        SynthesisOrchestrator::new(EspeakEngine::new(&cli.espeak), InMemoryMuxer::new(), cfg);
    let export = orch.synthesize(&script, background, &mut print_progress, &CancelToken::new())?;
    let bytes = export.asset.read_bytes()?;

    match &args.out {
        Some(path) => {
            write_file(path, &bytes)?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{}", String::from_utf8_lossy(&bytes)),
    }
    Ok(())
}

fn cmd_frame(args: &FrameArgs) -> anyhow::Result<()> {
    let script = NarrationScript::from_path(&args.input.script)?;
    script.validate()?;
    let cfg = load_config(&args.input)?;
    let background = load_background(&args.input)?
        .map(|bg| decode_background(&bg))
        .transpose()?;
    let text = cfg.caption_font()?;

    let mut compositor =
        FrameCompositor::new(cfg.canvas, cfg.fps, &script, background.as_ref(), text)?;
    let frame = compositor.render_at(args.at)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_voices(cli: &Cli) -> anyhow::Result<()> {
    let mut engine = EspeakEngine::new(&cli.espeak);
    if !engine.is_available() {
        anyhow::bail!("'{}' is not available", cli.espeak.display());
    }
    for v in engine.voices()? {
        if v.aliases.is_empty() {
            println!("{:<12} {}", v.id, v.name);
        } else {
            println!("{:<12} {} ({})", v.id, v.name, v.aliases.join(", "));
        }
    }
    Ok(())
}

fn cmd_check(cli: &Cli) -> anyhow::Result<()> {
    let mut engine = EspeakEngine::new(&cli.espeak);
    let speech_ok = engine.is_available();
    println!(
        "speech:  {} ({})",
        if speech_ok { "ok" } else { "missing" },
        cli.espeak.display()
    );

    let mut muxer = FfmpegMuxer::with_program(&cli.ffmpeg);
    let mux_ok = match muxer.negotiate() {
        Ok(profile) => {
            println!("muxer:   ok ({})", profile.mime_type);
            true
        }
        Err(e) => {
            println!("muxer:   {e}");
            false
        }
    };

    if !(speech_ok && mux_ok) {
        anyhow::bail!("host is missing required capabilities");
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))
}
