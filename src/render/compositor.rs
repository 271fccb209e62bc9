use std::sync::Arc;

use vello_cpu::kurbo::{Affine, Rect};
use vello_cpu::peniko::Color;

use crate::assets::decode::DecodedImage;
use crate::assets::text::{TextBrush, TextLayoutEngine};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::foundation::math::scale_ref;
use crate::pipeline::cancel::CancelToken;
use crate::render::caption::{FixedAdvanceMeasure, wrap_caption};
use crate::render::clock::FrameClock;
use crate::render::frame::FrameRGBA;
use crate::script::model::NarrationScript;
use crate::script::timeline::CaptionTimeline;

const REF_WIDTH: u32 = 1080;
const REF_HEIGHT: u32 = 1920;

const NEUTRAL_FILL: [u8; 3] = [0xf1, 0xf5, 0xf9];
const IMAGE_OVERLAY_ALPHA: f32 = 0.3;
const PANEL_ALPHA: f32 = 0.7;

/// Caption and readout placement for one canvas, scaled from the 1080x1920 reference layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Geometry {
    pub panel: Rect,
    pub text_center_x: f64,
    pub text_top: f64,
    pub line_height: f64,
    pub text_max_width: f32,
    pub caption_px: f32,
    pub readout_px: f32,
    pub readout_center_x: f64,
    pub readout_baseline: f64,
}

impl Geometry {
    pub(crate) fn for_canvas(canvas: Canvas) -> Self {
        let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
        let sx = |v: f64| scale_ref(v, canvas.width, REF_WIDTH);
        let sy = |v: f64| scale_ref(v, canvas.height, REF_HEIGHT);
        let panel_x = sx(40.0);
        let panel_y = h - sy(460.0);
        Self {
            panel: Rect::new(panel_x, panel_y, w - panel_x, panel_y + sy(300.0)),
            text_center_x: w / 2.0,
            text_top: h - sy(400.0),
            line_height: sy(80.0),
            text_max_width: (w - sx(160.0)) as f32,
            caption_px: sx(60.0) as f32,
            readout_px: sx(40.0) as f32,
            readout_center_x: w - sx(100.0),
            readout_baseline: sy(100.0),
        }
    }
}

/// One emitted frame in [`FrameCompositor::run`].
#[derive(Debug)]
pub struct FrameTick<'a> {
    pub index: FrameIndex,
    pub elapsed_secs: f64,
    /// Fraction of the declared duration covered once this frame is shown.
    pub completion: f64,
    pub frame: &'a FrameRGBA,
}

/// Result of a completed compositor run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeSummary {
    pub frames: u64,
    pub duration_secs: f64,
}

struct CaptionLine {
    text: String,
    layout: Option<parley::Layout<TextBrush>>,
}

struct Background {
    paint: vello_cpu::Image,
    width: f64,
    height: f64,
}

/// Draws the caption video frame by frame.
///
/// Owns its raster surface, caption cache and the missing-font warning flag, so independent
/// instances never share state.
pub struct FrameCompositor {
    canvas: Canvas,
    fps: Fps,
    geometry: Geometry,
    timeline: CaptionTimeline,
    captions: Vec<String>,
    wrapped: Vec<Option<Vec<CaptionLine>>>,
    readout: Option<(u64, Option<parley::Layout<TextBrush>>)>,
    background: Option<Background>,
    text: Option<TextLayoutEngine>,
    font: Option<vello_cpu::peniko::FontData>,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    frame: FrameRGBA,
    warned_missing_font: bool,
}

impl FrameCompositor {
    pub fn new(
        canvas: Canvas,
        fps: Fps,
        script: &NarrationScript,
        background: Option<&DecodedImage>,
        text: Option<TextLayoutEngine>,
    ) -> VoxframeResult<Self> {
        canvas.validate()?;
        let timeline = CaptionTimeline::new(script)?;
        let (w, h) = (canvas.width as u16, canvas.height as u16);

        let background = background.map(background_paint).transpose()?;
        let font = text.as_ref().map(|t| {
            vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(t.font_bytes().as_ref().clone()),
                t.font_index(),
            )
        });

        Ok(Self {
            canvas,
            fps,
            geometry: Geometry::for_canvas(canvas),
            timeline,
            captions: script.sections.iter().map(|s| s.text.clone()).collect(),
            wrapped: script.sections.iter().map(|_| None).collect(),
            readout: None,
            background,
            text,
            font,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            frame: FrameRGBA::new(canvas.width, canvas.height),
            warned_missing_font: false,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn timeline(&self) -> &CaptionTimeline {
        &self.timeline
    }

    /// Frames needed to cover the declared duration; never zero.
    pub fn frame_count(&self) -> u64 {
        self.fps.secs_to_frames_ceil(self.timeline.total()).max(1)
    }

    /// Wrapped caption lines for section `idx`.
    pub fn caption_lines(&mut self, idx: usize) -> VoxframeResult<Vec<String>> {
        self.ensure_wrapped(idx)?;
        Ok(self
            .wrapped
            .get(idx)
            .and_then(|l| l.as_ref())
            .map(|lines| lines.iter().map(|l| l.text.clone()).collect())
            .unwrap_or_default())
    }

    fn ensure_wrapped(&mut self, idx: usize) -> VoxframeResult<()> {
        let Some(slot) = self.wrapped.get_mut(idx) else {
            return Err(VoxframeError::validation(format!(
                "caption index {idx} out of range"
            )));
        };
        if slot.is_some() {
            return Ok(());
        }

        let g = self.geometry;
        let text = &self.captions[idx];
        let lines = match self.text.as_mut() {
            Some(engine) => {
                let wrapped = wrap_caption(text, g.text_max_width, g.caption_px, &mut *engine)?;
                wrapped
                    .into_iter()
                    .map(|line| {
                        let layout = engine.layout_line(&line, g.caption_px, TextBrush::WHITE)?;
                        Ok(CaptionLine {
                            text: line,
                            layout: Some(layout),
                        })
                    })
                    .collect::<VoxframeResult<Vec<_>>>()?
            }
            None => wrap_caption(
                text,
                g.text_max_width,
                g.caption_px,
                &mut FixedAdvanceMeasure,
            )?
            .into_iter()
            .map(|line| CaptionLine {
                text: line,
                layout: None,
            })
            .collect(),
        };
        *slot = Some(lines);
        Ok(())
    }

    fn ensure_readout(&mut self, secs: u64) -> VoxframeResult<()> {
        if matches!(self.readout, Some((cached, _)) if cached == secs) {
            return Ok(());
        }
        let layout = match self.text.as_mut() {
            Some(engine) => Some(engine.layout_line(
                &format!("{secs}s"),
                self.geometry.readout_px,
                TextBrush::WHITE,
            )?),
            None => None,
        };
        self.readout = Some((secs, layout));
        Ok(())
    }

    /// Render the frame shown `elapsed_secs` after the start.
    pub fn render_at(&mut self, elapsed_secs: f64) -> VoxframeResult<&FrameRGBA> {
        let elapsed = if elapsed_secs.is_finite() {
            elapsed_secs.max(0.0)
        } else {
            0.0
        };
        let section = self.timeline.active_section(elapsed);
        self.ensure_wrapped(section)?;
        let secs = elapsed.floor() as u64;
        self.ensure_readout(secs)?;

        if self.font.is_none() && !self.warned_missing_font {
            tracing::warn!("no caption font; captions are laid out but not drawn");
            self.warned_missing_font = true;
        }

        let g = self.geometry;
        let (w, h) = (f64::from(self.canvas.width), f64::from(self.canvas.height));
        let ctx = &mut self.ctx;
        ctx.reset();
        ctx.set_paint_transform(Affine::IDENTITY);

        ctx.set_transform(Affine::IDENTITY);
        ctx.set_paint(Color::from_rgba8(
            NEUTRAL_FILL[0],
            NEUTRAL_FILL[1],
            NEUTRAL_FILL[2],
            255,
        ));
        ctx.fill_rect(&Rect::new(0.0, 0.0, w, h));

        if let Some(bg) = &self.background {
            let scale = (w / bg.width).max(h / bg.height);
            let x = (w - bg.width * scale) / 2.0;
            let y = (h - bg.height * scale) / 2.0;
            ctx.set_transform(Affine::translate((x, y)) * Affine::scale(scale));
            ctx.set_paint(bg.paint.clone());
            ctx.fill_rect(&Rect::new(0.0, 0.0, bg.width, bg.height));

            ctx.set_transform(Affine::IDENTITY);
            ctx.set_paint(Color::from_rgba8(0, 0, 0, alpha_u8(IMAGE_OVERLAY_ALPHA)));
            ctx.fill_rect(&Rect::new(0.0, 0.0, w, h));
        }

        ctx.set_transform(Affine::IDENTITY);
        ctx.set_paint(Color::from_rgba8(0, 0, 0, alpha_u8(PANEL_ALPHA)));
        ctx.fill_rect(&g.panel);

        if let Some(font) = &self.font {
            if let Some(Some(lines)) = self.wrapped.get(section) {
                for (i, line) in lines.iter().enumerate() {
                    let Some(layout) = &line.layout else {
                        continue;
                    };
                    let x = g.text_center_x - f64::from(layout.width()) / 2.0;
                    let y = g.text_top + g.line_height * i as f64;
                    fill_layout(ctx, font, layout, x, y);
                }
            }
            if let Some((_, Some(layout))) = &self.readout {
                let baseline = layout
                    .lines()
                    .next()
                    .map(|l| f64::from(l.metrics().baseline))
                    .unwrap_or(0.0);
                let x = g.readout_center_x - f64::from(layout.width()) / 2.0;
                fill_layout(ctx, font, layout, x, g.readout_baseline - baseline);
            }
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        self.frame
            .data
            .copy_from_slice(self.pixmap.data_as_u8_slice());
        Ok(&self.frame)
    }

    /// Emit frames until the declared duration is reached.
    ///
    /// The loop is the only thing that ends a run; the token is checked before every frame.
    pub fn run(
        &mut self,
        clock: &mut FrameClock,
        cancel: &CancelToken,
        on_frame: &mut dyn FnMut(FrameTick<'_>) -> VoxframeResult<()>,
    ) -> VoxframeResult<CompositeSummary> {
        let total = self.frame_count();
        for i in 0..total {
            cancel.check()?;
            let index = FrameIndex(i);
            clock.wait_for(index);
            let elapsed_secs = clock.elapsed_secs(index);
            let frame = self.render_at(elapsed_secs)?;
            on_frame(FrameTick {
                index,
                elapsed_secs,
                completion: (i + 1) as f64 / total as f64,
                frame,
            })?;
        }
        let summary = CompositeSummary {
            frames: total,
            duration_secs: self.fps.frames_to_secs(total),
        };
        tracing::debug!(frames = summary.frames, secs = summary.duration_secs, "compositor done");
        Ok(summary)
    }
}

fn alpha_u8(a: f32) -> u8 {
    (a.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn fill_layout(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    layout: &parley::Layout<TextBrush>,
    x: f64,
    y: f64,
) {
    ctx.set_transform(Affine::translate((x, y)));
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(Color::from_rgba8(brush.r, brush.g, brush.b, brush.a));
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

fn background_paint(img: &DecodedImage) -> VoxframeResult<Background> {
    let w: u16 = img
        .width
        .try_into()
        .map_err(|_| VoxframeError::resource_load("background width exceeds u16"))?;
    let h: u16 = img
        .height
        .try_into()
        .map_err(|_| VoxframeError::resource_load("background height exceeds u16"))?;
    if img.rgba8_premul.len() != img.width as usize * img.height as usize * 4 {
        return Err(VoxframeError::resource_load(
            "decoded background byte length mismatch",
        ));
    }

    let mut may_have_opacities = false;
    let pixels = img
        .rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect::<Vec<_>>();
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);

    Ok(Background {
        paint: vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        },
        width: f64::from(img.width),
        height: f64::from(img.height),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
