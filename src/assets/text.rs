use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{VoxframeError, VoxframeResult};

/// Installed families tried, in order, when no caption font is configured.
const SYSTEM_CAPTION_FAMILIES: &[&str] = &[
    "Noto Sans CJK SC",
    "Noto Sans SC",
    "Source Han Sans SC",
    "Source Han Sans CN",
    "WenQuanYi Zen Hei",
    "WenQuanYi Micro Hei",
    "Droid Sans Fallback",
    "PingFang SC",
    "Microsoft YaHei",
    "Noto Sans",
    "DejaVu Sans",
    "Liberation Sans",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrush {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl TextBrush {
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };
}

/// Parley layout state bound to one caption font.
///
/// The font is registered once; every layout call reuses the same contexts.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    family_name: String,
    font_bytes: Arc<Vec<u8>>,
    font_index: u32,
}

impl std::fmt::Debug for TextLayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLayoutEngine")
            .field("family_name", &self.family_name)
            .field("font_bytes_len", &self.font_bytes.len())
            .field("font_index", &self.font_index)
            .finish()
    }
}

impl TextLayoutEngine {
    /// Load a TTF/OTF file and register it.
    pub fn from_font_path(path: &Path) -> VoxframeResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read font file '{}'", path.display()))?;
        Self::from_font_bytes(bytes)
    }

    pub fn from_font_bytes(bytes: Vec<u8>) -> VoxframeResult<Self> {
        Self::from_font_face(bytes, 0)
    }

    /// Register font bytes and lay captions out with face `index` (non-zero for TTC collections).
    pub fn from_font_face(bytes: Vec<u8>, index: u32) -> VoxframeResult<Self> {
        let font_bytes = Arc::new(bytes);
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .iter()
            .find(|(_, fonts)| fonts.iter().any(|f| f.index() == index))
            .or_else(|| families.first())
            .map(|(id, _)| *id)
            .ok_or_else(|| {
                VoxframeError::validation("no font families registered from font bytes")
            })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| VoxframeError::validation("registered font family has no name"))?
            .to_string();
        tracing::debug!(family = %family_name, index, "caption font registered");

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font_bytes,
            font_index: index,
        })
    }

    /// Pick a caption font from the fonts installed on this host.
    ///
    /// CJK families come first, then common sans-serif families, then any face at all. `None`
    /// when the host has no loadable fonts.
    pub fn from_system_fonts() -> Option<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        let mut families: Vec<fontdb::Family<'_>> = SYSTEM_CAPTION_FAMILIES
            .iter()
            .map(|&name| fontdb::Family::Name(name))
            .collect();
        families.push(fontdb::Family::SansSerif);
        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight::BOLD,
            ..fontdb::Query::default()
        };

        let id = db.query(&query).or_else(|| {
            db.faces()
                .find(|face| face.families.iter().any(|(name, _)| name.contains("Sans")))
                .or_else(|| db.faces().next())
                .map(|face| face.id)
        })?;
        let (bytes, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;

        match Self::from_font_face(bytes, index) {
            Ok(engine) => {
                tracing::info!(family = %engine.family_name, "using system caption font");
                Some(engine)
            }
            Err(e) => {
                tracing::warn!(error = %e, "system font could not be registered");
                None
            }
        }
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Raw font bytes, needed to build glyph runs at draw time.
    pub fn font_bytes(&self) -> Arc<Vec<u8>> {
        self.font_bytes.clone()
    }

    /// Face index inside [`TextLayoutEngine::font_bytes`].
    pub fn font_index(&self) -> u32 {
        self.font_index
    }

    /// Shape `text` as one unbroken line.
    pub fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrush,
    ) -> VoxframeResult<parley::Layout<TextBrush>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(VoxframeError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::BOLD,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        layout.align(
            None,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );
        Ok(layout)
    }

    /// Single-line advance width of `text` in pixels.
    pub fn measure_width(&mut self, text: &str, size_px: f32) -> VoxframeResult<f32> {
        if text.is_empty() {
            return Ok(0.0);
        }
        Ok(self.layout_line(text, size_px, TextBrush::WHITE)?.width())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;
