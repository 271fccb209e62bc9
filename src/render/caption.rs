use crate::assets::text::TextLayoutEngine;
use crate::foundation::error::{VoxframeError, VoxframeResult};

/// Width of a caption fragment in pixels.
pub trait TextMeasure {
    fn measure(&mut self, text: &str, size_px: f32) -> VoxframeResult<f32>;
}

impl TextMeasure for TextLayoutEngine {
    fn measure(&mut self, text: &str, size_px: f32) -> VoxframeResult<f32> {
        self.measure_width(text, size_px)
    }
}

/// Font-free measurement: wide characters advance one em, everything else 0.55 em.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedAdvanceMeasure;

impl FixedAdvanceMeasure {
    const WIDE_EM: f32 = 1.0;
    const NARROW_EM: f32 = 0.55;
}

impl TextMeasure for FixedAdvanceMeasure {
    fn measure(&mut self, text: &str, size_px: f32) -> VoxframeResult<f32> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(VoxframeError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let ems: f32 = text
            .chars()
            .map(|c| if is_wide(c) { Self::WIDE_EM } else { Self::NARROW_EM })
            .sum();
        Ok(ems * size_px)
    }
}

/// CJK ideographs, kana, hangul and full-width forms.
pub(crate) fn is_wide(c: char) -> bool {
    matches!(
        u32::from(c),
        0x1100..=0x115F
            | 0x2E80..=0x303F
            | 0x3040..=0x30FF
            | 0x3100..=0x31FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xAC00..=0xD7AF
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x20000..=0x3FFFD
    )
}

/// Split caption text into wrapping units.
///
/// Each wide character is its own unit. A run of other non-whitespace characters forms one unit.
/// Whitespace sticks to the unit before it.
pub fn display_units(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start: Option<usize> = None;
    // Set once the current unit has reached whitespace and only takes more whitespace.
    let mut trailing = false;

    for (i, c) in text.char_indices() {
        let ws = c.is_whitespace();
        match start {
            None => {
                start = Some(i);
                trailing = ws || is_wide(c);
            }
            Some(s) => {
                let extends = if ws {
                    true
                } else {
                    !trailing && !is_wide(c)
                };
                if extends {
                    trailing |= ws;
                } else {
                    units.push(&text[s..i]);
                    start = Some(i);
                    trailing = is_wide(c);
                }
            }
        }
    }
    if let Some(s) = start {
        units.push(&text[s..]);
    }
    units
}

/// Greedy line wrapping over [`display_units`].
///
/// A unit that does not fit on an empty line is placed alone on it.
pub fn wrap_caption(
    text: &str,
    max_width: f32,
    size_px: f32,
    measure: &mut dyn TextMeasure,
) -> VoxframeResult<Vec<String>> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for unit in display_units(text.trim()) {
        let candidate = format!("{line}{unit}");
        let width = measure.measure(candidate.trim_end(), size_px)?;
        if width > max_width && !line.trim().is_empty() {
            lines.push(line.trim_end().to_string());
            line = unit.to_string();
        } else {
            line = candidate;
        }
    }
    if !line.trim().is_empty() {
        lines.push(line.trim_end().to_string());
    }
    Ok(lines)
}

#[cfg(test)]
#[path = "../../tests/unit/render/caption.rs"]
mod tests;
