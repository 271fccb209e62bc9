use std::sync::Arc;

use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Mime types accepted for the background image.
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/webp",
    "image/gif",
    "image/bmp",
];

/// Raw background image as handed over by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackgroundImage {
    pub bytes: Arc<Vec<u8>>,
    pub mime_type: String,
}

impl BackgroundImage {
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: Arc::new(bytes.into()),
            mime_type: mime_type.into(),
        }
    }

    /// Guess the mime type from a file extension.
    pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some("image/png"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "webp" => Some("image/webp"),
            "gif" => Some("image/gif"),
            "bmp" => Some("image/bmp"),
            _ => None,
        }
    }
}

/// Decoded background in premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

fn image_format(mime: &str) -> Option<image::ImageFormat> {
    let base = mime.split(';').next().unwrap_or(mime).trim();
    match base.to_ascii_lowercase().as_str() {
        "image/png" => Some(image::ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Some(image::ImageFormat::Jpeg),
        "image/webp" => Some(image::ImageFormat::WebP),
        "image/gif" => Some(image::ImageFormat::Gif),
        "image/bmp" => Some(image::ImageFormat::Bmp),
        _ => None,
    }
}

/// Decode the background image, checking the declared mime type first.
///
/// Every failure is a `ResourceLoad` error.
pub fn decode_background(img: &BackgroundImage) -> VoxframeResult<DecodedImage> {
    let Some(format) = image_format(&img.mime_type) else {
        return Err(VoxframeError::resource_load(format!(
            "unsupported background mime type '{}' (expected one of {})",
            img.mime_type,
            SUPPORTED_MIME_TYPES.join(", ")
        )));
    };
    if img.bytes.is_empty() {
        return Err(VoxframeError::resource_load("background image is empty"));
    }

    let dyn_img = image::load_from_memory_with_format(&img.bytes, format)
        .or_else(|_| image::load_from_memory(&img.bytes))
        .map_err(|e| {
            VoxframeError::resource_load(format!(
                "failed to decode background image ({}): {e}",
                img.mime_type
            ))
        })?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(VoxframeError::resource_load(
            "background image has zero dimensions",
        ));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    tracing::debug!(width, height, mime = %img.mime_type, "background decoded");

    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
