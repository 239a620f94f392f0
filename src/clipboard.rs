// ============================================================================
// CLIPBOARD — system clipboard image exchange via arboard
// ============================================================================

use image::RgbaImage;
use std::borrow::Cow;

use crate::log_warn;

/// Borrow an image as the RGBA `ImageData` layout arboard expects.
pub fn image_to_clip_data(img: &RgbaImage) -> arboard::ImageData<'_> {
    arboard::ImageData {
        width: img.width() as usize,
        height: img.height() as usize,
        bytes: Cow::Borrowed(img.as_raw()),
    }
}

/// Rebuild an image from clipboard `ImageData`. Returns `None` when the
/// byte count does not match the claimed dimensions.
pub fn clip_data_to_image(data: arboard::ImageData<'_>) -> Option<RgbaImage> {
    RgbaImage::from_raw(
        data.width as u32,
        data.height as u32,
        data.bytes.into_owned(),
    )
}

/// Write a rendered view to the system clipboard. Failures are logged and
/// otherwise ignored; the clipboard is best-effort.
pub fn copy_image(img: &RgbaImage) {
    match arboard::Clipboard::new() {
        Ok(mut clip) => {
            if let Err(e) = clip.set_image(image_to_clip_data(img)) {
                log_warn!("clipboard write failed: {}", e);
            }
        }
        Err(e) => log_warn!("clipboard unavailable: {}", e),
    }
}

/// Try to read an image from the system clipboard.
///
/// Two sources are checked in order:
///   1. Raw image data (screenshots, copies from other image editors).
///   2. Text content that is a path to a decodable image file (covers
///      files copied from a file manager on platforms that expose them
///      as text).
pub fn read_image() -> Option<RgbaImage> {
    if let Ok(mut clip) = arboard::Clipboard::new()
        && let Ok(data) = clip.get_image()
        && let Some(img) = clip_data_to_image(data)
    {
        return Some(img);
    }

    if let Ok(mut clip) = arboard::Clipboard::new()
        && let Ok(text) = clip.get_text()
    {
        let path = std::path::Path::new(text.trim());
        if path.is_file()
            && let Ok(img) = image::open(path)
        {
            return Some(img.to_rgba8());
        }
    }

    None
}
