//! File I/O — image decode, PNG/JPEG encode by extension, native dialogs.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, RgbaImage};
use rfd::FileDialog;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Fixed JPEG quality for saved views.
pub const JPEG_QUALITY: u8 = 80;

/// Error type for save operations.
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Encode(image::ImageError),
    /// Extension is neither `.png` nor `.jpg`/`.jpeg`; nothing was written.
    UnsupportedExtension(String),
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "I/O error: {}", e),
            SaveError::Encode(e) => write!(f, "Encode error: {}", e),
            SaveError::UnsupportedExtension(ext) => {
                write!(f, "Unsupported save extension: {:?}", ext)
            }
        }
    }
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<image::ImageError> for SaveError {
    fn from(e: image::ImageError) -> Self {
        SaveError::Encode(e)
    }
}

/// Decode any raster format the `image` crate supports into RGBA.
pub fn load_image(path: &Path) -> Result<RgbaImage, String> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|e| format!("Failed to load image from {}: {}", path.display(), e))
}

/// Encode and write a rendered view to `path`, format chosen by extension:
/// `.png` lossless, `.jpg`/`.jpeg` at quality 80. Any other extension
/// writes nothing and returns [`SaveError::UnsupportedExtension`].
pub fn save_view(image: &RgbaImage, path: &Path) -> Result<(), SaveError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
            Ok(())
        }
        "jpg" | "jpeg" => {
            // JPEG carries no alpha; flatten to RGB before encoding.
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            encoder.encode(
                rgb_image.as_raw(),
                rgb_image.width(),
                rgb_image.height(),
                image::ColorType::Rgb8,
            )?;
            Ok(())
        }
        other => Err(SaveError::UnsupportedExtension(other.to_string())),
    }
}

/// Native "open file" dialog. Returns the chosen path or `None` on cancel.
pub fn pick_open_path() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "gif", "webp", "tiff", "tga", "ico"])
        .pick_file()
}

/// Native "save file" dialog offering the two supported formats.
pub fn pick_save_path() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("JPEG Image", &["jpg"])
        .add_filter("PNG Image", &["png"])
        .save_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn test_image() -> RgbaImage {
        RgbaImage::from_fn(12, 9, |x, y| {
            Rgba([(x * 20 % 256) as u8, (y * 25 % 256) as u8, 128, 255])
        })
    }

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cropfe-test-{}-{}", std::process::id(), name))
    }

    #[test]
    fn png_round_trips_losslessly() {
        let img = test_image();
        let path = scratch_path("view.png");

        save_view(&img, &path).unwrap();
        let decoded = load_image(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(decoded.dimensions(), img.dimensions());
        assert_eq!(decoded.as_raw(), img.as_raw());
    }

    #[test]
    fn jpeg_is_valid_and_keeps_dimensions() {
        let img = test_image();
        let path = scratch_path("view.jpg");

        save_view(&img, &path).unwrap();
        let decoded = load_image(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // Lossy, so only the geometry is guaranteed.
        assert_eq!(decoded.dimensions(), img.dimensions());
    }

    #[test]
    fn unsupported_extension_writes_nothing() {
        let img = test_image();
        let path = scratch_path("view.webm");

        let err = save_view(&img, &path).unwrap_err();
        assert!(matches!(err, SaveError::UnsupportedExtension(ref e) if e == "webm"));
        assert!(!path.exists());
    }

    #[test]
    fn missing_extension_is_unsupported() {
        let img = test_image();
        let path = scratch_path("view");

        let err = save_view(&img, &path).unwrap_err();
        assert!(matches!(err, SaveError::UnsupportedExtension(ref e) if e.is_empty()));
        assert!(!path.exists());
    }

    #[test]
    fn load_failure_reports_the_path() {
        let path = scratch_path("does-not-exist.png");
        let err = load_image(&path).unwrap_err();
        assert!(err.contains("does-not-exist.png"));
    }
}
