// ============================================================================
// COLOR SAMPLER — pointer position → pixel color through the view transform
// ============================================================================

use egui::{Color32, Pos2};
use image::{Rgba, RgbaImage};

/// Per-frame mapping from screen space to the natural pixel grid of the
/// displayed view: the on-screen origin of the image rect plus the
/// natural-size / displayed-size ratio per axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub origin: Pos2,
    pub scale_x: f32,
    pub scale_y: f32,
}

/// Snapshot of the currently rendered (cropped + rotated) view, kept so
/// pointer-move sampling does not re-render the view on every event.
///
/// Held as `Option<SampleCache>` by the application; `None` is the stale
/// state and every image-mutating operation must reset it to `None`.
pub struct SampleCache {
    image: RgbaImage,
}

impl SampleCache {
    /// Capture a rendered view. This is the expensive step the cache
    /// amortises across pointer-move events.
    pub fn capture(view: RgbaImage) -> Self {
        Self { image: view }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Sample the pixel under a screen-space pointer position.
    ///
    /// The pointer is shifted by the view's on-screen origin, scaled by the
    /// natural/displayed ratio per axis and floored to an integer pixel.
    /// A one-pixel inward bias (coordinate minus one) matches the sampled
    /// pixel to the one visually under the cursor rather than one past it.
    /// Biased coordinates are clamped to the buffer bounds, so positions on
    /// the view's edge sample the border pixel.
    ///
    /// Returns `None` only for an empty (zero-sized) cache.
    pub fn sample_at(&self, transform: &ViewTransform, pointer: Pos2) -> Option<Rgba<u8>> {
        let (w, h) = (self.image.width(), self.image.height());
        if w == 0 || h == 0 {
            return None;
        }

        let cache_x = ((pointer.x - transform.origin.x) * transform.scale_x).floor() as i64;
        let cache_y = ((pointer.y - transform.origin.y) * transform.scale_y).floor() as i64;

        // Inward bias, then clamp to the edge pixels.
        let x = (cache_x - 1).clamp(0, w as i64 - 1) as usize;
        let y = (cache_y - 1).clamp(0, h as i64 - 1) as usize;

        // Linear offset into the RGBA buffer (4-byte channel stride).
        let idx = y * w as usize * 4 + x * 4;
        let px = &self.image.as_raw()[idx..idx + 4];
        Some(Rgba([px[0], px[1], px[2], px[3]]))
    }
}

/// Sampled color as an egui color for the swatch and the picker dialog.
pub fn to_color32(px: Rgba<u8>) -> Color32 {
    Color32::from_rgba_unmultiplied(px[0], px[1], px[2], px[3])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a w×h image where each pixel encodes its own coordinates:
    /// r = x % 256, g = y % 256, b = 7, a = 255.
    fn coordinate_image(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 7, 255]))
    }

    fn transform(origin: Pos2, scale: f32) -> ViewTransform {
        ViewTransform {
            origin,
            scale_x: scale,
            scale_y: scale,
        }
    }

    #[test]
    fn samples_biased_pixel_under_cursor() {
        // 800×600 natural shown at 400×300: natural/displayed scale is 2.
        // Display-space (100,100) at origin (0,0) lands on natural (200,200),
        // biased inward to (199,199).
        let cache = SampleCache::capture(coordinate_image(800, 600));
        let t = transform(Pos2::ZERO, 2.0);

        let px = cache.sample_at(&t, Pos2::new(100.0, 100.0)).unwrap();
        assert_eq!(px, Rgba([199, 199, 7, 255]));
    }

    #[test]
    fn origin_offset_is_subtracted_before_scaling() {
        let cache = SampleCache::capture(coordinate_image(800, 600));
        let t = transform(Pos2::new(50.0, 20.0), 2.0);

        // Same display-space position as the zero-origin case, shifted by
        // the view origin: must sample the same pixel.
        let px = cache.sample_at(&t, Pos2::new(150.0, 120.0)).unwrap();
        assert_eq!(px, Rgba([199, 199, 7, 255]));
    }

    #[test]
    fn sampling_is_deterministic_against_the_cache() {
        let cache = SampleCache::capture(coordinate_image(64, 64));
        let t = transform(Pos2::ZERO, 1.0);
        let pos = Pos2::new(10.0, 31.0);

        let first = cache.sample_at(&t, pos).unwrap();
        let second = cache.sample_at(&t, pos).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Rgba([9, 30, 7, 255]));
    }

    #[test]
    fn edge_positions_clamp_to_border_pixels() {
        let cache = SampleCache::capture(coordinate_image(16, 16));
        let t = transform(Pos2::ZERO, 1.0);

        // At the top-left corner the bias would index pixel (-1,-1).
        let px = cache.sample_at(&t, Pos2::new(0.0, 0.0)).unwrap();
        assert_eq!(px, Rgba([0, 0, 7, 255]));

        // Far past the bottom-right corner clamps to the last pixel.
        let px = cache.sample_at(&t, Pos2::new(500.0, 500.0)).unwrap();
        assert_eq!(px, Rgba([15, 15, 7, 255]));
    }

    #[test]
    fn per_axis_scales_are_independent() {
        let cache = SampleCache::capture(coordinate_image(200, 100));
        let t = ViewTransform {
            origin: Pos2::ZERO,
            scale_x: 2.0,
            scale_y: 0.5,
        };

        // x: 30 * 2 = 60, biased to 59; y: 40 * 0.5 = 20, biased to 19.
        let px = cache.sample_at(&t, Pos2::new(30.0, 40.0)).unwrap();
        assert_eq!(px, Rgba([59, 19, 7, 255]));
    }

    #[test]
    fn empty_cache_yields_no_sample() {
        let cache = SampleCache::capture(RgbaImage::new(0, 0));
        let t = transform(Pos2::ZERO, 1.0);
        assert!(cache.sample_at(&t, Pos2::new(1.0, 1.0)).is_none());
    }
}
