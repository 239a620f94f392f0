// ============================================================================
// CROP/VIEW WIDGET — displayed image, rectangle selection, rotate, pan, zoom
// ============================================================================
//
// Owns the loaded image for as long as it is displayed. The application
// swaps the whole widget when a new image is installed; selection, rotation,
// pan and the GPU texture all die with the old instance.

use eframe::egui;
use egui::{Color32, Pos2, Rect, Sense, Stroke, TextureHandle, TextureOptions, Vec2};
use image::{RgbaImage, imageops};

use crate::picker::ViewTransform;

const MIN_ZOOM: f32 = 0.1;
const MAX_ZOOM: f32 = 8.0;

/// What a pointer drag over the view does.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum DragMode {
    /// Rubber-band a crop selection rectangle.
    #[default]
    Crop,
    /// Pan the displayed image.
    Move,
    /// Drags are ignored (color-pick mode).
    None,
}

/// Interactive image view with crop-rectangle selection.
pub struct Viewer {
    /// Natural pixels as loaded (no rotation applied).
    image: RgbaImage,
    /// `image` with the current rotation applied; this is what is on screen
    /// and what selections are expressed in.
    display: RgbaImage,
    /// Clockwise quarter turns applied to `image` to produce `display`.
    quarter_turns: u8,
    /// Current selection in display-space pixel coordinates, normalized.
    selection: Option<Rect>,
    drag_mode: DragMode,
    zoom: f32,
    pan_offset: Vec2,
    texture: Option<TextureHandle>,
    /// On-screen rect the image occupied last frame; feeds `view_transform`.
    last_image_rect: Option<Rect>,
    /// Screen-space start of an in-progress crop drag.
    drag_anchor: Option<Pos2>,
}

impl Viewer {
    pub fn new(image: RgbaImage) -> Self {
        let display = image.clone();
        Self {
            image,
            display,
            quarter_turns: 0,
            selection: None,
            drag_mode: DragMode::Crop,
            zoom: 1.0,
            pan_offset: Vec2::ZERO,
            texture: None,
            last_image_rect: None,
            drag_anchor: None,
        }
    }

    /// Pixel dimensions of the displayed (rotated) view.
    pub fn display_size(&self) -> (u32, u32) {
        (self.display.width(), self.display.height())
    }

    pub fn drag_mode(&self) -> DragMode {
        self.drag_mode
    }

    pub fn set_drag_mode(&mut self, mode: DragMode) {
        self.drag_mode = mode;
        if mode != DragMode::Crop {
            self.drag_anchor = None;
        }
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    pub fn selection(&self) -> Option<Rect> {
        self.selection
    }

    /// Install a selection programmatically. Normalized and clamped to the
    /// display bounds; rectangles smaller than one pixel are discarded.
    pub fn set_selection(&mut self, rect: Rect) {
        let (w, h) = (self.display.width() as f32, self.display.height() as f32);
        let min = Pos2::new(
            rect.min.x.min(rect.max.x).clamp(0.0, w),
            rect.min.y.min(rect.max.y).clamp(0.0, h),
        );
        let max = Pos2::new(
            rect.min.x.max(rect.max.x).clamp(0.0, w),
            rect.min.y.max(rect.max.y).clamp(0.0, h),
        );
        let sel = Rect::from_min_max(min, max);
        self.selection = (sel.width() >= 1.0 && sel.height() >= 1.0).then_some(sel);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.drag_anchor = None;
    }

    /// Rotate the view in right-angle steps (positive = clockwise).
    /// The selection does not survive a rotation.
    pub fn rotate(&mut self, degrees: i32) {
        let quarters = (degrees / 90).rem_euclid(4) as u8;
        if quarters == 0 {
            return;
        }
        self.quarter_turns = (self.quarter_turns + quarters) % 4;
        self.display = match self.quarter_turns {
            1 => imageops::rotate90(&self.image),
            2 => imageops::rotate180(&self.image),
            3 => imageops::rotate270(&self.image),
            _ => self.image.clone(),
        };
        self.selection = None;
        self.drag_anchor = None;
        self.texture = None;
    }

    /// Render the current cropped + rotated view to a still raster.
    ///
    /// Rotation and cropping are exact 1:1 pixel operations, so the result
    /// is never resampled (nearest-neighbor by construction). With no
    /// selection the whole rotated image is returned.
    pub fn rendered_view(&self) -> RgbaImage {
        let (w, h) = (self.display.width(), self.display.height());
        match self.selection {
            Some(sel) => {
                let x0 = (sel.min.x.floor().max(0.0) as u32).min(w.saturating_sub(1));
                let y0 = (sel.min.y.floor().max(0.0) as u32).min(h.saturating_sub(1));
                let x1 = (sel.max.x.ceil() as u32).clamp(x0 + 1, w);
                let y1 = (sel.max.y.ceil() as u32).clamp(y0 + 1, h);
                imageops::crop_imm(&self.display, x0, y0, x1 - x0, y1 - y0).to_image()
            }
            None => self.display.clone(),
        }
    }

    /// Record the on-screen rect the image occupies. Called by [`show`]
    /// with the frame's layout; callers without a UI (tests, headless
    /// drivers) can inject a rect directly.
    pub fn set_view_rect(&mut self, rect: Rect) {
        self.last_image_rect = Some(rect);
    }

    /// Screen-to-natural mapping for the image rect laid out last frame.
    pub fn view_transform(&self) -> Option<ViewTransform> {
        let rect = self.last_image_rect?;
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return None;
        }
        Some(ViewTransform {
            origin: rect.min,
            scale_x: self.display.width() as f32 / rect.width(),
            scale_y: self.display.height() as f32 / rect.height(),
        })
    }

    /// True when the pointer position is over the displayed image.
    pub fn contains(&self, pos: Pos2) -> bool {
        self.last_image_rect.is_some_and(|r| r.contains(pos))
    }

    // -- Zoom / pan ---------------------------------------------------------

    pub fn zoom_by(&mut self, factor: f32) {
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(1.25);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(0.8);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
        self.pan_offset = Vec2::ZERO;
    }

    // -- Layout -------------------------------------------------------------

    /// On-screen rect for the displayed image inside `canvas_rect`:
    /// fitted to the canvas preserving aspect ratio, scaled by the current
    /// zoom and shifted by the pan offset.
    fn layout_image_rect(&self, canvas_rect: Rect) -> Rect {
        let (w, h) = (self.display.width() as f32, self.display.height() as f32);
        if w <= 0.0 || h <= 0.0 {
            return Rect::from_center_size(canvas_rect.center(), Vec2::ZERO);
        }
        let fit = (canvas_rect.width() / w).min(canvas_rect.height() / h);
        let scale = fit * self.zoom;
        let center = canvas_rect.center() + self.pan_offset;
        Rect::from_center_size(center, Vec2::new(w * scale, h * scale))
    }

    /// Map a screen position into display-space pixel coordinates, clamped
    /// to the image bounds.
    fn screen_to_display(&self, pos: Pos2, image_rect: Rect) -> Pos2 {
        let (w, h) = (self.display.width() as f32, self.display.height() as f32);
        Pos2::new(
            ((pos.x - image_rect.min.x) / image_rect.width() * w).clamp(0.0, w),
            ((pos.y - image_rect.min.y) / image_rect.height() * h).clamp(0.0, h),
        )
    }

    /// Map a display-space position back onto the screen.
    fn display_to_screen(&self, pos: Pos2, image_rect: Rect) -> Pos2 {
        let (w, h) = (self.display.width() as f32, self.display.height() as f32);
        Pos2::new(
            image_rect.min.x + pos.x / w * image_rect.width(),
            image_rect.min.y + pos.y / h * image_rect.height(),
        )
    }

    // -- Rendering & interaction --------------------------------------------

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let canvas_rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(canvas_rect, Sense::click_and_drag());
        let painter = ui.painter_at(canvas_rect);

        if self.texture.is_none() {
            let color_image = egui::ColorImage::from_rgba_unmultiplied(
                [self.display.width() as usize, self.display.height() as usize],
                self.display.as_raw(),
            );
            self.texture = Some(ui.ctx().load_texture(
                "viewer-image",
                color_image,
                TextureOptions::NEAREST,
            ));
        }

        let image_rect = self.layout_image_rect(canvas_rect);
        self.set_view_rect(image_rect);

        if let Some(texture) = &self.texture {
            let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
            painter.image(texture.id(), image_rect, uv, Color32::WHITE);
        }

        match self.drag_mode {
            DragMode::Move => {
                if response.dragged() {
                    self.pan_offset += response.drag_delta();
                }
            }
            DragMode::Crop => {
                if response.drag_started() {
                    self.drag_anchor = response.interact_pointer_pos();
                }
                if response.dragged()
                    && let (Some(anchor), Some(pos)) =
                        (self.drag_anchor, response.interact_pointer_pos())
                {
                    let a = self.screen_to_display(anchor, image_rect);
                    let b = self.screen_to_display(pos, image_rect);
                    self.set_selection(Rect::from_two_pos(a, b));
                }
                if response.drag_released() {
                    self.drag_anchor = None;
                }
            }
            DragMode::None => {}
        }

        self.paint_selection(&painter, canvas_rect, image_rect);
    }

    /// Dim everything outside the selection and stroke its border.
    fn paint_selection(&self, painter: &egui::Painter, canvas_rect: Rect, image_rect: Rect) {
        let Some(sel) = self.selection else {
            return;
        };
        let sel_screen = Rect::from_min_max(
            self.display_to_screen(sel.min, image_rect),
            self.display_to_screen(sel.max, image_rect),
        );

        let shade = Color32::from_black_alpha(120);
        let left = Rect::from_min_max(
            canvas_rect.min,
            Pos2::new(sel_screen.min.x, canvas_rect.max.y),
        );
        let right = Rect::from_min_max(
            Pos2::new(sel_screen.max.x, canvas_rect.min.y),
            canvas_rect.max,
        );
        let top = Rect::from_min_max(
            Pos2::new(sel_screen.min.x, canvas_rect.min.y),
            Pos2::new(sel_screen.max.x, sel_screen.min.y),
        );
        let bottom = Rect::from_min_max(
            Pos2::new(sel_screen.min.x, sel_screen.max.y),
            Pos2::new(sel_screen.max.x, canvas_rect.max.y),
        );
        for rect in [left, right, top, bottom] {
            if rect.width() > 0.0 && rect.height() > 0.0 {
                painter.rect_filled(rect, 0.0, shade);
            }
        }
        painter.rect_stroke(sel_screen, 0.0, Stroke::new(1.0, Color32::WHITE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient_image(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 0, 255]))
    }

    #[test]
    fn quarter_turns_swap_display_dimensions() {
        let mut viewer = Viewer::new(gradient_image(40, 30));
        assert_eq!(viewer.display_size(), (40, 30));

        viewer.rotate(90);
        assert_eq!(viewer.display_size(), (30, 40));

        viewer.rotate(90);
        assert_eq!(viewer.display_size(), (40, 30));

        viewer.rotate(-90);
        assert_eq!(viewer.display_size(), (30, 40));

        // Four right turns land back on the original orientation.
        viewer.rotate(90);
        viewer.rotate(360);
        assert_eq!(viewer.display_size(), (40, 30));
        assert_eq!(viewer.quarter_turns, 0);
    }

    #[test]
    fn rotation_moves_pixels_clockwise() {
        // 2×1 image: (0,0)=A, (1,0)=B. After 90° CW it is 1×2 with A on top.
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([10, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([20, 0, 0, 255]));

        let mut viewer = Viewer::new(img);
        viewer.rotate(90);

        let view = viewer.rendered_view();
        assert_eq!(view.dimensions(), (1, 2));
        assert_eq!(view.get_pixel(0, 0), &Rgba([10, 0, 0, 255]));
        assert_eq!(view.get_pixel(0, 1), &Rgba([20, 0, 0, 255]));
    }

    #[test]
    fn rotation_discards_selection() {
        let mut viewer = Viewer::new(gradient_image(40, 30));
        viewer.set_selection(Rect::from_min_max(
            Pos2::new(5.0, 5.0),
            Pos2::new(20.0, 20.0),
        ));
        assert!(viewer.has_selection());

        viewer.rotate(90);
        assert!(!viewer.has_selection());
    }

    #[test]
    fn selection_is_normalized_and_clamped() {
        let mut viewer = Viewer::new(gradient_image(40, 30));

        // Dragged bottom-right to top-left, overshooting the image bounds.
        viewer.set_selection(Rect::from_min_max(
            Pos2::new(100.0, 100.0),
            Pos2::new(-10.0, 10.0),
        ));

        let sel = viewer.selection().unwrap();
        assert_eq!(sel.min, Pos2::new(0.0, 10.0));
        assert_eq!(sel.max, Pos2::new(40.0, 30.0));
    }

    #[test]
    fn sub_pixel_selection_is_discarded() {
        let mut viewer = Viewer::new(gradient_image(40, 30));
        viewer.set_selection(Rect::from_min_max(
            Pos2::new(5.0, 5.0),
            Pos2::new(5.4, 25.0),
        ));
        assert!(!viewer.has_selection());
    }

    #[test]
    fn rendered_view_crops_to_selection() {
        let mut viewer = Viewer::new(gradient_image(40, 30));
        viewer.set_selection(Rect::from_min_max(
            Pos2::new(10.0, 5.0),
            Pos2::new(30.0, 25.0),
        ));

        let view = viewer.rendered_view();
        assert_eq!(view.dimensions(), (20, 20));
        // Top-left pixel of the crop is source pixel (10, 5).
        assert_eq!(view.get_pixel(0, 0), &Rgba([10, 5, 0, 255]));
    }

    #[test]
    fn rendered_view_without_selection_is_whole_display() {
        let viewer = Viewer::new(gradient_image(40, 30));
        let view = viewer.rendered_view();
        assert_eq!(view.dimensions(), (40, 30));
        assert_eq!(view.get_pixel(39, 29), &Rgba([39, 29, 0, 255]));
    }

    #[test]
    fn layout_fits_image_preserving_aspect() {
        let viewer = Viewer::new(gradient_image(800, 600));
        let canvas = Rect::from_min_max(Pos2::ZERO, Pos2::new(400.0, 400.0));

        let rect = viewer.layout_image_rect(canvas);
        assert_eq!(rect.width(), 400.0);
        assert_eq!(rect.height(), 300.0);
        assert_eq!(rect.center(), canvas.center());
    }

    #[test]
    fn view_transform_reports_natural_over_displayed_scale() {
        let mut viewer = Viewer::new(gradient_image(800, 600));
        viewer.set_view_rect(Rect::from_min_max(Pos2::ZERO, Pos2::new(400.0, 300.0)));

        let t = viewer.view_transform().unwrap();
        assert_eq!(t.origin, Pos2::ZERO);
        assert_eq!(t.scale_x, 2.0);
        assert_eq!(t.scale_y, 2.0);
    }

    #[test]
    fn leaving_crop_mode_cancels_pending_drag() {
        let mut viewer = Viewer::new(gradient_image(40, 30));
        viewer.drag_anchor = Some(Pos2::new(3.0, 3.0));
        viewer.set_drag_mode(DragMode::None);
        assert!(viewer.drag_anchor.is_none());
    }
}
