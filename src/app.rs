use crate::clipboard;
use crate::components::colors::ColorDialog;
use crate::io;
use crate::picker::{self, SampleCache};
use crate::viewer::{DragMode, Viewer};
use crate::{log_err, log_info};
use eframe::egui;
use egui::Color32;
use image::RgbaImage;
use std::path::Path;

/// Interaction mode. Exactly one is active at a time; startup default is
/// cropping. The transient hold-Space-to-pan override is a separate flag,
/// never a third mode.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Mode {
    #[default]
    Crop,
    ColorPick,
}

pub struct CropFEApp {
    mode: Mode,
    /// The crop/view widget; `None` until an image is loaded.
    viewer: Option<Viewer>,
    /// Snapshot of the rendered view for pointer-move sampling. `None` is
    /// the stale state; every image-mutating operation resets it.
    sample_cache: Option<SampleCache>,
    picked_color: Color32,
    swatch_visible: bool,
    color_dialog: ColorDialog,
    /// Blocking error message; shown as a modal window until dismissed.
    error_message: Option<String>,
    /// True while Space holds the transient pan override.
    space_pan: bool,
    fullscreen: bool,
}

impl Default for CropFEApp {
    fn default() -> Self {
        Self::new()
    }
}

impl CropFEApp {
    pub fn new() -> Self {
        let mut app = Self {
            mode: Mode::Crop,
            viewer: None,
            sample_cache: None,
            picked_color: Color32::from_rgb(255, 0, 0),
            swatch_visible: false,
            color_dialog: ColorDialog::default(),
            error_message: None,
            space_pan: false,
            fullscreen: false,
        };
        app.set_mode(Mode::Crop);
        app
    }

    /// If the clipboard already holds an image when the app launches, load
    /// it silently. An empty clipboard is not an error here.
    pub fn open_clipboard_on_startup(&mut self) {
        if let Some(img) = clipboard::read_image() {
            log_info!("loaded startup image from clipboard");
            self.set_image(img);
        }
    }

    // -- Mode controller ----------------------------------------------------

    /// Single entry point for mode transitions. Safe to call repeatedly
    /// with the same mode, and with no image loaded (then only the UI
    /// visibility effects apply).
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        match mode {
            Mode::ColorPick => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.clear_selection();
                    viewer.set_drag_mode(DragMode::None);
                }
                self.swatch_visible = true;
            }
            Mode::Crop => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.clear_selection();
                    viewer.set_drag_mode(DragMode::Crop);
                }
                self.color_dialog.close();
                self.swatch_visible = false;
            }
        }
    }

    /// Enter the transient hold-to-pan override (Space pressed). The stored
    /// mode is not touched.
    fn begin_pan_override(&mut self) {
        self.space_pan = true;
        if let Some(viewer) = &mut self.viewer {
            viewer.set_drag_mode(DragMode::Move);
            viewer.clear_selection();
        }
    }

    /// Leave the override (Space released), restoring the stored mode's
    /// drag behavior.
    fn end_pan_override(&mut self) {
        self.space_pan = false;
        if let Some(viewer) = &mut self.viewer {
            viewer.set_drag_mode(match self.mode {
                Mode::Crop => DragMode::Crop,
                Mode::ColorPick => DragMode::None,
            });
        }
    }

    // -- Image lifecycle ----------------------------------------------------

    fn invalidate_sample_cache(&mut self) {
        self.sample_cache = None;
    }

    /// Install a new loaded image, replacing the previous one wholesale.
    /// The old viewer (selection, rotation, texture) is discarded.
    pub fn set_image(&mut self, image: RgbaImage) {
        self.viewer = Some(Viewer::new(image));
        self.set_mode(Mode::Crop);
        self.invalidate_sample_cache();
    }

    pub fn open_file(&mut self, path: &Path) {
        match io::load_image(path) {
            Ok(img) => {
                log_info!("opened {}", path.display());
                self.set_image(img);
            }
            Err(e) => {
                log_err!("{}", e);
                self.error_message = Some(e);
            }
        }
    }

    pub fn paste_from_clipboard(&mut self) {
        match clipboard::read_image() {
            Some(img) => self.set_image(img),
            None => self.error_message = Some("No image in clipboard".to_string()),
        }
    }

    pub fn copy_to_clipboard(&self) {
        if let Some(viewer) = &self.viewer {
            clipboard::copy_image(&viewer.rendered_view());
        }
    }

    /// Commit the current crop selection: the rendered view becomes the new
    /// loaded image (replaces, never composes).
    pub fn apply_crop(&mut self) {
        let Some(viewer) = &self.viewer else {
            return;
        };
        let view = viewer.rendered_view();
        self.set_image(view);
    }

    pub fn rotate_image(&mut self, degrees: i32) {
        if let Some(viewer) = &mut self.viewer {
            viewer.rotate(degrees);
        }
        self.invalidate_sample_cache();
    }

    fn handle_open(&mut self) {
        if let Some(path) = io::pick_open_path() {
            self.open_file(&path);
        }
    }

    fn handle_save(&mut self) {
        let Some(viewer) = &self.viewer else {
            return;
        };
        let Some(path) = io::pick_save_path() else {
            return;
        };
        let view = viewer.rendered_view();
        match io::save_view(&view, &path) {
            Ok(()) => log_info!("saved {}", path.display()),
            Err(e @ io::SaveError::UnsupportedExtension(_)) => {
                // Logged no-op: nothing was written, no alert.
                log_err!("could not save {}: {}", path.display(), e);
            }
            Err(e) => {
                log_err!("could not save {}: {}", path.display(), e);
                self.error_message = Some(format!("Failed to save image: {}", e));
            }
        }
    }

    // -- Color sampler ------------------------------------------------------

    /// Sample the pixel under the pointer into the picked color. No-op
    /// unless in color-pick mode with a loaded image and no open dialog.
    fn sample_under_pointer(&mut self, pointer: egui::Pos2) {
        if self.mode != Mode::ColorPick || self.color_dialog.is_open() {
            return;
        }
        let Some(viewer) = &self.viewer else {
            return;
        };

        // Cache miss: render the current view once; later pointer moves
        // read the same snapshot until something invalidates it.
        if self.sample_cache.is_none() {
            self.sample_cache = Some(SampleCache::capture(viewer.rendered_view()));
        }

        let Some(transform) = viewer.view_transform() else {
            return;
        };
        let Some(cache) = &self.sample_cache else {
            return;
        };
        if let Some(px) = cache.sample_at(&transform, pointer) {
            self.picked_color = picker::to_color32(px);
        }
    }

    // -- Input wiring -------------------------------------------------------

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<egui::DroppedFile> = ctx.input(|i| i.raw.dropped_files.clone());
        if let Some(path) = dropped.into_iter().find_map(|f| f.path) {
            self.open_file(&path);
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        // A focused text field (hex input) owns the keyboard.
        if ctx.wants_keyboard_input() {
            return;
        }

        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::C)) {
            self.copy_to_clipboard();
        }
        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::V)) {
            self.paste_from_clipboard();
        }
        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::O)) {
            self.handle_open();
        }
        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::S)) {
            self.handle_save();
        }
        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::ArrowRight)) {
            self.rotate_image(90);
        }
        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::ArrowLeft)) {
            self.rotate_image(-90);
        }

        let plain = ctx.input(|i| !i.modifiers.any());
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.set_mode(Mode::Crop);
        }
        if plain && ctx.input(|i| i.key_pressed(egui::Key::M)) {
            self.set_mode(Mode::Crop);
        }
        if plain && ctx.input(|i| i.key_pressed(egui::Key::I)) {
            self.set_mode(Mode::ColorPick);
        }
        if plain && ctx.input(|i| i.key_pressed(egui::Key::Enter)) {
            self.apply_crop();
        }

        // Hold-Space pan override.
        if !self.space_pan && ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.begin_pan_override();
        }
        if self.space_pan && ctx.input(|i| i.key_released(egui::Key::Space)) {
            self.end_pan_override();
        }
    }

    fn handle_scroll_zoom(&mut self, ctx: &egui::Context) {
        if ctx.is_pointer_over_area() {
            return;
        }
        let scroll = ctx.input(|i| i.scroll_delta.y);
        if scroll.abs() > 0.1
            && let Some(viewer) = &mut self.viewer
        {
            viewer.zoom_by((scroll * 0.002).exp());
        }
    }

    // -- UI -----------------------------------------------------------------

    fn show_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui
                        .add(egui::Button::new("Open Image-File").shortcut_text("Ctrl+O"))
                        .clicked()
                    {
                        self.handle_open();
                        ui.close_menu();
                    }
                    if ui
                        .add(egui::Button::new("Save as Image-File").shortcut_text("Ctrl+S"))
                        .clicked()
                    {
                        self.handle_save();
                        ui.close_menu();
                    }
                    if ui
                        .add(egui::Button::new("Copy Image to Clipboard").shortcut_text("Ctrl+C"))
                        .clicked()
                    {
                        self.copy_to_clipboard();
                        ui.close_menu();
                    }
                    if ui
                        .add(
                            egui::Button::new("Paste Image from Clipboard")
                                .shortcut_text("Ctrl+V"),
                        )
                        .clicked()
                    {
                        self.paste_from_clipboard();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("Tools", |ui| {
                    if ui
                        .add(egui::Button::new("Clear Selection").shortcut_text("Esc"))
                        .clicked()
                    {
                        self.set_mode(Mode::Crop);
                        ui.close_menu();
                    }
                    if ui
                        .add(egui::Button::new("Mode: Image Cropping").shortcut_text("M"))
                        .clicked()
                    {
                        self.set_mode(Mode::Crop);
                        ui.close_menu();
                    }
                    if ui
                        .add(egui::Button::new("Mode: Color Picking").shortcut_text("I"))
                        .clicked()
                    {
                        self.set_mode(Mode::ColorPick);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui
                        .add(egui::Button::new("Crop Image").shortcut_text("Enter"))
                        .clicked()
                    {
                        self.apply_crop();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui
                        .add(egui::Button::new("Rotate Image 90° right").shortcut_text("Ctrl+Right"))
                        .clicked()
                    {
                        self.rotate_image(90);
                        ui.close_menu();
                    }
                    if ui
                        .add(egui::Button::new("Rotate Image 90° left").shortcut_text("Ctrl+Left"))
                        .clicked()
                    {
                        self.rotate_image(-90);
                        ui.close_menu();
                    }
                });
                ui.menu_button("View", |ui| {
                    if ui.button("Zoom In").clicked() {
                        if let Some(viewer) = &mut self.viewer {
                            viewer.zoom_in();
                        }
                        ui.close_menu();
                    }
                    if ui.button("Zoom Out").clicked() {
                        if let Some(viewer) = &mut self.viewer {
                            viewer.zoom_out();
                        }
                        ui.close_menu();
                    }
                    if ui.button("Reset Zoom").clicked() {
                        if let Some(viewer) = &mut self.viewer {
                            viewer.reset_zoom();
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Toggle Fullscreen").clicked() {
                        self.fullscreen = !self.fullscreen;
                        ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(self.fullscreen));
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn show_swatch(&self, ctx: &egui::Context) {
        egui::Area::new(egui::Id::new("picked_color_swatch"))
            .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
            .show(ctx, |ui| {
                let (rect, _) =
                    ui.allocate_exact_size(egui::vec2(48.0, 48.0), egui::Sense::hover());
                ui.painter().rect_filled(rect, 4.0, self.picked_color);
                ui.painter()
                    .rect_stroke(rect, 4.0, egui::Stroke::new(1.0, Color32::from_gray(180)));
            });
    }

    fn show_error_window(&mut self, ctx: &egui::Context) {
        let Some(message) = self.error_message.clone() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(&message);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.error_message = None;
        }
    }
}

impl eframe::App for CropFEApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);
        self.handle_shortcuts(ctx);
        self.handle_scroll_zoom(ctx);
        self.show_menu_bar(ctx);

        egui::CentralPanel::default().show(ctx, |ui| match &mut self.viewer {
            Some(viewer) => viewer.show(ui),
            None => {
                ui.centered_and_justified(|ui| {
                    ui.label("Open an image (Ctrl+O), paste one (Ctrl+V) or drop a file here");
                });
            }
        });

        // Pointer-move sampling against the cached view. Runs after the
        // central panel so the viewer's layout is current for this frame.
        if let Some(pointer) = ctx.input(|i| i.pointer.hover_pos()) {
            self.sample_under_pointer(pointer);
        }

        // A click over the image in color-pick mode opens the dialog,
        // seeded with the last sampled color.
        if self.mode == Mode::ColorPick
            && !self.color_dialog.is_open()
            && ctx.input(|i| i.pointer.primary_pressed())
            && !ctx.is_pointer_over_area()
        {
            let over_image = ctx
                .input(|i| i.pointer.interact_pos())
                .zip(self.viewer.as_ref())
                .is_some_and(|(pos, v)| v.contains(pos));
            if over_image {
                self.color_dialog.open_with(self.picked_color);
            }
        }

        if self.swatch_visible {
            self.show_swatch(ctx);
        }
        self.color_dialog.show(ctx);
        self.show_error_window(ctx);
    }
}
