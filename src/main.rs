// GUI-subsystem binary: no console window is ever allocated by Windows.
#![windows_subsystem = "windows"]

use cropfe::app::CropFEApp;
use cropfe::logger;
use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 768.0])
            .with_title("CropFE"),
        ..Default::default()
    };

    eframe::run_native(
        "CropFE",
        options,
        Box::new(|_cc| {
            let mut app = CropFEApp::new();
            // An image already on the clipboard becomes the startup image.
            app.open_clipboard_on_startup();
            Box::new(app)
        }),
    )
}
