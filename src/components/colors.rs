use eframe::egui;
use egui::Color32;

// ============================================================================
// ColorDialog — modal color picker seeded with the last sampled color
// ============================================================================

/// Modal color-picker window. Opened on click in color-pick mode with the
/// last sampled color; shows an editable swatch plus hex and RGB fields.
pub struct ColorDialog {
    pub open: bool,
    color: Color32,
    hex_field: String,
    rgb_field: String,
}

impl Default for ColorDialog {
    fn default() -> Self {
        // Red matches the picker's pre-sample default.
        let color = Color32::from_rgb(255, 0, 0);
        Self {
            open: false,
            color,
            hex_field: color_to_hex(color),
            rgb_field: color_to_rgb_string(color),
        }
    }
}

impl ColorDialog {
    /// Open the dialog seeded with `color` (the last picked color).
    pub fn open_with(&mut self, color: Color32) {
        self.set_color(color);
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    fn set_color(&mut self, color: Color32) {
        self.color = color;
        self.hex_field = color_to_hex(color);
        self.rgb_field = color_to_rgb_string(color);
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        if !self.open {
            return;
        }
        let mut open = self.open;
        egui::Window::new("Color Picker")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                let mut color = self.color;
                if ui.color_edit_button_srgba(&mut color).changed() {
                    self.set_color(color);
                }

                ui.separator();

                egui::Grid::new("color_fields").num_columns(2).show(ui, |ui| {
                    ui.label("Hex");
                    let hex_response = ui.text_edit_singleline(&mut self.hex_field);
                    if hex_response.changed()
                        && let Some(parsed) = parse_hex(&self.hex_field)
                    {
                        self.color = parsed;
                        self.rgb_field = color_to_rgb_string(parsed);
                    }
                    ui.end_row();

                    ui.label("RGB");
                    // Display-only, mirrors the current color.
                    ui.add_enabled(
                        false,
                        egui::TextEdit::singleline(&mut self.rgb_field),
                    );
                    ui.end_row();
                });

                ui.separator();

                let (rect, _) = ui.allocate_exact_size(
                    egui::vec2(ui.available_width(), 24.0),
                    egui::Sense::hover(),
                );
                ui.painter().rect_filled(rect, 2.0, self.color);
            });
        self.open = open;
    }
}

/// `#rrggbb` form of a color.
pub fn color_to_hex(c: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", c.r(), c.g(), c.b())
}

/// `rgba(r,g,b,1)` form of a color.
pub fn color_to_rgb_string(c: Color32) -> String {
    format!("rgba({},{},{},1)", c.r(), c.g(), c.b())
}

/// Parse `#rrggbb` or `rrggbb` into a color.
pub fn parse_hex(text: &str) -> Option<Color32> {
    let hex = text.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color32::from_rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_formatting_and_parsing_round_trip() {
        let c = Color32::from_rgb(18, 52, 86);
        assert_eq!(color_to_hex(c), "#123456");
        assert_eq!(parse_hex("#123456"), Some(c));
        assert_eq!(parse_hex("123456"), Some(c));
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#12345g"), None);
        assert_eq!(parse_hex(""), None);
    }

    #[test]
    fn rgb_string_matches_swatch_format() {
        assert_eq!(
            color_to_rgb_string(Color32::from_rgb(255, 0, 128)),
            "rgba(255,0,128,1)"
        );
    }

    #[test]
    fn opening_seeds_all_fields_from_the_picked_color() {
        let mut dialog = ColorDialog::default();
        dialog.open_with(Color32::from_rgb(1, 2, 3));

        assert!(dialog.is_open());
        assert_eq!(dialog.color(), Color32::from_rgb(1, 2, 3));
        assert_eq!(dialog.hex_field, "#010203");
        assert_eq!(dialog.rgb_field, "rgba(1,2,3,1)");
    }

    #[test]
    fn default_color_is_red() {
        let dialog = ColorDialog::default();
        assert_eq!(dialog.color(), Color32::from_rgb(255, 0, 0));
    }
}
