use std::collections::HashMap;

use ratatui::style::Color;

use crate::model::{Theme, UiConfig};

/// Resolved colors for one theme
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    pub red: Color,
    pub yellow: Color,
    pub green: Color,
    pub selection_bg: Color,
    pub gauge: Color,
}

impl Palette {
    pub fn dark() -> Self {
        Palette {
            background: Color::Rgb(0x0C, 0x00, 0x1B),
            text: Color::Rgb(0xB0, 0xAA, 0xFF),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0xFB, 0x41, 0x96),
            dim: Color::Rgb(0x7D, 0x78, 0xBF),
            red: Color::Rgb(0xFF, 0x44, 0x44),
            yellow: Color::Rgb(0xFF, 0xD7, 0x00),
            green: Color::Rgb(0x44, 0xFF, 0x88),
            selection_bg: Color::Rgb(0x3D, 0x14, 0x38),
            gauge: Color::Rgb(0x44, 0xDD, 0xFF),
        }
    }

    pub fn light() -> Self {
        Palette {
            background: Color::Rgb(0xFA, 0xFA, 0xFA),
            text: Color::Rgb(0x2A, 0x25, 0x40),
            text_bright: Color::Rgb(0x00, 0x00, 0x00),
            highlight: Color::Rgb(0xC2, 0x18, 0x5B),
            dim: Color::Rgb(0x8A, 0x86, 0x9E),
            red: Color::Rgb(0xC6, 0x28, 0x28),
            yellow: Color::Rgb(0xB2, 0x82, 0x00),
            green: Color::Rgb(0x2E, 0x7D, 0x32),
            selection_bg: Color::Rgb(0xE8, 0xDD, 0xF5),
            gauge: Color::Rgb(0x15, 0x65, 0xC0),
        }
    }

    /// Built-in palette for `theme` with the matching `[ui.dark]` /
    /// `[ui.light]` overrides applied.
    pub fn for_theme(theme: Theme, ui: &UiConfig) -> Self {
        let (mut palette, overrides) = match theme {
            Theme::Dark => (Palette::dark(), &ui.dark),
            Theme::Light => (Palette::light(), &ui.light),
        };
        palette.apply_overrides(overrides);
        palette
    }

    fn apply_overrides(&mut self, overrides: &HashMap<String, String>) {
        for (key, value) in overrides {
            let Some(color) = parse_hex_color(value) else {
                continue;
            };
            match key.as_str() {
                "background" => self.background = color,
                "text" => self.text = color,
                "text_bright" => self.text_bright = color,
                "highlight" => self.highlight = color,
                "dim" => self.dim = color,
                "red" => self.red = color,
                "yellow" => self.yellow = color,
                "green" => self.green = color,
                "selection_bg" => self.selection_bg = color,
                "gauge" => self.gauge = color,
                _ => {}
            }
        }
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF4444"), Some(Color::Rgb(0xFF, 0x44, 0x44)));
        assert_eq!(parse_hex_color("FF4444"), None);
        assert_eq!(parse_hex_color("#FF44"), None);
        assert_eq!(parse_hex_color("#ZZZZZZ"), None);
    }

    #[test]
    fn test_theme_selects_palette() {
        let ui = UiConfig::default();
        assert_eq!(Palette::for_theme(Theme::Dark, &ui), Palette::dark());
        assert_eq!(Palette::for_theme(Theme::Light, &ui), Palette::light());
        assert_ne!(Palette::dark().background, Palette::light().background);
    }

    #[test]
    fn test_overrides_apply_only_to_their_theme() {
        let mut ui = UiConfig::default();
        ui.light.insert("background".into(), "#FFFFFF".into());
        ui.light.insert("bogus".into(), "#000000".into());
        ui.light.insert("text".into(), "not a color".into());

        let light = Palette::for_theme(Theme::Light, &ui);
        assert_eq!(light.background, Color::Rgb(0xFF, 0xFF, 0xFF));
        assert_eq!(light.text, Palette::light().text);
        assert_eq!(Palette::for_theme(Theme::Dark, &ui), Palette::dark());
    }
}
