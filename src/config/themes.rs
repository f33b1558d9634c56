use std::collections::HashMap;

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, std::hash::Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeName {
    Dark,
    Light,
    HighContrast,
    Solarized,
}

impl Default for ThemeName {
    fn default() -> Self {
        ThemeName::Dark
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Color,
    pub muted: Color,
    pub favorite: Color,
    pub active: Color,
    /// Background of a quote-jump destination while its highlight lasts
    pub quote_flash: Color,
    pub danger: Color,
    pub you: Color,
}

#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    palettes: HashMap<ThemeName, Palette>,
}

impl ThemeRegistry {
    pub fn contains(&self, theme: &ThemeName) -> bool {
        self.palettes.contains_key(theme)
    }

    pub fn palette(&self, theme: ThemeName) -> Palette {
        self.palettes
            .get(&theme)
            .copied()
            .unwrap_or_else(dark_palette)
    }

    pub fn all(&self) -> impl Iterator<Item = &ThemeName> {
        self.palettes.keys()
    }
}

fn dark_palette() -> Palette {
    Palette {
        accent: Color::Cyan,
        muted: Color::Gray,
        favorite: Color::Yellow,
        active: Color::Magenta,
        quote_flash: Color::Yellow,
        danger: Color::Red,
        you: Color::Green,
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        let palettes = [
            (ThemeName::Dark, dark_palette()),
            (
                ThemeName::Light,
                Palette {
                    accent: Color::Blue,
                    muted: Color::DarkGray,
                    favorite: Color::LightRed,
                    active: Color::Magenta,
                    quote_flash: Color::LightYellow,
                    danger: Color::Red,
                    you: Color::Green,
                },
            ),
            (
                ThemeName::HighContrast,
                Palette {
                    accent: Color::White,
                    muted: Color::White,
                    favorite: Color::LightYellow,
                    active: Color::LightMagenta,
                    quote_flash: Color::White,
                    danger: Color::LightRed,
                    you: Color::LightGreen,
                },
            ),
            (
                ThemeName::Solarized,
                Palette {
                    accent: Color::Rgb(38, 139, 210),
                    muted: Color::Rgb(147, 161, 161),
                    favorite: Color::Rgb(181, 137, 0),
                    active: Color::Rgb(211, 54, 130),
                    quote_flash: Color::Rgb(181, 137, 0),
                    danger: Color::Rgb(220, 50, 47),
                    you: Color::Rgb(133, 153, 0),
                },
            ),
        ]
        .into_iter()
        .collect();
        Self { palettes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_knows_every_theme() {
        let registry = ThemeRegistry::default();
        assert_eq!(registry.all().count(), 4);
        assert!(registry.contains(&ThemeName::HighContrast));
        assert_eq!(registry.palette(ThemeName::Dark).accent, Color::Cyan);
    }
}
