//! Colors for the dashboard, plus the row styles of the ranked table.

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub primary: Color,
    pub primary_background: Color,
    pub accent: Color,
    pub warning: Color,
    pub error: Color,
    pub success: Color,
    pub foreground: Color,
    pub background: Color,
    pub surface: Color,
}

impl Theme {
    pub const fn dark() -> Self {
        Self {
            primary: Color::from_u32(0x00ffff),
            primary_background: Color::from_u32(0x225555),
            accent: Color::from_u32(0xffaa22),
            warning: Color::from_u32(0xffdd55),
            error: Color::from_u32(0xff4444),
            success: Color::from_u32(0x00ff00),
            foreground: Color::from_u32(0xeeeeee),
            background: Color::from_u32(0x111111),
            surface: Color::from_u32(0x222222),
        }
    }

    /// Style of the `index`th ranked row. Hot rows stand out in the error
    /// color; the rest alternate between two shades of the surface.
    pub fn row_style(&self, index: usize, hot: bool) -> Style {
        let background = if index % 2 == 0 {
            self.surface
        } else {
            Self::lighten(self.surface, 0.05)
        };
        let style = Style::default().bg(background);
        if hot {
            style.fg(self.error).add_modifier(Modifier::BOLD)
        } else {
            style.fg(self.foreground)
        }
    }

    pub fn selected_style(&self) -> Style {
        Style::default()
            .bg(Self::darken(self.primary, 0.6))
            .add_modifier(Modifier::REVERSED)
    }

    /// Lighten a color by blending with white
    /// factor should be between 0.0 (no change) and 1.0 (white)
    pub fn lighten(color: Color, factor: f32) -> Color {
        let factor = factor.clamp(0.0, 1.0);
        match color {
            Color::Rgb(r, g, b) => {
                let r = r as f32 + (255.0 - r as f32) * factor;
                let g = g as f32 + (255.0 - g as f32) * factor;
                let b = b as f32 + (255.0 - b as f32) * factor;
                Color::Rgb(r as u8, g as u8, b as u8)
            }
            _ => color,
        }
    }

    /// Darken a color by blending with black
    /// factor should be between 0.0 (no change) and 1.0 (black)
    pub fn darken(color: Color, factor: f32) -> Color {
        let factor = factor.clamp(0.0, 1.0);
        match color {
            Color::Rgb(r, g, b) => {
                let r = r as f32 * (1.0 - factor);
                let g = g as f32 * (1.0 - factor);
                let b = b as f32 * (1.0 - factor);
                Color::Rgb(r as u8, g as u8, b as u8)
            }
            _ => color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lighten() {
        let black = Color::Rgb(0, 0, 0);
        let lightened = Theme::lighten(black, 0.5);
        assert_eq!(lightened, Color::Rgb(127, 127, 127));
    }

    #[test]
    fn test_darken() {
        let white = Color::Rgb(255, 255, 255);
        let darkened = Theme::darken(white, 0.5);
        assert_eq!(darkened, Color::Rgb(127, 127, 127));
    }

    #[test]
    fn hot_rows_use_the_error_color() {
        let theme = Theme::dark();
        assert_eq!(theme.row_style(0, true).fg, Some(theme.error));
        assert_eq!(theme.row_style(1, false).fg, Some(theme.foreground));
        assert_ne!(theme.row_style(0, false).bg, theme.row_style(1, false).bg);
    }
}
