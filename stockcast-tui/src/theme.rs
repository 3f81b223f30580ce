//! Dashboard theme tokens.
//!
//! # Color Palette
//! - **Background**: deep charcoal
//! - **Accent**: electric cyan (focus, highlights)
//! - **Positive / Negative**: up and down candles
//! - **History**: blue historical close line
//! - **Forecast**: red forecast line, dimmed for its prediction band
//! - **Warning**: orange (degradations, loading)
//! - **Muted**: steel blue (secondary text)

use ratatui::style::{Color, Modifier, Style};

use stockcast_core::fundamentals::Recommendation;

pub const BACKGROUND: Color = Color::Rgb(18, 18, 20);
pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 200, 83);
pub const NEGATIVE: Color = Color::Rgb(229, 57, 53);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);
pub const HISTORY: Color = Color::Rgb(30, 136, 229);
pub const FORECAST: Color = Color::Rgb(255, 64, 64);

/// Palette handed to widgets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub accent: Color,
    /// Up candles.
    pub positive: Color,
    /// Down candles.
    pub negative: Color,
    pub warning: Color,
    pub neutral: Color,
    pub muted: Color,
    pub history: Color,
    pub forecast: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: BACKGROUND,
            accent: ACCENT,
            positive: POSITIVE,
            negative: NEGATIVE,
            warning: WARNING,
            neutral: NEUTRAL,
            muted: MUTED,
            history: HISTORY,
            forecast: FORECAST,
        }
    }
}

impl Theme {
    pub fn candle_color(&self, is_up: bool) -> Color {
        if is_up {
            self.positive
        } else {
            self.negative
        }
    }

    pub fn recommendation_color(&self, rec: Recommendation) -> Color {
        match rec {
            Recommendation::StrongBuy | Recommendation::Buy => self.positive,
            Recommendation::Hold => self.warning,
            Recommendation::Sell => self.negative,
            Recommendation::NotAvailable => self.muted,
        }
    }
}

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}
