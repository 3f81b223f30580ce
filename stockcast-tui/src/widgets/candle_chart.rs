//! Candlestick widget.
//!
//! Renders using direct buffer writes:
//! - Each candle = 1 terminal column (the most recent bars win when the
//!   series is wider than the plot)
//! - Body: block char, green if close >= open, red otherwise
//! - Wicks: vertical line chars to high/low
//! - X axis: first and last visible timestamps

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Widget},
};

use stockcast_core::domain::PriceBar;

use crate::theme::Theme;

/// Y-axis label column width.
const LABEL_WIDTH: u16 = 9;

pub struct CandleChart<'a> {
    bars: &'a [PriceBar],
    title: &'a str,
    intraday: bool,
    theme: &'a Theme,
}

impl<'a> CandleChart<'a> {
    pub fn new(bars: &'a [PriceBar], title: &'a str, theme: &'a Theme) -> Self {
        Self {
            bars,
            title,
            intraday: false,
            theme,
        }
    }

    /// Label the x axis with times instead of dates.
    pub fn intraday(mut self, intraday: bool) -> Self {
        self.intraday = intraday;
        self
    }

    fn timestamp_label(&self, bar: &PriceBar) -> String {
        if self.intraday {
            bar.timestamp.format("%m-%d %H:%M").to_string()
        } else {
            bar.timestamp.format("%Y-%m-%d").to_string()
        }
    }
}

/// Map a price to a row in the plot area (0 = top).
fn price_to_y(price: f64, y_min: f64, y_max: f64, plot_height: u16) -> u16 {
    if (y_max - y_min).abs() < 1e-9 || plot_height == 0 {
        return 0;
    }
    let frac = (price - y_min) / (y_max - y_min);
    let y = plot_height.saturating_sub(1) as f64 * (1.0 - frac);
    y.round().clamp(0.0, plot_height.saturating_sub(1) as f64) as u16
}

impl<'a> Widget for CandleChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.bars.is_empty() {
            let block = Block::default()
                .title(format!(" {} [No Data] ", self.title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.muted))
                .style(Style::default().bg(self.theme.background));
            block.render(area, buf);
            return;
        }

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent))
            .style(Style::default().bg(self.theme.background));
        let inner = block.inner(area);
        block.render(area, buf);

        let plot_left = inner.x + LABEL_WIDTH;
        let plot_top = inner.y;
        let plot_width = inner.width.saturating_sub(LABEL_WIDTH);
        let plot_height = inner.height.saturating_sub(1);
        if plot_width == 0 || plot_height == 0 {
            return;
        }

        let start = self.bars.len().saturating_sub(plot_width as usize);
        let visible = &self.bars[start..];

        let y_min = visible.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let y_max = visible
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let range = y_max - y_min;
        let pad = if range > 0.0 { range * 0.05 } else { 1.0 };
        let y_lower = y_min - pad;
        let y_upper = y_max + pad;

        let muted = Style::default().fg(self.theme.muted);
        let y_labels = [y_upper, (y_upper + y_lower) / 2.0, y_lower];
        let y_rows = [0u16, plot_height / 2, plot_height.saturating_sub(1)];
        for (value, row) in y_labels.iter().zip(y_rows.iter()) {
            buf.set_string(inner.x, plot_top + row, format!("{value:>8.2}"), muted);
        }

        for (i, bar) in visible.iter().enumerate() {
            let x = plot_left + i as u16;
            if x >= inner.right() {
                break;
            }
            let is_up = bar.is_up();
            let style = Style::default().fg(self.theme.candle_color(is_up));

            let high_y = price_to_y(bar.high, y_lower, y_upper, plot_height);
            let low_y = price_to_y(bar.low, y_lower, y_upper, plot_height);
            let body_top = price_to_y(bar.open.max(bar.close), y_lower, y_upper, plot_height);
            let body_bot = price_to_y(bar.open.min(bar.close), y_lower, y_upper, plot_height);

            for y in high_y..body_top {
                buf.set_string(x, plot_top + y, "│", style);
            }
            let body = if is_up { "█" } else { "▓" };
            for y in body_top..=body_bot {
                buf.set_string(x, plot_top + y, body, style);
            }
            for y in (body_bot + 1)..=low_y {
                buf.set_string(x, plot_top + y, "│", style);
            }
        }

        // X axis: first and last visible timestamps.
        let axis_y = plot_top + plot_height;
        if axis_y < inner.bottom() {
            let first = self.timestamp_label(&visible[0]);
            buf.set_string(plot_left, axis_y, &first, muted);
            if let Some(last) = visible.last() {
                let last = self.timestamp_label(last);
                let width = last.chars().count() as u16;
                let x = inner.right().saturating_sub(width).max(plot_left + first.len() as u16 + 1);
                if x + width <= inner.right() {
                    buf.set_string(x, axis_y, &last, muted);
                }
            }
        }
    }
}
