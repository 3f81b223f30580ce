//! Horizontal labelled bars, used for valuation ratios and the ratings share.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Widget},
};

use crate::theme::Theme;

pub struct BarList<'a> {
    items: &'a [(String, f64)],
    title: &'a str,
    /// Render values as percentages of the total instead of raw numbers.
    as_share: bool,
    colors: &'a [Color],
    theme: &'a Theme,
}

impl<'a> BarList<'a> {
    pub fn new(items: &'a [(String, f64)], title: &'a str, theme: &'a Theme) -> Self {
        Self {
            items,
            title,
            as_share: false,
            colors: &[],
            theme,
        }
    }

    pub fn as_share(mut self) -> Self {
        self.as_share = true;
        self
    }

    /// Per-row colors, cycled. Defaults to the accent color.
    pub fn colors(mut self, colors: &'a [Color]) -> Self {
        self.colors = colors;
        self
    }

    fn value_label(&self, value: f64, total: f64) -> String {
        if self.as_share && total > 0.0 {
            format!("{:.1}%", value / total * 100.0)
        } else {
            format!("{value:.2}")
        }
    }
}

impl<'a> Widget for BarList<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent))
            .style(Style::default().bg(self.theme.background));
        let inner = block.inner(area);
        block.render(area, buf);

        let muted = Style::default().fg(self.theme.muted);
        if self.items.is_empty() {
            if inner.height > 0 {
                buf.set_string(inner.x, inner.y, "No data", muted);
            }
            return;
        }

        let total: f64 = self.items.iter().map(|(_, v)| v.max(0.0)).sum();
        let max = self
            .items
            .iter()
            .map(|(_, v)| *v)
            .fold(0.0_f64, f64::max);
        let label_width = self
            .items
            .iter()
            .map(|(l, _)| l.chars().count())
            .max()
            .unwrap_or(0) as u16
            + 1;
        let value_width: u16 = 10;
        let bar_space = inner.width.saturating_sub(label_width + value_width);

        for (i, (label, value)) in self.items.iter().enumerate() {
            let y = inner.y + i as u16;
            if y >= inner.bottom() {
                break;
            }
            let color = if self.colors.is_empty() {
                self.theme.accent
            } else {
                self.colors[i % self.colors.len()]
            };
            buf.set_string(inner.x, y, label, muted);

            let filled = if max > 0.0 && *value > 0.0 {
                ((value / max) * bar_space as f64).round().max(1.0) as u16
            } else {
                0
            };
            let bar_x = inner.x + label_width;
            if filled > 0 && bar_x < inner.right() {
                buf.set_string(
                    bar_x,
                    y,
                    "█".repeat(filled as usize),
                    Style::default().fg(color),
                );
            }
            let value_x = bar_x + filled + 1;
            if value_x < inner.right() {
                buf.set_string(value_x, y, self.value_label(*value, total), muted);
            }
        }
    }
}
