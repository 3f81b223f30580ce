//! Help page: keyboard shortcuts.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, _app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Global Navigation");
    key(&mut lines, "1 / 2 / 3", "Stock Data / Stock Info / Help");
    key(&mut lines, "Tab / Shift+Tab", "Cycle pages forward / back");
    key(&mut lines, "q / Ctrl+C", "Quit");
    lines.push(Line::from(""));

    section(&mut lines, "Ticker Tree");
    key(&mut lines, "j / k", "Move cursor down / up");
    key(&mut lines, "h / l", "Collapse / expand sector");
    key(&mut lines, "Enter", "Load ticker, or toggle sector");
    lines.push(Line::from(""));

    section(&mut lines, "Stock Data");
    key(&mut lines, "] / [", "Next / previous period (24h, 5d, 1mo, max)");
    key(&mut lines, "r", "Clear caches and reload");
    key(&mut lines, "", "Candlesticks on top, ARIMA forecast below");
    key(&mut lines, "", "Red dots: forecast; dim dots: prediction band");
    lines.push(Line::from(""));

    section(&mut lines, "Stock Info");
    key(&mut lines, "", "Fundamentals, six-month history, valuation ratios");
    key(&mut lines, "", "Missing fields show N/A");
    lines.push(Line::from(""));

    section(&mut lines, "Errors");
    key(&mut lines, "e", "Open error history overlay");

    f.render_widget(Paragraph::new(lines), area);
}

fn section<'a>(lines: &mut Vec<Line<'a>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key<'a>(lines: &mut Vec<Line<'a>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>16}  ", keys), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
