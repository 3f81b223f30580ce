//! Stock Info page: fundamentals text, six-month history, valuation and
//! ratings bars.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use stockcast_core::fundamentals::FundamentalsPanel;

use crate::app::AppState;
use crate::theme::{self, Theme};
use crate::widgets::{BarList, PriceChart};

/// Illustrative ratings split. Not fetched; shown for every ticker.
pub const ANALYST_RATINGS: [(&str, f64); 4] = [
    ("Strong Buy", 35.0),
    ("Buy", 25.0),
    ("Hold", 30.0),
    ("Sell", 10.0),
];

const RATING_COLORS: [Color; 4] = [
    theme::POSITIVE,
    theme::ACCENT,
    theme::WARNING,
    theme::NEGATIVE,
];

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(view) = &app.info_view else {
        let msg = if app.is_loading() {
            "Loading..."
        } else {
            "Select a ticker and press Enter."
        };
        f.render_widget(Paragraph::new(Span::styled(msg, theme::muted())), area);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);
    let charts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Length(4),
            Constraint::Min(6),
        ])
        .split(columns[1]);

    f.render_widget(
        Paragraph::new(fundamentals_lines(&view.panel)).wrap(Wrap { trim: false }),
        columns[0],
    );

    let theme = Theme::default();
    let history_title = view.history_title();
    f.render_widget(
        PriceChart::new(&view.history, &history_title, &theme),
        charts[0],
    );

    let valuation_title = view.valuation_title();
    f.render_widget(
        BarList::new(&view.panel.valuation, &valuation_title, &theme),
        charts[1],
    );

    let ratings: Vec<(String, f64)> = ANALYST_RATINGS
        .iter()
        .map(|(label, share)| (label.to_string(), *share))
        .collect();
    let ratings_title = view.ratings_title();
    f.render_widget(
        BarList::new(&ratings, &ratings_title, &theme)
            .as_share()
            .colors(&RATING_COLORS),
        charts[2],
    );
}

/// One heading per section, then `label: value` rows. The recommendation
/// row is colored by its label.
pub fn fundamentals_lines(panel: &FundamentalsPanel) -> Vec<Line<'static>> {
    let theme = Theme::default();
    let mut lines = Vec::new();
    for section in &panel.sections {
        lines.push(Line::from(Span::styled(
            section.title.clone(),
            theme::accent_bold(),
        )));
        for row in &section.rows {
            let value_style = if row.label == "Current Recommendation" {
                Style::default().fg(theme.recommendation_color(panel.recommendation))
            } else {
                theme::accent()
            };
            lines.push(Line::from(vec![
                Span::styled(format!("  {}: ", row.label), theme::muted()),
                Span::styled(row.value.clone(), value_style),
            ]));
        }
        lines.push(Line::from(""));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockcast_core::fundamentals::{Recommendation, Snapshot};

    fn flatten(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect()
    }

    #[test]
    fn empty_snapshot_shows_not_available() {
        let panel = FundamentalsPanel::build("AAPL", &Snapshot::default());
        let lines = fundamentals_lines(&panel);
        let text = flatten(&lines);
        assert!(text.contains(&"Basic Information".to_string()));
        assert!(text.contains(&"  Company Name: N/A".to_string()));
        assert!(text.contains(&"  Current Recommendation: N/A".to_string()));
    }

    #[test]
    fn recommendation_row_is_colored() {
        let mut panel = FundamentalsPanel::build("AAPL", &Snapshot::default());
        panel.recommendation = Recommendation::Hold;
        let lines = fundamentals_lines(&panel);
        let row = lines
            .iter()
            .find(|l| l.spans.first().is_some_and(|s| s.content.contains("Current Recommendation")))
            .unwrap();
        assert_eq!(row.spans[1].style.fg, Some(theme::WARNING));
    }

    #[test]
    fn ratings_sum_to_100() {
        let total: f64 = ANALYST_RATINGS.iter().map(|(_, v)| v).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }
}
