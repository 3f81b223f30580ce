//! Stock Data page: period buttons, candlesticks, and the forecast chart.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use stockcast_core::period::PeriodSelection;

use crate::app::AppState;
use crate::theme::{self, Theme};
use crate::widgets::{CandleChart, PriceChart};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Percentage(50),
            Constraint::Min(5),
        ])
        .split(area);

    f.render_widget(Paragraph::new(period_buttons(app)), chunks[0]);

    let Some(view) = &app.data_view else {
        let msg = if app.is_loading() {
            "Loading..."
        } else {
            "Select a ticker and press Enter."
        };
        f.render_widget(
            Paragraph::new(Span::styled(msg, theme::muted())),
            chunks[1],
        );
        return;
    };

    let theme = Theme::default();
    let candle_title = view.candle_title();
    f.render_widget(
        CandleChart::new(view.series.bars(), &candle_title, &theme)
            .intraday(view.interval.is_intraday()),
        chunks[1],
    );

    let note = (view.has_data() && view.forecast.is_none()).then_some("forecast unavailable");
    f.render_widget(
        PriceChart::new(&view.series, view.forecast_title(), &theme)
            .forecast(
                view.axis.as_ref(),
                &view.forecast_trace,
                view.forecast.as_ref(),
            )
            .note(note),
        chunks[2],
    );
}

/// `[24h] [5d] [1mo] [max]` with the active period highlighted.
fn period_buttons(app: &AppState) -> Line<'static> {
    let mut spans = vec![Span::styled("Period: ", theme::muted())];
    for selection in PeriodSelection::ALL {
        let style = if selection == app.period {
            theme::accent_bold().add_modifier(Modifier::REVERSED)
        } else {
            theme::muted()
        };
        spans.push(Span::styled(format!("[{}]", selection.label()), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled("  [ ]:change period", theme::muted()));
    if let Some(view) = &app.data_view {
        spans.push(Span::styled(
            format!("  source: {}", view.source.label()),
            theme::muted(),
        ));
    }
    Line::from(spans)
}
