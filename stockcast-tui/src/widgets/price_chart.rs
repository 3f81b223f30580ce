//! Close-price line chart with an optional forecast overlay.
//!
//! The whole close history is always plotted. With a [`DisplayAxis`] the x
//! range runs on to the last forecast day and is labelled at the month-start
//! anchors. Forecast values are drawn as a
//! dotted red trace at the axis' forecast days, with the prediction band as
//! dimmed dots when present.

use chrono::NaiveDateTime;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};

use stockcast_core::align::DisplayAxis;
use stockcast_core::domain::{ForecastSeries, PriceSeries};

use crate::theme::Theme;

pub struct PriceChart<'a> {
    series: &'a PriceSeries,
    title: &'a str,
    axis: Option<&'a DisplayAxis>,
    trace: &'a [(NaiveDateTime, f64)],
    forecast: Option<&'a ForecastSeries>,
    note: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> PriceChart<'a> {
    pub fn new(series: &'a PriceSeries, title: &'a str, theme: &'a Theme) -> Self {
        Self {
            series,
            title,
            axis: None,
            trace: &[],
            forecast: None,
            note: None,
            theme,
        }
    }

    /// Extend the x range to `axis` and overlay `trace` (forecast values at the axis' forecast days).
    pub fn forecast(
        mut self,
        axis: Option<&'a DisplayAxis>,
        trace: &'a [(NaiveDateTime, f64)],
        forecast: Option<&'a ForecastSeries>,
    ) -> Self {
        self.axis = axis;
        self.trace = trace;
        self.forecast = forecast;
        self
    }

    /// Text appended to the title, e.g. why the overlay is missing.
    pub fn note(mut self, note: Option<&'a str>) -> Self {
        self.note = note;
        self
    }
}

fn days_between(origin: NaiveDateTime, t: NaiveDateTime) -> f64 {
    (t - origin).num_seconds() as f64 / 86_400.0
}

/// X range: first bar through the later of the last bar and the last
/// forecast day.
fn x_window(
    first: NaiveDateTime,
    last: NaiveDateTime,
    axis: Option<&DisplayAxis>,
) -> (NaiveDateTime, NaiveDateTime) {
    let end = axis
        .and_then(|a| a.forecast_days().last().copied())
        .map_or(last, |t| t.max(last));
    (first, end)
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<[f64; 2]> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return None;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    Some([lo - pad, hi + pad])
}

impl<'a> Widget for PriceChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = match self.note {
            Some(note) => format!(" {} ({note}) ", self.title),
            None => format!(" {} ", self.title),
        };

        let (Some(first), Some(last)) = (self.series.first_timestamp(), self.series.last_timestamp())
        else {
            let block = Block::default()
                .title(format!(" {} [No Data] ", self.title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.muted))
                .style(Style::default().bg(self.theme.background));
            Paragraph::new(Span::styled(
                "No price data for this selection.",
                Style::default().fg(self.theme.muted),
            ))
            .block(block)
            .render(area, buf);
            return;
        };

        let (start, end) = x_window(first, last, self.axis);
        let origin = start;
        let x_bounds = [0.0, days_between(origin, end).max(1e-6)];

        let history: Vec<(f64, f64)> = self
            .series
            .bars()
            .iter()
            .map(|b| (days_between(origin, b.timestamp), b.close))
            .collect();
        let trace: Vec<(f64, f64)> = self
            .trace
            .iter()
            .map(|(t, v)| (days_between(origin, *t), *v))
            .collect();
        let (lower, upper): (Vec<(f64, f64)>, Vec<(f64, f64)>) = self
            .forecast
            .map(|f| {
                f.points
                    .iter()
                    .filter_map(|p| {
                        let x = days_between(origin, p.timestamp);
                        p.band.map(|b| ((x, b.lower), (x, b.upper)))
                    })
                    .unzip()
            })
            .unwrap_or_default();

        let y_bounds = bounds(
            history
                .iter()
                .chain(trace.iter())
                .chain(lower.iter())
                .chain(upper.iter())
                .map(|(_, y)| *y),
        )
        .unwrap_or([0.0, 1.0]);

        let mut datasets = vec![Dataset::default()
            .name("Historical")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(self.theme.history))
            .data(&history)];
        if !trace.is_empty() {
            datasets.push(
                Dataset::default()
                    .name("Forecast")
                    .marker(symbols::Marker::Dot)
                    .graph_type(GraphType::Scatter)
                    .style(Style::default().fg(self.theme.forecast))
                    .data(&trace),
            );
        }
        let band_style = Style::default()
            .fg(self.theme.forecast)
            .add_modifier(Modifier::DIM);
        for band in [&lower, &upper] {
            if !band.is_empty() {
                datasets.push(
                    Dataset::default()
                        .marker(symbols::Marker::Braille)
                        .graph_type(GraphType::Scatter)
                        .style(band_style)
                        .data(band),
                );
            }
        }

        let muted = Style::default().fg(self.theme.muted);
        let x_labels: Vec<Span> = match self.axis {
            Some(axis) => std::iter::once(start)
                .chain(axis.anchors().iter().copied().filter(|t| *t > start && *t < end))
                .map(|t| t.format("%b %d").to_string())
                .chain(std::iter::once(end.format("%b %d").to_string()))
                .map(|s| Span::styled(s, muted))
                .collect(),
            None => [start, start + (end - start) / 2, end]
                .iter()
                .map(|t| Span::styled(t.format("%Y-%m-%d").to_string(), muted))
                .collect(),
        };
        let y_labels: Vec<Span> = [y_bounds[0], (y_bounds[0] + y_bounds[1]) / 2.0, y_bounds[1]]
            .iter()
            .map(|v| Span::styled(format!("{v:.2}"), muted))
            .collect();

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent))
            .style(Style::default().bg(self.theme.background));

        Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .style(muted)
                    .bounds(x_bounds)
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .title(Span::styled("Price", muted))
                    .style(muted)
                    .bounds(y_bounds)
                    .labels(y_labels),
            )
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use stockcast_core::align::build_display_axis;
    use stockcast_core::domain::PriceBar;
    use stockcast_core::forecast::forecast;

    fn series(n: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut level = 100.0;
        let bars = (0..n)
            .map(|i| {
                level += (i as f64 * 0.9).sin() * 1.5 + ((i * 13 % 7) as f64 - 3.0) * 0.3;
                PriceBar {
                    timestamp: start + Duration::days(i as i64),
                    open: level,
                    high: level + 1.0,
                    low: level - 1.0,
                    close: level,
                    volume: 1_000,
                }
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    fn render(chart: PriceChart<'_>) -> Buffer {
        let area = Rect::new(0, 0, 100, 30);
        let mut buf = Buffer::empty(area);
        chart.render(area, &mut buf);
        buf
    }

    fn text(buf: &Buffer) -> String {
        let area = buf.area;
        let mut out = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                out.push_str(buf.cell((x, y)).unwrap().symbol());
            }
            out.push('\n');
        }
        out
    }

    fn has_fg(buf: &Buffer, color: ratatui::style::Color) -> bool {
        buf.content().iter().any(|c| c.fg == color)
    }

    #[test]
    fn forecast_overlay_is_drawn() {
        let theme = Theme::default();
        let s = series(150);
        let fc = forecast(&s, 30).unwrap();
        let axis = build_display_axis(&s, 30, 4);
        let trace = axis.pair_forecast(&fc);

        let buf = render(
            PriceChart::new(&s, "Stock Price Forecast (ARIMA)", &theme)
                .forecast(Some(&axis), &trace, Some(&fc)),
        );
        assert!(text(&buf).contains("Stock Price Forecast (ARIMA)"));
        assert!(has_fg(&buf, theme.history));
        assert!(has_fg(&buf, theme.forecast));
    }

    #[test]
    fn history_only_when_forecast_missing() {
        let theme = Theme::default();
        let s = series(10);
        let axis = build_display_axis(&s, 30, 4);
        let buf = render(
            PriceChart::new(&s, "Stock Price Forecast (ARIMA)", &theme)
                .forecast(Some(&axis), &[], None)
                .note(Some("forecast unavailable")),
        );
        assert!(text(&buf).contains("(forecast unavailable)"));
        assert!(has_fg(&buf, theme.history));
        assert!(!has_fg(&buf, theme.forecast));
    }

    #[test]
    fn empty_series_renders_placeholder() {
        let theme = Theme::default();
        let s = PriceSeries::empty();
        let buf = render(PriceChart::new(&s, "AAPL Stock Price History (Last 6 months)", &theme));
        let t = text(&buf);
        assert!(t.contains("[No Data]"));
        assert!(t.contains("No price data"));
    }

    #[test]
    fn single_bar_does_not_panic() {
        let theme = Theme::default();
        let s = series(1);
        render(PriceChart::new(&s, "one", &theme));
    }

    #[test]
    fn window_keeps_history_before_first_anchor() {
        let s = series(150);
        let axis = build_display_axis(&s, 30, 4);
        let first = s.first_timestamp().unwrap();
        let last = s.last_timestamp().unwrap();
        assert!(axis.anchors()[0] > first);

        let (start, end) = x_window(first, last, Some(&axis));
        assert_eq!(start, first);
        assert_eq!(end, *axis.forecast_days().last().unwrap());
        assert_eq!(x_window(first, last, None), (first, last));
    }

    #[test]
    fn bounds_pad_flat_ranges() {
        assert_eq!(bounds([5.0, 5.0].into_iter()), Some([4.0, 6.0]));
        assert_eq!(bounds(std::iter::empty()), None);
        assert_eq!(bounds([f64::NAN].into_iter()), None);
    }
}
