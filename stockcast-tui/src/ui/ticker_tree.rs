//! Sector/ticker picker column.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, TreeItem};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(false))
        .title(" Tickers ")
        .title_style(theme::panel_title(false));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = app.tree.rows();
    // Keep the cursor row on screen.
    let height = inner.height as usize;
    let skip = if height == 0 {
        0
    } else {
        app.tree.cursor.saturating_sub(height - 1)
    };

    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .skip(skip)
        .take(height)
        .map(|(row, item)| {
            let is_cursor = row == app.tree.cursor;
            match item {
                TreeItem::Sector(sector) => {
                    let expanded = app.tree.expanded_sectors.contains(sector);
                    let arrow = if expanded { "▾" } else { "▸" };
                    let count = app
                        .tree
                        .universe
                        .sector_tickers(sector)
                        .map_or(0, |t| t.len());
                    let style = if is_cursor {
                        theme::accent().add_modifier(Modifier::REVERSED)
                    } else {
                        theme::neutral()
                    };
                    Line::from(Span::styled(format!("{arrow} {sector} ({count})"), style))
                }
                TreeItem::Ticker(_, ticker) => {
                    let is_current = *ticker == app.ticker;
                    let style = if is_cursor {
                        theme::accent().add_modifier(Modifier::REVERSED)
                    } else if is_current {
                        theme::accent_bold()
                    } else {
                        theme::muted()
                    };
                    let marker = if is_current { "● " } else { "  " };
                    Line::from(vec![
                        Span::raw("  "),
                        Span::styled(marker, theme::positive()),
                        Span::styled(ticker.as_str(), style),
                    ])
                }
            }
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}
