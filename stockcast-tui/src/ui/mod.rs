//! Top-level UI layout: ticker tree, active page, status bar, overlays.

pub mod help_page;
pub mod overlays;
pub mod status_bar;
pub mod stock_data;
pub mod stock_info;
pub mod ticker_tree;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::app::{AppState, Overlay, Page};
use crate::theme;

/// Width of the ticker tree column.
pub const TREE_WIDTH: u16 = 24;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());
    let main_area = chunks[0];
    let status_area = chunks[1];

    if app.page == Page::Help {
        draw_page(f, main_area, app);
    } else {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(TREE_WIDTH), Constraint::Min(10)])
            .split(main_area);
        ticker_tree::render(f, columns[0], app);
        draw_page(f, columns[1], app);
    }

    status_bar::render(f, status_area, app);

    match app.overlay {
        Overlay::Welcome => overlays::render_welcome(f, main_area),
        Overlay::ErrorHistory => overlays::render_error_history(f, main_area, app),
        Overlay::None => {}
    }
    if let Some(req) = &app.pending {
        overlays::render_loading(f, main_area, req);
    }
}

/// Draw the active page with its border.
fn draw_page(f: &mut Frame, area: Rect, app: &AppState) {
    let page = app.page;
    let title = match page {
        Page::Help => format!(" {} [{}] ", page.label(), page.index() + 1),
        _ => format!(" {} [{}] {} ", page.label(), page.index() + 1, app.ticker),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(title)
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    match page {
        Page::StockData => stock_data::render(f, inner, app),
        Page::StockInfo => stock_info::render(f, inner, app),
        Page::Help => help_page::render(f, inner, app),
    }
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_is_inside() {
        let area = Rect::new(0, 0, 100, 50);
        let r = centered_rect(60, 40, area);
        assert_eq!(r.width, 60);
        assert_eq!(r.height, 20);
        assert_eq!(r.x, 20);
        assert_eq!(r.y, 15);
    }
}
