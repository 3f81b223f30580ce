//! Keyboard input dispatch: overlays, then global keys, then the ticker tree.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use stockcast_core::period::PeriodSelection;

use crate::app::{AppState, Overlay, Page, TreeItem};

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Windows reports both Press and Release.
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    match app.overlay {
        Overlay::Welcome => {
            app.overlay = Overlay::None;
            return;
        }
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::None => {}
    }

    // 2. Global keys.
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.running = false;
            return;
        }
        KeyCode::Char('1') => return app.select_page(Page::StockData),
        KeyCode::Char('2') => return app.select_page(Page::StockInfo),
        KeyCode::Char('3') | KeyCode::Char('?') => return app.select_page(Page::Help),
        KeyCode::Tab => {
            let page = if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.page.prev()
            } else {
                app.page.next()
            };
            return app.select_page(page);
        }
        KeyCode::BackTab => return app.select_page(app.page.prev()),
        KeyCode::Char('e') => {
            app.overlay = Overlay::ErrorHistory;
            app.error_scroll = 0;
            return;
        }
        KeyCode::Char('r') => {
            app.request_refresh();
            app.set_status("Refreshing...");
            return;
        }
        KeyCode::Char(']') => return app.select_period(next_period(app.period)),
        KeyCode::Char('[') => return app.select_period(prev_period(app.period)),
        _ => {}
    }

    // 3. Ticker tree (every page but Help).
    if app.page.loads_data() {
        handle_tree_key(app, key);
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_tree_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.tree.move_down(),
        KeyCode::Char('k') | KeyCode::Up => app.tree.move_up(),
        KeyCode::Char('l') | KeyCode::Right => {
            if let Some(TreeItem::Sector(name)) = app.tree.cursor_item() {
                app.tree.expand(&name);
            }
        }
        KeyCode::Char('h') | KeyCode::Left => match app.tree.cursor_item() {
            Some(TreeItem::Sector(name)) | Some(TreeItem::Ticker(name, _)) => {
                app.tree.collapse(&name)
            }
            None => {}
        },
        KeyCode::Enter => match app.tree.cursor_item() {
            Some(TreeItem::Sector(name)) => {
                if app.tree.expanded_sectors.contains(&name) {
                    app.tree.collapse(&name);
                } else {
                    app.tree.expand(&name);
                }
            }
            Some(TreeItem::Ticker(_, ticker)) => app.select_ticker(&ticker),
            None => {}
        },
        _ => {}
    }
}

fn next_period(p: PeriodSelection) -> PeriodSelection {
    let all = PeriodSelection::ALL;
    let i = all.iter().position(|x| *x == p).unwrap_or(0);
    all[(i + 1) % all.len()]
}

fn prev_period(p: PeriodSelection) -> PeriodSelection {
    let all = PeriodSelection::ALL;
    let i = all.iter().position(|x| *x == p).unwrap_or(0);
    all[(i + all.len() - 1) % all.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use stockcast_core::data::Universe;

    fn press(app: &mut AppState, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn app() -> AppState {
        AppState::new(Universe::builtin(), PathBuf::from("."))
    }

    #[test]
    fn quit_key() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }

    #[test]
    fn welcome_swallows_first_key() {
        let mut app = app();
        app.overlay = Overlay::Welcome;
        press(&mut app, KeyCode::Char('q'));
        assert!(app.running);
        assert_eq!(app.overlay, Overlay::None);
    }

    #[test]
    fn period_keys_cycle_and_wrap() {
        let mut app = app();
        assert_eq!(app.period, PeriodSelection::Max);
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.period, PeriodSelection::Day);
        press(&mut app, KeyCode::Char('['));
        assert_eq!(app.period, PeriodSelection::Max);
        press(&mut app, KeyCode::Char('['));
        assert_eq!(app.period, PeriodSelection::Month);
        assert!(app.is_loading());
    }

    #[test]
    fn enter_on_ticker_selects_it() {
        let mut app = app();
        app.tree.focus("MSFT");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ticker, "MSFT");
        assert_eq!(app.pending.as_ref().unwrap().ticker, "MSFT");
    }

    #[test]
    fn page_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.page, Page::StockInfo);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.page, Page::Help);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.page, Page::StockInfo);
    }

    #[test]
    fn refresh_queues_cache_clear() {
        let mut app = app();
        press(&mut app, KeyCode::Char('r'));
        assert!(app.pending.as_ref().unwrap().refresh);
    }

    #[test]
    fn error_overlay_scrolls_within_bounds() {
        let mut app = app();
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.overlay, Overlay::ErrorHistory);
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.error_scroll, 0);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.overlay, Overlay::None);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn key_code() -> impl Strategy<Value = KeyCode> {
            prop_oneof![
                prop::sample::select(vec!['j', 'k', 'h', 'l', '1', '2', '3', '[', ']', 'e', 'r', 'x'])
                    .prop_map(KeyCode::Char),
                Just(KeyCode::Enter),
                Just(KeyCode::Esc),
                Just(KeyCode::Tab),
                Just(KeyCode::BackTab),
                Just(KeyCode::Up),
                Just(KeyCode::Down),
            ]
        }

        proptest! {
            #[test]
            fn random_keys_keep_state_consistent(keys in prop::collection::vec(key_code(), 0..200)) {
                let mut app = app();
                for code in keys {
                    press(&mut app, code);
                    prop_assert!(app.tree.cursor < app.tree.visible_row_count());
                    prop_assert!(app.tree.universe.contains(&app.ticker));
                    if let Some(req) = &app.pending {
                        prop_assert!(req.page.loads_data());
                    }
                }
            }
        }
    }
}
