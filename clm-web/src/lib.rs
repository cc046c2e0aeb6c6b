//! CLM Web - WebAssembly version of the CLM trainer
//!
//! Renders the same pages as the terminal build into the DOM through
//! Ratzilla. Session state lives in `sessionStorage`, the holiday-pay
//! calculation in `localStorage`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ratzilla::ratatui::layout::Rect;
use ratzilla::ratatui::Terminal;
use ratzilla::{event::KeyCode, DomBackend, WebRenderer};
use wasm_bindgen::prelude::*;

use clm_core::{Action, App, Config, KeyValueStore, MemoryStore, Mode, Page};

pub mod io;
mod ui;

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Browser storage, or an in-memory stand-in when it is unavailable
/// (private browsing, sandboxed frames).
fn store(open: fn() -> Result<io::BrowserStore, JsValue>, name: &str) -> Box<dyn KeyValueStore> {
    match open() {
        Ok(store) => Box::new(store),
        Err(e) => {
            web_sys::console::warn_1(&format!("{} unavailable, using memory: {:?}", name, e).into());
            Box::new(MemoryStore::new())
        }
    }
}

/// Initialize the CLM web application
#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    let session = store(io::BrowserStore::session, "sessionStorage");
    let local = store(io::BrowserStore::local, "localStorage");

    let mut app = App::with_stores(Config::default(), session, local);
    app.set_status("Welcome! Press 'v' to start selecting placeholders, '?' for help");

    // Wrap in Rc<RefCell> for shared state
    let app_state = Rc::new(RefCell::new(app));

    // Create terminal with DOM backend
    let backend = DomBackend::new()
        .map_err(|e| JsValue::from_str(&format!("Failed to create backend: {:?}", e)))?;
    let mut terminal = Terminal::new(backend)
        .map_err(|e| JsValue::from_str(&format!("Failed to create terminal: {:?}", e)))?;

    // Set up keyboard handler
    terminal.on_key_event({
        let app_state_cloned = app_state.clone();
        move |event| {
            let mut app = app_state_cloned.borrow_mut();
            if app.alert.is_some() {
                app.dispatch(Action::Dismiss);
                return;
            }
            app.clear_status();

            match app.mode {
                Mode::Normal => handle_normal_mode(&mut app, event.code),
                Mode::Visual => handle_visual_mode(&mut app, event.code),
                Mode::Input => handle_input_mode(&mut app, event.code),
                Mode::TypePicker => handle_type_picker(&mut app, event.code),
                Mode::Help => app.dispatch(Action::Dismiss),
            }
        }
    });

    // Draw loop, once per animation frame
    let last_area: Cell<Option<Rect>> = Cell::new(None);
    terminal.draw_web(move |frame| {
        let mut app = app_state.borrow_mut();
        let now = now_ms();

        let area = frame.area();
        if last_area.get() != Some(area) {
            if last_area.get().is_some() {
                app.layout_changed(now);
            }
            last_area.set(Some(area));
        }
        app.tick(now);

        let layout = ui::draw(frame, &app);
        if app.page == Page::Matching && app.connectors_stale {
            app.refresh_connectors(&layout);
        }
    });

    web_sys::console::log_1(&"CLM WASM initialized".into());

    Ok(())
}

fn movement(code: KeyCode) -> Option<Action> {
    let action = match code {
        KeyCode::Char('j') | KeyCode::Down => Action::Down,
        KeyCode::Char('k') | KeyCode::Up => Action::Up,
        KeyCode::Char('h') | KeyCode::Left => Action::Left,
        KeyCode::Char('l') | KeyCode::Right => Action::Right,
        KeyCode::Char('g') => Action::Top,
        KeyCode::Char('G') => Action::Bottom,
        KeyCode::Char('w') => Action::WordForward,
        KeyCode::Char('e') => Action::WordEnd,
        KeyCode::Char('b') => Action::WordBack,
        KeyCode::Char('0') | KeyCode::Home => Action::LineStart,
        KeyCode::Char('$') | KeyCode::End => Action::LineEnd,
        _ => return None,
    };
    Some(action)
}

fn handle_normal_mode(app: &mut App, code: KeyCode) {
    let global = match code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('?') => Some(Action::ShowHelp),
        KeyCode::Char('>') | KeyCode::PageDown => Some(Action::NextPage),
        KeyCode::Char('<') | KeyCode::PageUp => Some(Action::PrevPage),
        KeyCode::Char('m') => Some(Action::OpenMatching),
        KeyCode::Char('t') => Some(Action::ToggleTheme),
        _ => None,
    };
    if let Some(action) = global {
        app.dispatch(action);
        return;
    }

    let action = match app.page {
        Page::Document => match code {
            KeyCode::Tab => Some(Action::ToggleFocus),
            KeyCode::Char(']') => Some(Action::NextHighlight),
            KeyCode::Char('[') => Some(Action::PrevHighlight),
            KeyCode::Char('v') => Some(Action::StartSelection),
            KeyCode::Char('d') => Some(Action::RemoveHighlight),
            other => movement(other),
        },
        Page::Questionnaire => match code {
            KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
            KeyCode::Enter | KeyCode::Char('i') => Some(Action::EditLabel),
            KeyCode::Char('T') => Some(Action::PickType),
            KeyCode::Char('r') => Some(Action::ToggleRequired),
            KeyCode::Char('K') => Some(Action::MoveQuestionUp),
            KeyCode::Char('J') => Some(Action::MoveQuestionDown),
            _ => None,
        },
        Page::LiveGeneration => match code {
            KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
            KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Activate),
            KeyCode::Char('y') => Some(Action::AnswerYes),
            KeyCode::Char('n') => Some(Action::AnswerNo),
            KeyCode::Char('c') => Some(Action::CycleCurrency),
            KeyCode::Char('o') => Some(Action::CycleOperation),
            KeyCode::Char('F') => Some(Action::Finish),
            _ => None,
        },
        Page::Matching => match code {
            KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
            KeyCode::Char('h') | KeyCode::Left => Some(Action::Left),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => Some(Action::Right),
            KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Select),
            KeyCode::Esc => Some(Action::Dismiss),
            _ => None,
        },
        Page::Finish => {
            if matches!(code, KeyCode::Char('e')) {
                export(app);
            }
            None
        }
    };

    if let Some(action) = action {
        app.dispatch(action);
    }
}

fn export(app: &mut App) {
    match clm_core::to_json(app) {
        Ok(json) => {
            if let Err(e) = io::download_json("clm-session.json", &json) {
                app.set_status(&format!("Export failed: {:?}", e));
            } else {
                app.set_status("Exported to clm-session.json");
            }
        }
        Err(e) => app.set_status(&format!("Serialization failed: {}", e)),
    }
}

fn handle_visual_mode(app: &mut App, code: KeyCode) {
    let action = match code {
        KeyCode::Esc => Some(Action::Dismiss),
        KeyCode::Enter | KeyCode::Char('a') => Some(Action::Highlight),
        other => movement(other),
    };
    if let Some(action) = action {
        app.dispatch(action);
    }
}

fn handle_input_mode(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.dispatch(Action::Dismiss),
        KeyCode::Enter => app.dispatch(Action::Submit),
        KeyCode::Backspace => app.dispatch(Action::Backspace),
        KeyCode::Char(c) => app.dispatch(Action::InputChar(c)),
        _ => {}
    }
}

fn handle_type_picker(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.dispatch(Action::Dismiss),
        KeyCode::Char('j') | KeyCode::Down => app.dispatch(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => app.dispatch(Action::Up),
        KeyCode::Enter => app.dispatch(Action::Submit),
        _ => {}
    }
}
