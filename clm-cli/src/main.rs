//! CLM CLI - Terminal-based contract lifecycle management trainer

mod io;
mod telemetry;
mod ui;

use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing::{error, info};

use clm_core::{Action, App, MemoryStore, Mode, Page};

const TICK: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    telemetry::init_tracing()?;

    let config = io::load_config()?;
    let local = io::FileStore::open()?;
    info!(level = config.level.suffix(), "starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::with_stores(config, Box::new(MemoryStore::new()), Box::new(local));
    app.set_status("Select placeholders with v, then > to build the questionnaire. ? for help");

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = res {
        error!(error = %e, "terminal loop failed");
        eprintln!("Error: {}", e);
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let started = Instant::now();
    let now_ms = || started.elapsed().as_millis() as u64;

    while app.running {
        let mut layout = ui::MatchLayout::default();
        terminal.draw(|f| layout = ui::draw(f, app))?;

        if app.page == Page::Matching && app.connectors_stale && app.refresh_connectors(&layout) {
            continue;
        }

        if !event::poll(TICK)? {
            app.tick(now_ms());
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if app.alert.is_some() {
                    app.dispatch(Action::Dismiss);
                    continue;
                }
                // Clear status on any key
                app.clear_status();

                match app.mode {
                    Mode::Normal => handle_normal_mode(app, key.code),
                    Mode::Visual => handle_visual_mode(app, key.code),
                    Mode::Input => handle_input_mode(app, key.code),
                    Mode::TypePicker => handle_type_picker(app, key.code),
                    Mode::Help => app.dispatch(Action::Dismiss),
                }
            }
            Event::Resize(_, _) => app.layout_changed(now_ms()),
            _ => {}
        }
    }
    Ok(())
}

/// Movement keys shared by normal and visual mode.
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
            if code == KeyCode::Char('e') {
                match io::export_session(app) {
                    Ok(path) => app.set_status(&format!("Exported to {}", path.display())),
                    Err(e) => app.set_status(&format!("Export failed: {}", e)),
                }
            }
            None
        }
    };

    if let Some(action) = action {
        app.dispatch(action);
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
