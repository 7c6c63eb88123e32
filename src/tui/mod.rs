pub mod app;
pub mod ui;

use std::io;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::error::{AppResult, StorageError};
use crate::sync::TodoSync;
use app::{App, InputField, InputMode};
use ui::ui;

pub fn run_tui(sync: TodoSync) -> AppResult<()> {
    let io_err = |e: io::Error| StorageError::from(e);

    // Setup terminal
    enable_raw_mode().map_err(io_err)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).map_err(io_err)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(io_err)?;

    let mut app = App::new(sync);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().map_err(io_err)?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture).map_err(io_err)?;
    terminal.show_cursor().map_err(io_err)?;

    res.map_err(|e| io_err(e).into())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match app.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Right | KeyCode::Char('l') => app.next_column(),
                KeyCode::Left | KeyCode::Char('h') => app.previous_column(),
                KeyCode::Char('J') => app.reorder_selected(true),
                KeyCode::Char('K') => app.reorder_selected(false),
                KeyCode::Char('>') => app.shift_status(true),
                KeyCode::Char('<') => app.shift_status(false),
                KeyCode::Char(' ') => app.toggle_completed_selected(),
                KeyCode::Char('s') => app.star_selected(),
                KeyCode::Char('a') => app.archive_selected(),
                KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
                KeyCode::Char('c') => app.toggle_show_completed(),
                KeyCode::Char('v') => app.cycle_view(),
                KeyCode::Char('r') => app.refresh(),
                KeyCode::Char('n') => app.start_input(InputField::Add),
                KeyCode::Char('e') => app.start_input(InputField::Rename),
                KeyCode::Char('t') => app.start_input(InputField::Due), // 't' for Time/Date
                KeyCode::Char('+') => app.start_input(InputField::Subtask),
                KeyCode::Char('/') => app.start_input(InputField::Search),
                _ => {}
            },
            InputMode::Editing => match key.code {
                KeyCode::Enter => app.handle_input(),
                KeyCode::Esc => app.cancel_input(),
                KeyCode::Char(c) => app.input_buffer.push(c),
                KeyCode::Backspace => {
                    app.input_buffer.pop();
                }
                _ => {}
            },
        }
    }
}
