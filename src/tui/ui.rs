use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table},
    Frame,
};

use super::app::{App, InputMode};
use crate::commands::short_id;
use crate::models::{Priority, Status, Todo};
use crate::projection;
use crate::store::View;

fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Style::default().fg(Color::Red),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::Low => Style::default().fg(Color::Green),
    }
}

fn highlight() -> Style {
    Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray)
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Status line
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    let title = format!(
        "tododeck - {} [{}{}]",
        match app.view() {
            View::List => "List",
            View::Kanban => "Kanban",
            View::Calendar => "Calendar",
        },
        if app.sync.is_online() { "online" } else { "offline" },
        match app.sync.in_flight() {
            0 => String::new(),
            n => format!(", {} pending", n),
        }
    );

    match app.view() {
        View::List => draw_list(f, app, chunks[0], &title),
        View::Kanban => draw_kanban(f, app, chunks[0], &title),
        View::Calendar => draw_calendar(f, app, chunks[0], &title),
    }

    let status = Paragraph::new(app.status_line.clone().unwrap_or_default()).style(Style::default().fg(Color::Cyan));
    f.render_widget(status, chunks[1]);

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view() {
            View::List => "q: Quit | n: Add | e: Edit | t: Due | +: Subtask | Space: Done | s: Star | a: Archive | d: Del | J/K: Reorder | </>: Status | /: Search | c: Completed | r: Pull | v: View",
            View::Kanban => "q: Quit | n: Add | h/l: Column | </>: Move card | Space: Done | s: Star | d: Del | /: Search | r: Pull | v: View",
            View::Calendar => "q: Quit | n: Add | t: Due | Space: Done | s: Star | d: Del | /: Search | r: Pull | v: View",
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel",
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);

    if app.input_mode == InputMode::Editing {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);
        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(app.input_field.title()));
        f.render_widget(input, area);
    }
}

fn draw_list(f: &mut Frame, app: &mut App, area: Rect, title: &str) {
    let today = Local::now().date_naive();
    let rows: Vec<Row> = app
        .visible
        .iter()
        .filter_map(|id| app.sync.store().get(id))
        .map(|t| {
            let due = match projection::due_day(t, &Local) {
                Some(day) if day < today && !t.completed => format!("{} ({}d overdue)", day, (today - day).num_days()),
                Some(day) if day == today => "Today".to_string(),
                Some(day) => day.to_string(),
                None => String::new(),
            };
            let style = if t.completed {
                Style::default().fg(Color::DarkGray)
            } else {
                priority_style(t.priority)
            };
            Row::new(vec![
                Cell::from(short_id(&t.id).to_string()),
                Cell::from(if t.is_starred { "★" } else { "" }),
                Cell::from(t.text.clone()),
                Cell::from(t.status.title()),
                Cell::from(t.category.as_str()),
                Cell::from(due),
                Cell::from(format!("{}%", t.progress)),
                Cell::from(if app.sync.is_pending(&t.id) { "…" } else { "" }),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Length(1),
        Constraint::Min(20),
        Constraint::Length(11),
        Constraint::Length(10),
        Constraint::Length(22),
        Constraint::Length(5),
        Constraint::Length(1),
    ];

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["ID", "", "Todo", "Status", "Category", "Due", "Done", ""])
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .row_highlight_style(highlight())
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn card(t: &Todo) -> ListItem<'static> {
    let mut label = String::new();
    if t.is_starred {
        label.push_str("★ ");
    }
    label.push_str(&t.text);
    if !t.sub_tasks.is_empty() {
        label.push_str(&format!(" ({}%)", t.progress));
    }
    ListItem::new(label).style(priority_style(t.priority))
}

fn draw_kanban(f: &mut Frame, app: &mut App, area: Rect, title: &str) {
    let outer = Block::default().borders(Borders::ALL).title(title.to_string());
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
        .split(inner);

    let todos = app.projected();
    let columns = projection::kanban(&todos);
    for (i, column) in columns.iter().enumerate() {
        let items: Vec<ListItem> = column.todos.iter().map(|t| card(t)).collect();
        let focused = i == app.column;
        let border = if focused { Style::default().fg(Color::Cyan) } else { Style::default() };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(format!("{} ({})", column.status.title(), column.todos.len())),
            )
            .highlight_style(highlight());
        let mut state = ListState::default();
        if focused {
            state.select(app.state.selected());
        }
        f.render_stateful_widget(list, areas[i], &mut state);
    }
}

fn draw_calendar(f: &mut Frame, app: &mut App, area: Rect, title: &str) {
    let today = Local::now().date_naive();
    let todos = app.projected();
    let days = projection::calendar(&todos, &Local);
    let rows: Vec<Row> = days
        .iter()
        .flat_map(|(day, todos)| {
            let day_style = if *day < today {
                Style::default().fg(Color::Red)
            } else if *day == today {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            todos.iter().map(move |t| {
                Row::new(vec![
                    Cell::from(format!("{} {}", day.format("%a"), day)).style(day_style),
                    Cell::from(t.text.clone()),
                    Cell::from(if t.status == Status::Done { "✓" } else { "" }),
                ])
            })
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(15), Constraint::Min(20), Constraint::Length(2)])
        .header(
            Row::new(vec!["Day", "Todo", ""])
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .row_highlight_style(highlight())
        .highlight_symbol(">> ");

    let mut state = app.state.clone();
    f.render_stateful_widget(table, area, &mut state);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(margin), Constraint::Length(height), Constraint::Length(margin)])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
