use chrono::Local;
use ratatui::widgets::TableState;

use crate::commands::parse_due;
use crate::error::AppResult;
use crate::models::{NewSubTask, NewTodo, Status, Todo, TodoPatch};
use crate::projection::{self, FilterPatch};
use crate::store::{Action, View};
use crate::sync::TodoSync;

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Clone, Copy, PartialEq)]
pub enum InputField {
    Add,
    Search,
    Rename,
    Due,
    Subtask,
}

impl InputField {
    pub fn title(&self) -> &'static str {
        match self {
            InputField::Add => "Add Todo",
            InputField::Search => "Search",
            InputField::Rename => "Edit Text",
            InputField::Due => "Due Date (YYYY-MM-DD, empty to clear)",
            InputField::Subtask => "Add Subtask",
        }
    }
}

pub struct App {
    pub sync: TodoSync,
    /// Ids of the selectable rows in the current view, top to bottom.
    pub visible: Vec<String>,
    pub state: TableState,
    /// Selected kanban column.
    pub column: usize,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub status_line: Option<String>,
}

impl App {
    pub fn new(sync: TodoSync) -> App {
        let mut app = App {
            sync,
            visible: Vec::new(),
            state: TableState::default(),
            column: 0,
            input_mode: InputMode::Normal,
            input_field: InputField::Add,
            input_buffer: String::new(),
            status_line: None,
        };
        app.reload();
        app
    }

    pub fn view(&self) -> View {
        self.sync.store().state().view
    }

    /// Todos of the current view after filtering and sorting.
    pub fn projected(&self) -> Vec<&Todo> {
        let today = Local::now().date_naive();
        projection::project(self.sync.store().state(), today, &Local)
    }

    /// Rebuilds the selectable rows and keeps the selection in range.
    pub fn reload(&mut self) {
        let todos = self.projected();
        let ids: Vec<String> = match self.view() {
            View::List => todos.iter().map(|t| t.id.clone()).collect(),
            View::Kanban => projection::kanban(&todos)
                .get(self.column)
                .map(|c| c.todos.iter().map(|t| t.id.clone()).collect())
                .unwrap_or_default(),
            View::Calendar => projection::calendar(&todos, &Local)
                .into_values()
                .flatten()
                .map(|t| t.id.clone())
                .collect(),
        };
        self.visible = ids;
        let selected = match self.state.selected() {
            _ if self.visible.is_empty() => None,
            Some(i) => Some(i.min(self.visible.len() - 1)),
            None => Some(0),
        };
        self.state.select(selected);
    }

    pub fn selected_id(&self) -> Option<String> {
        self.state.selected().and_then(|i| self.visible.get(i)).cloned()
    }

    pub fn selected(&self) -> Option<&Todo> {
        self.selected_id().and_then(|id| self.sync.store().get(&id))
    }

    /// Records the outcome of an operation in the status line and reloads.
    fn report(&mut self, result: AppResult<()>, ok: &str) {
        self.status_line = Some(match result {
            Ok(()) => ok.to_string(),
            Err(e) => format!("Error: {}", e),
        });
        self.reload();
    }

    pub fn next(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.visible.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.visible.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn next_column(&mut self) {
        if self.view() == View::Kanban {
            self.column = (self.column + 1) % Status::ALL.len();
            self.state.select(Some(0));
            self.reload();
        }
    }

    pub fn previous_column(&mut self) {
        if self.view() == View::Kanban {
            self.column = (self.column + Status::ALL.len() - 1) % Status::ALL.len();
            self.state.select(Some(0));
            self.reload();
        }
    }

    pub fn cycle_view(&mut self) {
        let view = match self.view() {
            View::List => View::Kanban,
            View::Kanban => View::Calendar,
            View::Calendar => View::List,
        };
        self.sync.dispatch(Action::SetView(view));
        self.state.select(Some(0));
        self.reload();
    }

    pub fn toggle_show_completed(&mut self) {
        let show = !self.sync.store().state().filter.show_completed;
        self.sync.dispatch(Action::SetFilter(FilterPatch { show_completed: Some(show), ..Default::default() }));
        self.reload();
    }

    pub fn toggle_completed_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            let result = self.sync.toggle_completed(&id);
            self.report(result, "Completion toggled");
        }
    }

    pub fn star_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            let result = self.sync.toggle_star(&id);
            self.report(result, "Star toggled");
        }
    }

    pub fn archive_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            let result = self.sync.toggle_archive(&id);
            self.report(result, "Archive toggled");
        }
    }

    pub fn delete_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            let result = self.sync.delete(&id);
            self.report(result, "Todo deleted");
        }
    }

    /// Moves the selected todo one column right (`forward`) or left.
    pub fn shift_status(&mut self, forward: bool) {
        let Some(todo) = self.selected() else {
            return;
        };
        let (id, status) = (todo.id.clone(), if forward { todo.status.next() } else { todo.status.previous() });
        let result = self.sync.move_to_status(&id, status);
        self.report(result, &format!("Moved to {}", status.title()));
    }

    /// Swaps the selected todo with its visible neighbour in the stored order.
    pub fn reorder_selected(&mut self, down: bool) {
        if self.view() != View::List {
            return;
        }
        let Some(i) = self.state.selected() else {
            return;
        };
        let j = if down { i + 1 } else { i.wrapping_sub(1) };
        let (Some(a), Some(b)) = (self.visible.get(i), self.visible.get(j)) else {
            return;
        };
        let state = self.sync.store().state();
        let (Some(from), Some(to)) = (state.position(a), state.position(b)) else {
            return;
        };
        if self.sync.reorder(from, to) {
            self.reload();
            self.state.select(Some(j));
        }
    }

    pub fn refresh(&mut self) {
        let result = self.sync.refresh().map(|_| ());
        let ok = if self.sync.is_online() { "Pulled from server" } else { "Offline" };
        self.report(result, ok);
    }

    pub fn start_input(&mut self, field: InputField) {
        let prefill = match field {
            InputField::Search => Some(self.sync.store().state().filter.search.clone()),
            InputField::Rename => self.selected().map(|t| t.text.clone()),
            InputField::Due => self.selected().map(|t| {
                t.due_date
                    .map(|d| d.with_timezone(&Local).date_naive().to_string())
                    .unwrap_or_default()
            }),
            InputField::Add => Some(String::new()),
            InputField::Subtask => self.selected().map(|_| String::new()),
        };
        if let Some(prefill) = prefill {
            self.input_field = field;
            self.input_buffer = prefill;
            self.input_mode = InputMode::Editing;
        }
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    /// Commits the text typed into the popup.
    pub fn handle_input(&mut self) {
        let input = std::mem::take(&mut self.input_buffer);
        self.input_mode = InputMode::Normal;
        let input = input.trim().to_string();
        match self.input_field {
            InputField::Add => {
                if input.is_empty() {
                    return;
                }
                let result = self.sync.create(NewTodo::new(input)).map(|_| ());
                self.report(result, "Todo added");
            }
            InputField::Search => {
                self.sync.dispatch(Action::SetFilter(FilterPatch { search: Some(input), ..Default::default() }));
                self.state.select(Some(0));
                self.reload();
            }
            InputField::Rename => {
                let Some(id) = self.selected_id() else { return };
                let result = self.sync.update(&id, TodoPatch { text: Some(input), ..Default::default() });
                self.report(result, "Todo updated");
            }
            InputField::Due => {
                let Some(id) = self.selected_id() else { return };
                let result = if input.is_empty() {
                    Ok(None)
                } else {
                    parse_due(&input).map(Some)
                }
                .and_then(|due| self.sync.update(&id, TodoPatch { due_date: Some(due), ..Default::default() }));
                self.report(result, "Due date updated");
            }
            InputField::Subtask => {
                let Some(id) = self.selected_id() else { return };
                let result = self.sync.add_subtask(&id, NewSubTask::new(input));
                self.report(result, "Subtask added");
            }
        }
    }
}
