use std::io::{self, BufRead, Write};

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::Args;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::auth::AuthClient;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{
    Category, NewAttachment, NewComment, NewSubTask, NewTimeEntry, NewTodo, Priority, Recurrence,
    RecurrenceType, Status, SubTaskPatch, Todo, TodoPatch,
};
use crate::projection::{self, ArchivedFilter, Choice, DueFilter, FilterPatch, Sort, SortDirection, SortField};
use crate::store::{Action, Store, SystemEnv};
use crate::sync::{HttpBackend, TodoSync};

/// Filter and sort flags shared by the list-like commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Match text or tags (case-insensitive)
    #[arg(short, long)]
    pub search: Option<String>,
    #[arg(long)]
    pub status: Option<Status>,
    #[arg(short, long)]
    pub priority: Option<Priority>,
    #[arg(short, long)]
    pub category: Option<Category>,
    /// Require a tag (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
    /// Archived visibility
    #[arg(long, value_enum)]
    pub archived: Option<ArchivedFilter>,
    /// Only starred todos
    #[arg(long)]
    pub starred: bool,
    /// Hide completed todos
    #[arg(long)]
    pub hide_completed: bool,
    /// Due-date bucket
    #[arg(long, value_enum)]
    pub due: Option<DueFilter>,
    /// Sort field
    #[arg(long, value_enum)]
    pub sort: Option<SortField>,
    /// Sort ascending instead of descending
    #[arg(long)]
    pub asc: bool,
}

impl FilterArgs {
    pub fn filter_patch(&self) -> FilterPatch {
        FilterPatch {
            search: self.search.clone(),
            status: self.status.map(Choice::Only),
            priority: self.priority.map(Choice::Only),
            category: self.category.map(Choice::Only),
            archived: self.archived,
            starred_only: self.starred.then_some(true),
            show_completed: self.hide_completed.then_some(false),
            due: self.due,
            tags: (!self.tags.is_empty()).then(|| self.tags.clone()),
        }
    }

    pub fn sort(&self) -> Option<Sort> {
        let direction = if self.asc { SortDirection::Asc } else { SortDirection::Desc };
        match (self.sort, self.asc) {
            (Some(field), _) => Some(Sort { field, direction }),
            (None, true) => Some(Sort { field: SortField::CreatedAt, direction }),
            (None, false) => None,
        }
    }
}

/// Fields accepted by `add`.
#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Todo text (quoted if it has spaces)
    pub text: String,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(short, long, value_enum, default_value_t = Priority::Medium)]
    pub priority: Priority,
    #[arg(short, long, value_enum, default_value_t = Category::Other)]
    pub category: Category,
    /// Tag (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
    /// Due date in YYYY-MM-DD
    #[arg(long)]
    pub due: Option<String>,
    /// Estimated effort in minutes
    #[arg(short, long)]
    pub estimate: Option<u32>,
    /// Recurrence (daily, weekly, monthly, yearly)
    #[arg(short, long, value_enum)]
    pub recur: Option<RecurrenceType>,
    /// Recurrence interval
    #[arg(long, default_value_t = 1)]
    pub every: u32,
    /// Id of a todo this one depends on (repeatable)
    #[arg(long = "after")]
    pub dependencies: Vec<String>,
    #[arg(long)]
    pub starred: bool,
}

/// Fields accepted by `edit`. Pass `none` to clear the due date.
#[derive(Args, Debug, Clone, Default)]
pub struct EditArgs {
    #[arg(short = 'm', long)]
    pub text: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(short, long, value_enum)]
    pub priority: Option<Priority>,
    #[arg(short, long, value_enum)]
    pub category: Option<Category>,
    /// Replace all tags (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
    /// New due date in YYYY-MM-DD, or `none`
    #[arg(long)]
    pub due: Option<String>,
    /// Estimated effort in minutes
    #[arg(short, long)]
    pub estimate: Option<u32>,
    #[arg(long)]
    pub assign: Option<String>,
}

impl EditArgs {
    pub fn to_patch(&self) -> AppResult<TodoPatch> {
        let due_date = match self.due.as_deref() {
            None => None,
            Some("none") | Some("") => Some(None),
            Some(due) => Some(Some(parse_due(due)?)),
        };
        Ok(TodoPatch {
            text: self.text.clone(),
            description: self.description.clone().map(Some),
            priority: self.priority,
            category: self.category,
            tags: (!self.tags.is_empty()).then(|| self.tags.clone()),
            due_date,
            estimated_time: self.estimate.map(Some),
            assigned_to: self.assign.clone().map(Some),
            ..Default::default()
        })
    }
}

/// Parses `YYYY-MM-DD` as midday local time on that day.
pub fn parse_due(due: &str) -> AppResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(due, "%Y-%m-%d")
        .map_err(|e| AppError::Validation(format!("Invalid due date '{}': {}. Use YYYY-MM-DD.", due, e)))?;
    date.and_hms_opt(12, 0, 0)
        .and_then(|noon| Local.from_local_datetime(&noon).earliest())
        .map(|d| d.with_timezone(&Utc))
        .ok_or_else(|| AppError::Validation(format!("{} does not exist in the local time zone", due)))
}

/// First eight characters of an id, enough to tell todos apart.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Finds the todo whose id equals or uniquely starts with `prefix`.
pub fn resolve_id(store: &Store, prefix: &str) -> AppResult<String> {
    if store.get(prefix).is_some() {
        return Ok(prefix.to_string());
    }
    let hits: Vec<&Todo> = store.todos().iter().filter(|t| t.id.starts_with(prefix)).collect();
    match hits.as_slice() {
        [todo] => Ok(todo.id.clone()),
        [] => Err(AppError::NotFound(format!("todo {}", prefix))),
        _ => Err(AppError::Validation(format!("id prefix '{}' is ambiguous", prefix))),
    }
}

/// Builds the store for this run: local cache first, then the server when a
/// session exists and we are not offline.
pub fn open(config: &Config) -> TodoSync {
    let storage = config.storage();
    let store = Store::new(Box::new(SystemEnv));
    let session = if config.offline { None } else { storage.load_session() };
    let Some(session) = session else {
        tracing::debug!("no session, working offline");
        return TodoSync::offline(store, storage);
    };
    let backend = HttpBackend::new(&config.api_url, session.token, config.retry, config.timeout);
    let mut sync = TodoSync::new(store, Some(Box::new(backend)), Some(storage));
    sync.load_cache();
    if let Err(e) = sync.refresh() {
        eprintln!("Could not reach server ({}); showing cached todos.", e);
    }
    sync
}

fn read_secret(prompt: &str) -> AppResult<String> {
    print!("{}", prompt);
    io::stdout().flush().map_err(|e| AppError::Storage(e.into()))?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input).map_err(|e| AppError::Storage(e.into()))?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

pub fn cmd_login(config: &Config, email: &str, password: Option<String>) -> AppResult<()> {
    let password = match password {
        Some(p) => p,
        None => read_secret("Password: ")?,
    };
    let session = AuthClient::new(&config.api_url, config.timeout).login(email, &password)?;
    config.storage().save_session(&session)?;
    println!("Logged in as {}.", session.user.email);
    Ok(())
}

pub fn cmd_register(config: &Config, name: &str, email: &str, password: Option<String>) -> AppResult<()> {
    let password = match password {
        Some(p) => p,
        None => read_secret("Choose a password: ")?,
    };
    let session = AuthClient::new(&config.api_url, config.timeout).register(name, email, &password)?;
    config.storage().save_session(&session)?;
    println!("Registered and logged in as {}.", session.user.email);
    Ok(())
}

pub fn cmd_logout(config: &Config) -> AppResult<()> {
    config.storage().clear_session()?;
    println!("Logged out.");
    Ok(())
}

pub fn cmd_whoami(config: &Config) {
    match config.storage().load_session() {
        Some(session) => println!("{} <{}>", session.user.name, session.user.email),
        None => println!("Not logged in."),
    }
}

pub fn cmd_pull(sync: &mut TodoSync) -> AppResult<()> {
    if !sync.is_online() {
        return Err(AppError::Api(crate::error::ApiError::NotAuthenticated));
    }
    let count = sync.refresh()?;
    println!("Pulled {} todos.", count);
    Ok(())
}

pub fn cmd_add(sync: &mut TodoSync, args: AddArgs) -> AppResult<String> {
    let due_date = args.due.as_deref().map(parse_due).transpose()?;
    let draft = NewTodo {
        text: args.text,
        description: args.description,
        priority: args.priority,
        category: args.category,
        tags: args.tags,
        due_date,
        recurrence: args.recur.map(|kind| Recurrence { kind, interval: args.every.max(1), end_date: None }),
        estimated_time: args.estimate,
        is_starred: args.starred,
        dependencies: args.dependencies,
        ..Default::default()
    };
    let id = sync.create(draft)?;
    println!("Todo added (id = {})", short_id(&id));
    Ok(id)
}

pub fn cmd_edit(sync: &mut TodoSync, id: &str, args: &EditArgs) -> AppResult<()> {
    let id = resolve_id(sync.store(), id)?;
    let patch = args.to_patch()?;
    sync.update(&id, patch)?;
    println!("Todo {} updated.", short_id(&id));
    Ok(())
}

pub fn cmd_done(sync: &mut TodoSync, id: &str) -> AppResult<()> {
    let id = resolve_id(sync.store(), id)?;
    sync.toggle_completed(&id)?;
    let done = sync.store().get(&id).is_some_and(|t| t.completed);
    println!("Todo {} marked as {}.", short_id(&id), if done { "done" } else { "not done" });
    Ok(())
}

pub fn cmd_star(sync: &mut TodoSync, id: &str) -> AppResult<()> {
    let id = resolve_id(sync.store(), id)?;
    sync.toggle_star(&id)?;
    println!("Todo {} star toggled.", short_id(&id));
    Ok(())
}

pub fn cmd_archive(sync: &mut TodoSync, id: &str) -> AppResult<()> {
    let id = resolve_id(sync.store(), id)?;
    sync.toggle_archive(&id)?;
    println!("Todo {} archive toggled.", short_id(&id));
    Ok(())
}

pub fn cmd_remove(sync: &mut TodoSync, id: &str) -> AppResult<()> {
    let id = resolve_id(sync.store(), id)?;
    sync.delete(&id)?;
    println!("Todo {} removed.", short_id(&id));
    Ok(())
}

/// Moves a todo to a 1-based position in the stored order.
pub fn cmd_move(sync: &mut TodoSync, id: &str, position: usize) -> AppResult<()> {
    let id = resolve_id(sync.store(), id)?;
    let from = sync.store().state().position(&id).unwrap_or_default();
    let len = sync.store().todos().len();
    if position == 0 || position > len {
        return Err(AppError::Validation(format!("position must be between 1 and {}", len)));
    }
    sync.reorder(from, position - 1);
    println!("Todo {} moved to position {}.", short_id(&id), position);
    Ok(())
}

pub fn cmd_status(sync: &mut TodoSync, id: &str, status: Status) -> AppResult<()> {
    let id = resolve_id(sync.store(), id)?;
    sync.move_to_status(&id, status)?;
    println!("Todo {} moved to {}.", short_id(&id), status.title());
    Ok(())
}

pub fn cmd_subtask_add(sync: &mut TodoSync, id: &str, text: String) -> AppResult<()> {
    let id = resolve_id(sync.store(), id)?;
    sync.add_subtask(&id, NewSubTask::new(text))?;
    print_progress(sync, &id);
    Ok(())
}

/// Subtasks are addressed by 1-based position within their todo.
fn find_subtask(sync: &TodoSync, todo_id: &str, index: usize) -> AppResult<String> {
    sync.store()
        .get(todo_id)
        .and_then(|t| index.checked_sub(1).and_then(|i| t.sub_tasks.get(i)))
        .map(|s| s.id.clone())
        .ok_or_else(|| AppError::NotFound(format!("subtask {}", index)))
}

pub fn cmd_subtask_done(sync: &mut TodoSync, id: &str, index: usize) -> AppResult<()> {
    let id = resolve_id(sync.store(), id)?;
    let subtask_id = find_subtask(sync, &id, index)?;
    let completed = sync
        .store()
        .get(&id)
        .and_then(|t| t.sub_tasks.iter().find(|s| s.id == subtask_id))
        .is_some_and(|s| !s.completed);
    let patch = SubTaskPatch { completed: Some(completed), ..Default::default() };
    sync.edit_nested(&id, Action::UpdateSubTask { todo_id: id.clone(), subtask_id, patch })?;
    print_progress(sync, &id);
    Ok(())
}

pub fn cmd_subtask_remove(sync: &mut TodoSync, id: &str, index: usize) -> AppResult<()> {
    let id = resolve_id(sync.store(), id)?;
    let subtask_id = find_subtask(sync, &id, index)?;
    sync.edit_nested(&id, Action::DeleteSubTask { todo_id: id.clone(), subtask_id })?;
    print_progress(sync, &id);
    Ok(())
}

fn print_progress(sync: &TodoSync, id: &str) {
    if let Some(todo) = sync.store().get(id) {
        println!("Todo {}: {} subtasks, {}% done.", short_id(id), todo.sub_tasks.len(), todo.progress);
    }
}

pub fn cmd_comment_add(sync: &mut TodoSync, config: &Config, id: &str, text: String) -> AppResult<()> {
    let id = resolve_id(sync.store(), id)?;
    let author = config.storage().load_session().map(|s| s.user.id).unwrap_or_else(|| "me".to_string());
    sync.add_comment(&id, NewComment { text, author })?;
    println!("Comment added to {}.", short_id(&id));
    Ok(())
}

pub fn cmd_comment_remove(sync: &mut TodoSync, id: &str, index: usize) -> AppResult<()> {
    let id = resolve_id(sync.store(), id)?;
    let comment_id = sync
        .store()
        .get(&id)
        .and_then(|t| index.checked_sub(1).and_then(|i| t.comments.get(i)))
        .map(|c| c.id.clone())
        .ok_or_else(|| AppError::NotFound(format!("comment {}", index)))?;
    sync.edit_nested(&id, Action::DeleteComment { todo_id: id.clone(), comment_id })?;
    println!("Comment removed from {}.", short_id(&id));
    Ok(())
}

/// Logs minutes worked on a todo.
pub fn cmd_log(sync: &mut TodoSync, id: &str, minutes: u32, description: Option<String>) -> AppResult<()> {
    let id = resolve_id(sync.store(), id)?;
    let end = Utc::now();
    let entry = NewTimeEntry {
        duration: minutes,
        description: description.unwrap_or_default(),
        start_time: Some(end - chrono::Duration::minutes(i64::from(minutes))),
        end_time: Some(end),
    };
    sync.log_time(&id, entry)?;
    let total = sync.store().get(&id).map(|t| t.logged_minutes()).unwrap_or_default();
    println!("Logged {}m on {} ({}m total).", minutes, short_id(&id), total);
    Ok(())
}

pub fn cmd_attach(sync: &mut TodoSync, id: &str, attachment: NewAttachment) -> AppResult<()> {
    let id = resolve_id(sync.store(), id)?;
    let name = attachment.name.clone();
    sync.add_attachment(&id, attachment)?;
    println!("Attached '{}' to {}.", name, short_id(&id));
    Ok(())
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels.iter().map(|l| Cell::new(l).add_attribute(Attribute::Bold)).collect()
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

fn format_due(due: Option<DateTime<Utc>>, today: NaiveDate) -> (String, Color) {
    let Some(due) = due else {
        return ("-".to_string(), Color::Reset);
    };
    let day = due.with_timezone(&Local).date_naive();
    let days_left = (day - today).num_days();
    let label = if days_left < 0 {
        format!("{} ({}d overdue)", day, days_left.abs())
    } else if days_left == 0 {
        format!("{} (today)", day)
    } else {
        day.to_string()
    };
    let color = if days_left < 0 { Color::Red } else if days_left == 0 { Color::Yellow } else { Color::Reset };
    (label, color)
}

fn apply_filters(sync: &mut TodoSync, args: &FilterArgs) {
    sync.dispatch(Action::SetFilter(args.filter_patch()));
    if let Some(sort) = args.sort() {
        sync.dispatch(Action::SetSort(sort));
    }
}

/// Lists todos matching the filters in a table.
pub fn cmd_list(sync: &mut TodoSync, args: &FilterArgs) {
    apply_filters(sync, args);
    let today = Local::now().date_naive();
    let todos = projection::project(sync.store().state(), today, &Local);
    if todos.is_empty() {
        println!("No todos found.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["ID", "", "Todo", "Status", "Priority", "Category", "Due", "Tags", "Progress"]));

    for t in todos {
        let (due, due_color) = format_due(t.due_date, today);
        let flags = format!(
            "{}{}{}",
            if t.is_starred { "★" } else { "" },
            if t.is_archived { "A" } else { "" },
            if sync.is_pending(&t.id) { "…" } else { "" }
        );
        let status_color = match t.status {
            Status::Done => Color::Green,
            Status::InProgress => Color::Cyan,
            Status::Todo => Color::Reset,
        };
        table.add_row(vec![
            Cell::new(short_id(&t.id)),
            Cell::new(flags).fg(Color::Yellow),
            Cell::new(&t.text),
            Cell::new(t.status.title()).fg(status_color),
            Cell::new(t.priority.as_str()).fg(priority_color(t.priority)),
            Cell::new(t.category.as_str()),
            Cell::new(due).fg(due_color),
            Cell::new(t.tags.join(", ")),
            Cell::new(format!("{}%", t.progress)),
        ]);
    }

    println!("{table}");
}

/// Prints every detail of one todo, nested collections included.
pub fn cmd_show(sync: &TodoSync, id: &str) -> AppResult<()> {
    let id = resolve_id(sync.store(), id)?;
    let Some(t) = sync.store().get(&id) else {
        return Err(AppError::NotFound(format!("todo {}", id)));
    };
    let today = Local::now().date_naive();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic);
    let rows: Vec<(&str, String)> = vec![
        ("ID", t.id.clone()),
        ("Todo", t.text.clone()),
        ("Description", t.description.clone().unwrap_or_default()),
        ("Status", t.status.title().to_string()),
        ("Priority", t.priority.as_str().to_string()),
        ("Category", t.category.as_str().to_string()),
        ("Tags", t.tags.join(", ")),
        ("Due", format_due(t.due_date, today).0),
        (
            "Recurrence",
            t.recurrence
                .as_ref()
                .map(|r| format!("every {} {:?}", r.interval, r.kind).to_lowercase())
                .unwrap_or_default(),
        ),
        ("Estimate", t.estimated_time.map(|m| format!("{}m", m)).unwrap_or_default()),
        ("Logged", format!("{}m", t.logged_minutes())),
        ("Progress", format!("{}%", t.progress)),
        ("Depends on", t.dependencies.iter().map(|d| short_id(d)).collect::<Vec<_>>().join(", ")),
        ("Created", t.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()),
        ("Updated", t.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    println!("{table}");

    if !t.sub_tasks.is_empty() {
        println!("Subtasks:");
        for (i, s) in t.sub_tasks.iter().enumerate() {
            println!("  {}. [{}] {}", i + 1, if s.completed { "x" } else { " " }, s.text);
        }
    }
    if !t.comments.is_empty() {
        println!("Comments:");
        for (i, c) in t.comments.iter().enumerate() {
            println!("  {}. {} ({})", i + 1, c.text, c.created_at.with_timezone(&Local).format("%Y-%m-%d"));
        }
    }
    if !t.attachments.is_empty() {
        println!("Attachments:");
        for a in &t.attachments {
            println!("  {} <{}> {} bytes", a.name, a.url, a.size);
        }
    }
    if !t.time_entries.is_empty() {
        println!("Time entries:");
        for e in &t.time_entries {
            println!("  {}m {}", e.duration, e.description);
        }
    }
    Ok(())
}

/// Prints the three workflow columns side by side.
pub fn cmd_kanban(sync: &mut TodoSync, args: &FilterArgs) {
    apply_filters(sync, args);
    let today = Local::now().date_naive();
    let todos = projection::project(sync.store().state(), today, &Local);
    let columns = projection::kanban(&todos);
    let depth = columns.iter().map(|c| c.todos.len()).max().unwrap_or(0);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic).set_header(
        columns
            .iter()
            .map(|c| Cell::new(format!("{} ({})", c.status.title(), c.todos.len())).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    for row in 0..depth {
        table.add_row(
            columns
                .iter()
                .map(|c| match c.todos.get(row) {
                    Some(t) => Cell::new(format!("{} {}", short_id(&t.id), t.text)).fg(priority_color(t.priority)),
                    None => Cell::new(""),
                })
                .collect::<Vec<_>>(),
        );
    }
    println!("{table}");
}

/// Prints todos grouped by due day.
pub fn cmd_calendar(sync: &mut TodoSync, args: &FilterArgs) {
    apply_filters(sync, args);
    let today = Local::now().date_naive();
    let todos = projection::project(sync.store().state(), today, &Local);
    let days = projection::calendar(&todos, &Local);
    if days.is_empty() {
        println!("Nothing scheduled.");
        return;
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Day", "Todos"]));
    for (day, todos) in days {
        let label = format!("{} {}", day.format("%a"), day);
        let color = if day < today { Color::Red } else if day == today { Color::Yellow } else { Color::Reset };
        let items: Vec<String> = todos
            .iter()
            .map(|t| format!("{} {}{}", short_id(&t.id), t.text, if t.completed { " ✓" } else { "" }))
            .collect();
        table.add_row(vec![Cell::new(label).fg(color), Cell::new(items.join("\n"))]);
    }
    println!("{table}");
}

pub fn cmd_stats(sync: &TodoSync) -> AppResult<()> {
    let stats = sync.stats()?;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header(&["Metric", "Value"]));
    table.add_row(vec!["Total".to_string(), stats.total_todos.to_string()]);
    table.add_row(vec!["Completed".to_string(), stats.completed_todos.to_string()]);
    table.add_row(vec!["Pending".to_string(), stats.pending_todos.to_string()]);
    table.add_row(vec!["Completion rate".to_string(), format!("{:.1}%", stats.completion_rate)]);
    table.add_row(vec!["Estimated time".to_string(), format!("{}m", stats.estimated_total_time)]);
    table.add_row(vec!["Actual time".to_string(), format!("{}m", stats.actual_total_time)]);
    for (title, dist) in [
        ("Status", &stats.status_distribution),
        ("Priority", &stats.priority_distribution),
        ("Category", &stats.category_distribution),
        ("Tag", &stats.tag_usage),
    ] {
        for (key, count) in dist {
            table.add_row(vec![format!("{}: {}", title, key), count.to_string()]);
        }
    }
    println!("{table}");
    Ok(())
}

/// Deletes the local cache and session.
pub fn cmd_reset(config: &Config, force: bool) -> AppResult<()> {
    if !force {
        let answer = read_secret("Delete the local cache and session? This cannot be undone. [y/N] ")?;
        if answer.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    config.storage().delete_database()?;
    println!("Local data removed.");
    Ok(())
}
