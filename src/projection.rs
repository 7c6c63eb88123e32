//! Read-only views derived from store state: filtering, sorting, kanban
//! columns, calendar buckets and aggregate stats.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, TimeZone};
use clap::ValueEnum;

use crate::models::{Category, Priority, Status, Todo, TodoStats};
use crate::store::State;

/// One filter dimension: either inactive or pinned to a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Choice<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Choice<T> {
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(wanted) => wanted == value,
        }
    }
}

impl<T> From<Option<T>> for Choice<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Choice::All, Choice::Only)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ArchivedFilter {
    /// Archived todos are hidden.
    #[default]
    Hide,
    Include,
    Only,
}

/// Due-date bucket a todo must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DueFilter {
    #[default]
    Any,
    /// Due before today and not completed.
    Overdue,
    Today,
    /// Due within the next seven days, today included.
    ThisWeek,
    NoDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Case-insensitive substring matched against text and tags.
    pub search: String,
    pub status: Choice<Status>,
    pub priority: Choice<Priority>,
    pub category: Choice<Category>,
    pub archived: ArchivedFilter,
    pub starred_only: bool,
    pub show_completed: bool,
    pub due: DueFilter,
    /// Every listed tag must be present.
    pub tags: Vec<String>,
}

impl Default for Filter {
    fn default() -> Self {
        Filter {
            search: String::new(),
            status: Choice::All,
            priority: Choice::All,
            category: Choice::All,
            archived: ArchivedFilter::Hide,
            starred_only: false,
            show_completed: true,
            due: DueFilter::Any,
            tags: Vec::new(),
        }
    }
}

/// Partial filter update; unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub search: Option<String>,
    pub status: Option<Choice<Status>>,
    pub priority: Option<Choice<Priority>>,
    pub category: Option<Choice<Category>>,
    pub archived: Option<ArchivedFilter>,
    pub starred_only: Option<bool>,
    pub show_completed: Option<bool>,
    pub due: Option<DueFilter>,
    pub tags: Option<Vec<String>>,
}

impl Filter {
    pub fn merge(&mut self, patch: FilterPatch) {
        if let Some(search) = patch.search {
            self.search = search;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(archived) = patch.archived {
            self.archived = archived;
        }
        if let Some(starred_only) = patch.starred_only {
            self.starred_only = starred_only;
        }
        if let Some(show_completed) = patch.show_completed {
            self.show_completed = show_completed;
        }
        if let Some(due) = patch.due {
            self.due = due;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortField {
    /// Store order, as left by add and reorder.
    #[default]
    Manual,
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
    Text,
    Category,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Calendar day a todo is due on, in the given zone.
pub fn due_day<Tz: TimeZone>(todo: &Todo, tz: &Tz) -> Option<NaiveDate> {
    todo.due_date.map(|due| due.with_timezone(tz).date_naive())
}

fn due_matches<Tz: TimeZone>(todo: &Todo, due: DueFilter, today: NaiveDate, tz: &Tz) -> bool {
    let day = due_day(todo, tz);
    match due {
        DueFilter::Any => true,
        DueFilter::NoDate => day.is_none(),
        DueFilter::Overdue => day.is_some_and(|d| d < today) && !todo.completed,
        DueFilter::Today => day == Some(today),
        DueFilter::ThisWeek => day.is_some_and(|d| d >= today && d < today + Duration::days(7)),
    }
}

/// True when `todo` passes every active filter dimension.
pub fn matches<Tz: TimeZone>(todo: &Todo, filter: &Filter, today: NaiveDate, tz: &Tz) -> bool {
    if !filter.status.accepts(&todo.status)
        || !filter.priority.accepts(&todo.priority)
        || !filter.category.accepts(&todo.category)
    {
        return false;
    }
    let archived_ok = match filter.archived {
        ArchivedFilter::Hide => !todo.is_archived,
        ArchivedFilter::Include => true,
        ArchivedFilter::Only => todo.is_archived,
    };
    if !archived_ok {
        return false;
    }
    if filter.starred_only && !todo.is_starred {
        return false;
    }
    if !filter.show_completed && todo.completed {
        return false;
    }
    if !due_matches(todo, filter.due, today, tz) {
        return false;
    }
    let has_tag = |wanted: &String| todo.tags.iter().any(|t| t.eq_ignore_ascii_case(wanted));
    if !filter.tags.iter().all(has_tag) {
        return false;
    }
    let query = filter.search.trim().to_lowercase();
    query.is_empty()
        || todo.text.to_lowercase().contains(&query)
        || todo.tags.iter().any(|t| t.to_lowercase().contains(&query))
}

pub fn filter_todos<'a, Tz: TimeZone>(
    todos: &'a [Todo],
    filter: &Filter,
    today: NaiveDate,
    tz: &Tz,
) -> Vec<&'a Todo> {
    todos.iter().filter(|t| matches(t, filter, today, tz)).collect()
}

/// Case-folded comparison with a byte-order tiebreak.
fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Orders two todos by the configured field. Undated todos always sort after
/// dated ones so the order stays total in both directions.
pub fn compare(a: &Todo, b: &Todo, sort: &Sort) -> Ordering {
    let ord = match sort.field {
        SortField::Manual => Ordering::Equal,
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::DueDate => {
            return match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => sort.direction.apply(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
        SortField::Priority => a.priority.rank().cmp(&b.priority.rank()),
        SortField::Text => collate(&a.text, &b.text),
        SortField::Category => collate(a.category.as_str(), b.category.as_str()),
        SortField::Status => a.status.cmp(&b.status),
    };
    sort.direction.apply(ord)
}

pub fn sort_todos(todos: &mut [&Todo], sort: &Sort) {
    todos.sort_by(|a, b| compare(a, b, sort));
}

/// Filtered and sorted todos for the current state.
pub fn project<'a, Tz: TimeZone>(state: &'a State, today: NaiveDate, tz: &Tz) -> Vec<&'a Todo> {
    let mut todos = filter_todos(&state.todos, &state.filter, today, tz);
    sort_todos(&mut todos, &state.sort);
    todos
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column<'a> {
    pub status: Status,
    pub todos: Vec<&'a Todo>,
}

/// Splits todos into the three fixed workflow columns, keeping input order
/// within each column.
pub fn kanban<'a>(todos: &[&'a Todo]) -> Vec<Column<'a>> {
    Status::ALL
        .iter()
        .map(|&status| Column {
            status,
            todos: todos.iter().copied().filter(|t| t.status == status).collect(),
        })
        .collect()
}

/// Buckets todos by the day they are due. Undated todos are left out.
pub fn calendar<'a, Tz: TimeZone>(todos: &[&'a Todo], tz: &Tz) -> BTreeMap<NaiveDate, Vec<&'a Todo>> {
    let mut days: BTreeMap<NaiveDate, Vec<&'a Todo>> = BTreeMap::new();
    for &todo in todos {
        if let Some(day) = due_day(todo, tz) {
            days.entry(day).or_default().push(todo);
        }
    }
    days
}

/// Aggregate counts over the given todos.
pub fn stats(todos: &[Todo]) -> TodoStats {
    let mut stats = TodoStats { total_todos: todos.len(), ..Default::default() };
    for todo in todos {
        if todo.completed {
            stats.completed_todos += 1;
        }
        *stats.status_distribution.entry(todo.status.as_str().to_string()).or_default() += 1;
        *stats.priority_distribution.entry(todo.priority.as_str().to_string()).or_default() += 1;
        *stats.category_distribution.entry(todo.category.as_str().to_string()).or_default() += 1;
        for tag in &todo.tags {
            *stats.tag_usage.entry(tag.clone()).or_default() += 1;
        }
        stats.estimated_total_time += u64::from(todo.estimated_time.unwrap_or(0));
        stats.actual_total_time += todo.actual_time.map(u64::from).unwrap_or_else(|| todo.logged_minutes());
    }
    stats.pending_todos = stats.total_todos - stats.completed_todos;
    if stats.total_todos > 0 {
        stats.completion_rate = stats.completed_todos as f64 * 100.0 / stats.total_todos as f64;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn todo(id: &str, text: &str) -> Todo {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        Todo::from_draft(id.into(), crate::models::NewTodo::new(text), at)
    }

    #[test]
    fn test_collate_ignores_case() {
        assert_eq!(collate("apple", "Banana"), Ordering::Less);
        assert_eq!(collate("Zebra", "apple"), Ordering::Greater);
    }

    #[test]
    fn test_undated_sort_last_both_directions() {
        let mut dated = todo("1", "a");
        dated.due_date = Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap());
        let undated = todo("2", "b");
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let sort = Sort { field: SortField::DueDate, direction };
            assert_eq!(compare(&dated, &undated, &sort), Ordering::Less);
            assert_eq!(compare(&undated, &dated, &sort), Ordering::Greater);
        }
    }

    #[test]
    fn test_choice_from_option() {
        assert_eq!(Choice::<Priority>::from(None), Choice::All);
        assert_eq!(Choice::from(Some(Priority::High)), Choice::Only(Priority::High));
    }
}
