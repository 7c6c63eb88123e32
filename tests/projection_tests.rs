mod common;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use common::todo;
use tododeck::models::{Category, Priority, Status, TimeEntry, Todo};
use tododeck::projection::{
    self, calendar, filter_todos, kanban, project, stats, ArchivedFilter, Choice, DueFilter, Filter, FilterPatch,
    Sort, SortDirection, SortField,
};
use tododeck::store::{Action, State, Store};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

fn due_in(mut t: Todo, days: i64) -> Todo {
    let noon = Utc.from_utc_datetime(&today().and_hms_opt(12, 0, 0).unwrap());
    t.due_date = Some(noon + Duration::days(days));
    t
}

fn sample() -> Vec<Todo> {
    let mut a = todo("a", "Quarterly report");
    a.priority = Priority::High;
    a.category = Category::Work;
    a.tags = vec!["Finance".into()];
    let mut b = todo("b", "buy groceries");
    b.priority = Priority::Low;
    b.category = Category::Shopping;
    let mut c = todo("c", "Dentist");
    c.priority = Priority::High;
    c.category = Category::Health;
    c.set_completed(true);
    let mut d = todo("d", "Old idea");
    d.is_archived = true;
    d.priority = Priority::High;
    vec![due_in(a, -2), b, due_in(c, 0), due_in(d, 3)]
}

fn ids(todos: &[&Todo]) -> Vec<String> {
    todos.iter().map(|t| t.id.clone()).collect()
}

#[test]
fn test_priority_filter_with_all_categories() {
    let todos = sample();
    let filter = Filter {
        priority: Choice::Only(Priority::High),
        category: Choice::All,
        archived: ArchivedFilter::Include,
        ..Default::default()
    };
    let expected: Vec<String> =
        todos.iter().filter(|t| t.priority == Priority::High).map(|t| t.id.clone()).collect();
    assert_eq!(ids(&filter_todos(&todos, &filter, today(), &Utc)), expected);
}

#[test]
fn test_archived_hidden_by_default() {
    let todos = sample();
    let visible = filter_todos(&todos, &Filter::default(), today(), &Utc);
    assert_eq!(ids(&visible), ["a", "b", "c"]);

    let only = Filter { archived: ArchivedFilter::Only, ..Default::default() };
    assert_eq!(ids(&filter_todos(&todos, &only, today(), &Utc)), ["d"]);
}

#[test]
fn test_search_matches_text_and_tags_case_insensitively() {
    let todos = sample();
    let by_text = Filter { search: "BUY".into(), ..Default::default() };
    assert_eq!(ids(&filter_todos(&todos, &by_text, today(), &Utc)), ["b"]);

    let by_tag = Filter { search: "finance".into(), ..Default::default() };
    assert_eq!(ids(&filter_todos(&todos, &by_tag, today(), &Utc)), ["a"]);
}

#[test]
fn test_due_buckets() {
    let todos = sample();
    let bucket = |due| {
        let filter = Filter { due, archived: ArchivedFilter::Include, ..Default::default() };
        ids(&filter_todos(&todos, &filter, today(), &Utc))
    };
    assert_eq!(bucket(DueFilter::Overdue), ["a"]);
    assert_eq!(bucket(DueFilter::Today), ["c"]);
    assert_eq!(bucket(DueFilter::ThisWeek), ["c", "d"]);
    assert_eq!(bucket(DueFilter::NoDate), ["b"]);
}

#[test]
fn test_hide_completed() {
    let todos = sample();
    let filter = Filter { show_completed: false, ..Default::default() };
    assert_eq!(ids(&filter_todos(&todos, &filter, today(), &Utc)), ["a", "b"]);
}

#[test]
fn test_set_filter_merges_into_state() {
    let mut store = Store::with_state(State::with_todos(sample()), Box::new(common::TestEnv::new()));
    store.dispatch(Action::SetFilter(FilterPatch { priority: Some(Choice::Only(Priority::High)), ..Default::default() }));
    store.dispatch(Action::SetFilter(FilterPatch { search: Some("dent".into()), ..Default::default() }));

    let filter = &store.state().filter;
    assert_eq!(filter.priority, Choice::Only(Priority::High));
    assert_eq!(filter.search, "dent");
    assert_eq!(ids(&project(store.state(), today(), &Utc)), ["c"]);
}

#[test]
fn test_sort_by_priority_and_text() {
    let todos = sample();
    let mut refs: Vec<&Todo> = todos.iter().collect();

    projection::sort_todos(&mut refs, &Sort { field: SortField::Text, direction: SortDirection::Asc });
    assert_eq!(ids(&refs), ["b", "c", "d", "a"]);

    projection::sort_todos(&mut refs, &Sort { field: SortField::Priority, direction: SortDirection::Desc });
    assert_eq!(refs[0].priority, Priority::High);
    assert_eq!(refs.last().unwrap().priority, Priority::Low);
}

#[test]
fn test_reorder_shows_up_in_projection() {
    let mut todos = vec![todo("a", "First"), todo("b", "Second"), todo("c", "Third")];
    for (i, t) in todos.iter_mut().enumerate() {
        t.created_at += Duration::minutes(i as i64);
    }
    let mut store = Store::with_state(State::with_todos(todos), Box::new(common::TestEnv::new()));
    store.dispatch(Action::SetSort(Sort { field: SortField::CreatedAt, direction: SortDirection::Desc }));
    assert_eq!(ids(&project(store.state(), today(), &Utc)), ["c", "b", "a"]);

    store.dispatch(Action::Reorder { from: 2, to: 0 });
    assert_eq!(ids(&project(store.state(), today(), &Utc)), ["c", "a", "b"]);
}

#[test]
fn test_default_sort_keeps_store_order() {
    let mut todos = vec![todo("a", "Zebra"), todo("b", "apple")];
    todos[0].created_at += Duration::hours(1);
    let state = State::with_todos(todos);
    assert_eq!(state.sort.field, SortField::Manual);
    assert_eq!(ids(&project(&state, today(), &Utc)), ["a", "b"]);
}

#[test]
fn test_sort_by_due_date_keeps_undated_last() {
    let todos = sample();
    let mut refs: Vec<&Todo> = todos.iter().collect();
    projection::sort_todos(&mut refs, &Sort { field: SortField::DueDate, direction: SortDirection::Desc });
    assert_eq!(ids(&refs), ["d", "c", "a", "b"]);
}

#[test]
fn test_kanban_columns_partition_todos() {
    let mut todos = sample();
    todos[1].set_status(Status::InProgress);
    let refs: Vec<&Todo> = todos.iter().collect();
    let columns = kanban(&refs);

    let statuses: Vec<Status> = columns.iter().map(|c| c.status).collect();
    assert_eq!(statuses, [Status::Todo, Status::InProgress, Status::Done]);
    assert_eq!(ids(&columns[0].todos), ["a", "d"]);
    assert_eq!(ids(&columns[1].todos), ["b"]);
    assert_eq!(ids(&columns[2].todos), ["c"]);
    assert_eq!(columns.iter().map(|c| c.todos.len()).sum::<usize>(), todos.len());
}

#[test]
fn test_calendar_skips_undated_and_orders_days() {
    let todos = sample();
    let refs: Vec<&Todo> = todos.iter().collect();
    let days = calendar(&refs, &Utc);
    let keys: Vec<NaiveDate> = days.keys().copied().collect();
    assert_eq!(keys, [today() - Duration::days(2), today(), today() + Duration::days(3)]);
    assert!(days.values().flatten().all(|t| t.id != "b"));
}

#[test]
fn test_stats_counts() {
    let mut todos = sample();
    todos[0].estimated_time = Some(90);
    todos[1].time_entries.push(TimeEntry {
        id: "t1".into(),
        duration: 25,
        description: String::new(),
        start_time: None,
        end_time: None,
        created_at: common::epoch(),
        updated_at: common::epoch(),
    });
    let s = stats(&todos);
    assert_eq!(s.total_todos, 4);
    assert_eq!(s.completed_todos, 1);
    assert_eq!(s.pending_todos, 3);
    assert_eq!(s.completion_rate, 25.0);
    assert_eq!(s.priority_distribution.get("high"), Some(&3));
    assert_eq!(s.status_distribution.get("done"), Some(&1));
    assert_eq!(s.tag_usage.get("Finance"), Some(&1));
    assert_eq!(s.estimated_total_time, 90);
    assert_eq!(s.actual_total_time, 25);
}

#[test]
fn test_logged_minutes_do_not_wrap() {
    let mut t = todo("a", "Long haul");
    for id in ["e1", "e2"] {
        t.time_entries.push(TimeEntry {
            id: id.into(),
            duration: u32::MAX,
            description: String::new(),
            start_time: None,
            end_time: None,
            created_at: common::epoch(),
            updated_at: common::epoch(),
        });
    }
    let expected = 2 * u64::from(u32::MAX);
    assert_eq!(t.logged_minutes(), expected);
    assert_eq!(stats(&[t]).actual_total_time, expected);
}
