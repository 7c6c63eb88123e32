mod common;

use chrono::{Local, NaiveDate};
use common::{todo, TestEnv};
use tododeck::commands::*;
use tododeck::error::AppError;
use tododeck::models::Priority;
use tododeck::projection::{Choice, SortDirection, SortField};
use tododeck::store::{State, Store};

fn store() -> Store {
    let todos = vec![todo("3f2a9c10", "One"), todo("3f2b0000", "Two"), todo("77aa0000", "Three")];
    Store::with_state(State::with_todos(todos), Box::new(TestEnv::new()))
}

#[test]
fn test_resolve_id_by_prefix() {
    let store = store();
    assert_eq!(resolve_id(&store, "77").unwrap(), "77aa0000");
    assert_eq!(resolve_id(&store, "3f2a").unwrap(), "3f2a9c10");
    assert!(matches!(resolve_id(&store, "3f2"), Err(AppError::Validation(_))));
    assert!(matches!(resolve_id(&store, "zz"), Err(AppError::NotFound(_))));
}

#[test]
fn test_short_id() {
    assert_eq!(short_id("0123456789abcdef"), "01234567");
    assert_eq!(short_id("abc"), "abc");
}

#[test]
fn test_parse_due_is_local_day() {
    let due = parse_due("2026-11-02").unwrap();
    assert_eq!(due.with_timezone(&Local).date_naive(), NaiveDate::from_ymd_opt(2026, 11, 2).unwrap());
    assert!(matches!(parse_due("next tuesday"), Err(AppError::Validation(_))));
}

#[test]
fn test_filter_args_only_set_what_was_given() {
    let args = FilterArgs { priority: Some(Priority::High), hide_completed: true, ..Default::default() };
    let patch = args.filter_patch();
    assert_eq!(patch.priority, Some(Choice::Only(Priority::High)));
    assert_eq!(patch.show_completed, Some(false));
    assert_eq!(patch.category, None);
    assert_eq!(patch.starred_only, None);
    assert_eq!(args.sort(), None);

    let asc = FilterArgs { sort: Some(SortField::DueDate), asc: true, ..Default::default() };
    let sort = asc.sort().unwrap();
    assert_eq!(sort.field, SortField::DueDate);
    assert_eq!(sort.direction, SortDirection::Asc);
}

#[test]
fn test_edit_args_clear_due_date() {
    let args = EditArgs { due: Some("none".into()), text: Some("Renamed".into()), ..Default::default() };
    let patch = args.to_patch().unwrap();
    assert_eq!(patch.due_date, Some(None));
    assert_eq!(patch.text.as_deref(), Some("Renamed"));
    assert_eq!(patch.tags, None);
}
