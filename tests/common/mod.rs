#![allow(dead_code)]

use std::cell::Cell;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tododeck::models::{NewTodo, Todo};
use tododeck::store::Env;

/// Deterministic clock and ids: every `now()` is one second later than the
/// last, ids count up from `id-1`.
pub struct TestEnv {
    tick: Cell<i64>,
    ids: Cell<u32>,
}

impl TestEnv {
    pub fn new() -> Self {
        TestEnv { tick: Cell::new(0), ids: Cell::new(0) }
    }
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

impl Env for TestEnv {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.tick.get() + 1;
        self.tick.set(tick);
        epoch() + Duration::seconds(tick)
    }

    fn new_id(&self) -> String {
        let id = self.ids.get() + 1;
        self.ids.set(id);
        format!("id-{}", id)
    }
}

pub fn todo(id: &str, text: &str) -> Todo {
    Todo::from_draft(id.to_string(), NewTodo::new(text), epoch())
}
