mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::TestEnv;
use serde_json::{json, Value};
use tododeck::error::{ApiError, ApiResult, AppError};
use tododeck::models::{Category, NewSubTask, NewTodo, Priority, Status, TodoPatch};
use tododeck::store::Store;
use tododeck::sync::{NestedResource, TodoBackend, TodoSync};

/// In-memory stand-in for the REST backend.
#[derive(Default)]
struct Server {
    records: RefCell<Vec<Value>>,
    next_id: Cell<u32>,
    fail: Cell<bool>,
    calls: RefCell<Vec<String>>,
}

impl Server {
    fn with(records: Vec<Value>) -> Rc<Server> {
        let server = Server::default();
        *server.records.borrow_mut() = records;
        Rc::new(server)
    }

    fn check(&self, call: String) -> ApiResult<()> {
        self.calls.borrow_mut().push(call);
        if self.fail.get() {
            Err(ApiError::Status { status: 500, message: "boom".into() })
        } else {
            Ok(())
        }
    }

    fn find(&self, id: &str) -> Option<usize> {
        self.records.borrow().iter().position(|r| r["_id"] == id)
    }
}

struct FakeBackend(Rc<Server>);

impl TodoBackend for FakeBackend {
    fn list(&self) -> ApiResult<Vec<Value>> {
        self.0.check("list".into())?;
        Ok(self.0.records.borrow().clone())
    }

    fn create(&self, payload: &Value) -> ApiResult<Value> {
        self.0.check("create".into())?;
        let n = self.0.next_id.get() + 1;
        self.0.next_id.set(n);
        let mut record = payload.clone();
        record["_id"] = json!(format!("srv-{}", n));
        self.0.records.borrow_mut().push(record.clone());
        Ok(record)
    }

    fn update(&self, id: &str, patch: &Value) -> ApiResult<Value> {
        self.0.check(format!("update {}", id))?;
        let pos = self.0.find(id).ok_or(ApiError::Status { status: 404, message: "Todo not found".into() })?;
        let mut records = self.0.records.borrow_mut();
        if let (Some(record), Some(fields)) = (records[pos].as_object_mut(), patch.as_object()) {
            for (k, v) in fields {
                record.insert(k.clone(), v.clone());
            }
        }
        Ok(records[pos].clone())
    }

    fn delete(&self, id: &str) -> ApiResult<()> {
        self.0.check(format!("delete {}", id))?;
        let pos = self.0.find(id).ok_or(ApiError::Status { status: 404, message: "Todo not found".into() })?;
        self.0.records.borrow_mut().remove(pos);
        Ok(())
    }

    fn add_nested(&self, todo_id: &str, resource: NestedResource, payload: &Value) -> ApiResult<Value> {
        self.0.check(format!("{} {}", resource.path(), todo_id))?;
        let pos = self.0.find(todo_id).ok_or(ApiError::Status { status: 404, message: "Todo not found".into() })?;
        let key = match resource {
            NestedResource::SubTasks => "subTasks",
            NestedResource::Comments => "comments",
            NestedResource::TimeEntries => "timeEntries",
        };
        let mut records = self.0.records.borrow_mut();
        let mut item = payload.clone();
        item["_id"] = json!(format!("{}-{}", key, todo_id));
        match records[pos].get_mut(key).and_then(Value::as_array_mut) {
            Some(items) => items.push(item),
            None => records[pos][key] = json!([item]),
        }
        Ok(records[pos].clone())
    }

    fn stats(&self) -> ApiResult<Value> {
        self.0.check("stats".into())?;
        Ok(json!({
            "totalTodos": 2,
            "completedTodos": 1,
            "pendingTodos": 1,
            "statusDistribution": [{ "_id": "completed", "count": 1 }, { "_id": "pending", "count": 1 }],
            "completionRate": 50.0
        }))
    }
}

fn server_record(id: &str, text: &str, status: &str) -> Value {
    json!({ "_id": id, "text": text, "status": status, "priority": "medium", "category": "work" })
}

fn online(server: &Rc<Server>) -> TodoSync {
    let store = Store::new(Box::new(TestEnv::new()));
    TodoSync::new(store, Some(Box::new(FakeBackend(Rc::clone(server)))), None)
}

#[test]
fn test_refresh_normalizes_server_records() {
    let server = Server::with(vec![
        json!({ "_id": "m1", "title": "Legacy title", "status": "in_progress" }),
        server_record("m2", "Done already", "completed"),
        json!({ "_id": "m3", "text": "Odd", "status": "blocked" }),
        json!({ "text": "no id" }),
    ]);
    let mut sync = online(&server);

    assert_eq!(sync.refresh().unwrap(), 3);
    let store = sync.store();
    let m1 = store.get("m1").unwrap();
    assert_eq!(m1.text, "Legacy title");
    assert_eq!(m1.status, Status::InProgress);
    assert!(m1.sub_tasks.is_empty());
    assert!(m1.tags.is_empty());

    let m2 = store.get("m2").unwrap();
    assert!(m2.completed);
    assert_eq!(m2.progress, 100);

    assert_eq!(store.get("m3").unwrap().status, Status::Todo);
}

#[test]
fn test_refresh_keeps_records_with_loose_fields() {
    let server = Server::with(vec![
        json!({ "_id": "p1", "text": "Fractional progress", "status": "pending", "progress": 66.7 }),
        json!({ "_id": "p2", "text": "Fractional estimate", "status": "pending", "estimatedTime": 1.5, "actualTime": "40" }),
        json!({ "_id": "p3", "text": "Odd category", "status": "pending", "category": "errands", "priority": "urgent" }),
        json!({ "_id": "p4", "text": "Loose subtask", "status": "pending", "subTasks": [{ "text": "no id" }] }),
    ]);
    let mut sync = online(&server);

    assert_eq!(sync.refresh().unwrap(), 4);
    let store = sync.store();
    assert_eq!(store.get("p1").unwrap().progress, 0);

    let p2 = store.get("p2").unwrap();
    assert_eq!(p2.estimated_time, Some(2));
    assert_eq!(p2.actual_time, Some(40));

    let p3 = store.get("p3").unwrap();
    assert_eq!(p3.category, Category::Other);
    assert_eq!(p3.priority, Priority::Medium);

    let p4 = store.get("p4").unwrap();
    assert_eq!(p4.sub_tasks.len(), 1);
    assert_eq!(p4.sub_tasks[0].text, "no id");
    assert!(!p4.sub_tasks[0].id.is_empty());
}

#[test]
fn test_generated_nested_ids_are_stable_across_pulls() {
    let server = Server::with(vec![json!({
        "_id": "t1",
        "text": "Trip",
        "timeEntries": [{ "duration": 12.6, "description": "booking" }],
        "attachments": [{ "name": "map.png", "url": "https://files.example.com/map.png", "type": "image/png", "size": 1024.0 }]
    })]);
    let mut sync = online(&server);

    sync.refresh().unwrap();
    let first = sync.store().get("t1").unwrap().clone();
    assert_eq!(first.time_entries[0].duration, 13);
    assert_eq!(first.attachments[0].size, 1024);

    sync.refresh().unwrap();
    let second = sync.store().get("t1").unwrap();
    assert_eq!(second.time_entries[0].id, first.time_entries[0].id);
    assert_eq!(second.attachments[0].id, first.attachments[0].id);
    assert_ne!(first.time_entries[0].id, first.attachments[0].id);
}

#[test]
fn test_server_only_fields_are_carried() {
    let server = Server::with(vec![json!({
        "_id": "t1",
        "text": "Renew passport",
        "status": "pending",
        "customFields": { "ticket": "OPS-12", "effort": 3 },
        "notificationSettings": { "email": true, "reminderMinutes": [60, 1440] }
    })]);
    let mut sync = online(&server);
    sync.refresh().unwrap();

    let t = sync.store().get("t1").unwrap();
    assert_eq!(t.custom_fields.get("ticket"), Some(&json!("OPS-12")));
    assert_eq!(t.notification_settings, Some(json!({ "email": true, "reminderMinutes": [60, 1440] })));

    let cached = serde_json::to_value(t).unwrap();
    assert_eq!(cached["customFields"]["effort"], 3);
    assert_eq!(cached["notificationSettings"]["email"], true);
}

#[test]
fn test_create_adopts_server_id() {
    let server = Server::with(vec![]);
    let mut sync = online(&server);

    let draft = NewTodo { priority: Priority::High, ..NewTodo::new("Call plumber") };
    let id = sync.create(draft).unwrap();

    assert_eq!(id, "srv-1");
    assert_eq!(sync.store().todos().len(), 1);
    assert_eq!(sync.store().todos()[0].id, "srv-1");
    assert_eq!(sync.store().todos()[0].priority, Priority::High);
    assert_eq!(server.records.borrow()[0]["status"], "pending");
}

#[test]
fn test_failed_create_leaves_no_trace() {
    let server = Server::with(vec![]);
    server.fail.set(true);
    let mut sync = online(&server);

    let err = sync.create(NewTodo::new("Never saved")).unwrap_err();
    assert!(matches!(err, AppError::Api(ApiError::Status { status: 500, .. })));
    assert!(sync.store().todos().is_empty());
}

#[test]
fn test_empty_text_is_rejected_before_any_request() {
    let server = Server::with(vec![]);
    let mut sync = online(&server);
    assert!(matches!(sync.create(NewTodo::new("   ")), Err(AppError::Validation(_))));
    assert!(server.calls.borrow().is_empty());
}

#[test]
fn test_blank_rename_is_rejected_before_any_request() {
    let server = Server::with(vec![server_record("t1", "Mow lawn", "pending")]);
    let mut sync = online(&server);
    sync.refresh().unwrap();
    let calls = server.calls.borrow().len();

    let blank = TodoPatch { text: Some(" \t ".into()), ..Default::default() };
    assert!(matches!(sync.update("t1", blank), Err(AppError::Validation(_))));

    assert_eq!(server.calls.borrow().len(), calls);
    assert_eq!(sync.store().get("t1").unwrap().text, "Mow lawn");
    assert!(!sync.is_pending("t1"));
}

#[test]
fn test_failed_update_rolls_back() {
    let server = Server::with(vec![server_record("t1", "Mow lawn", "pending")]);
    let mut sync = online(&server);
    sync.refresh().unwrap();
    let before = sync.store().get("t1").unwrap().clone();

    server.fail.set(true);
    assert!(sync.toggle_star("t1").is_err());

    assert_eq!(sync.store().get("t1").unwrap(), &before);
    assert!(!sync.is_pending("t1"));
}

#[test]
fn test_update_sends_wire_status() {
    let server = Server::with(vec![server_record("t1", "Mow lawn", "pending")]);
    let mut sync = online(&server);
    sync.refresh().unwrap();

    sync.toggle_completed("t1").unwrap();

    assert_eq!(server.records.borrow()[0]["status"], "completed");
    let t = sync.store().get("t1").unwrap();
    assert!(t.completed);
    assert_eq!(t.status, Status::Done);
}

#[test]
fn test_out_of_order_responses_apply_in_issue_order() {
    let server = Server::with(vec![server_record("t1", "Draft", "pending")]);
    let mut sync = online(&server);
    sync.refresh().unwrap();

    let first = sync.begin_update("t1", TodoPatch { text: Some("First".into()), ..Default::default() }).unwrap();
    let second = sync.begin_update("t1", TodoPatch { text: Some("Second".into()), ..Default::default() }).unwrap();
    assert_eq!(sync.store().get("t1").unwrap().text, "Second");
    assert_eq!(sync.in_flight(), 2);

    // the newer request answers first
    sync.finish_update(&second, Ok(server_record("t1", "Second", "pending"))).unwrap();
    assert_eq!(sync.store().get("t1").unwrap().text, "Second");

    // the stale answer arrives last and must not clobber the newer edit
    sync.finish_update(&first, Ok(server_record("t1", "First", "pending"))).unwrap();
    assert_eq!(sync.store().get("t1").unwrap().text, "Second");
    assert_eq!(sync.in_flight(), 0);
}

#[test]
fn test_failed_earlier_update_keeps_later_one() {
    let server = Server::with(vec![server_record("t1", "Draft", "pending")]);
    let mut sync = online(&server);
    sync.refresh().unwrap();

    let star = sync.begin_update("t1", TodoPatch { is_starred: Some(true), ..Default::default() }).unwrap();
    let rename = sync.begin_update("t1", TodoPatch { text: Some("Renamed".into()), ..Default::default() }).unwrap();

    let rejected = ApiError::Status { status: 400, message: "nope".into() };
    assert!(sync.finish_update(&star, Err(rejected)).is_err());
    let t = sync.store().get("t1").unwrap();
    assert!(!t.is_starred);
    assert_eq!(t.text, "Renamed");

    sync.finish_update(&rename, Ok(server_record("t1", "Renamed", "pending"))).unwrap();
    let t = sync.store().get("t1").unwrap();
    assert!(!t.is_starred);
    assert_eq!(t.text, "Renamed");
}

#[test]
fn test_delete_waits_for_server() {
    let server = Server::with(vec![server_record("t1", "Keep me", "pending")]);
    let mut sync = online(&server);
    sync.refresh().unwrap();

    server.fail.set(true);
    assert!(sync.delete("t1").is_err());
    assert!(sync.store().get("t1").is_some());

    server.fail.set(false);
    sync.delete("t1").unwrap();
    assert!(sync.store().get("t1").is_none());
    assert!(server.records.borrow().is_empty());
}

#[test]
fn test_column_move_is_fire_and_forget() {
    let server = Server::with(vec![server_record("t1", "Card", "pending")]);
    let mut sync = online(&server);
    sync.refresh().unwrap();

    server.fail.set(true);
    sync.move_to_status("t1", Status::InProgress).unwrap();
    assert_eq!(sync.store().get("t1").unwrap().status, Status::InProgress);
}

#[test]
fn test_reorder_is_local_only() {
    let server = Server::with(vec![server_record("a", "A", "pending"), server_record("b", "B", "pending")]);
    let mut sync = online(&server);
    sync.refresh().unwrap();
    let calls = server.calls.borrow().len();

    assert!(sync.reorder(0, 1));
    assert!(!sync.reorder(0, 7));
    let ids: Vec<&str> = sync.store().todos().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["b", "a"]);
    assert_eq!(server.calls.borrow().len(), calls);
}

#[test]
fn test_subtask_goes_through_nested_endpoint() {
    let server = Server::with(vec![server_record("t1", "Pack", "pending")]);
    let mut sync = online(&server);
    sync.refresh().unwrap();

    sync.add_subtask("t1", NewSubTask::new("Socks")).unwrap();

    assert!(server.calls.borrow().contains(&"subtasks t1".to_string()));
    let t = sync.store().get("t1").unwrap();
    assert_eq!(t.sub_tasks.len(), 1);
    assert_eq!(t.sub_tasks[0].text, "Socks");
    assert_eq!(t.progress, 0);
}

#[test]
fn test_server_stats() {
    let server = Server::with(vec![]);
    let sync = online(&server);
    let stats = sync.stats().unwrap();
    assert_eq!(stats.total_todos, 2);
    assert_eq!(stats.status_distribution.get("done"), Some(&1));
    assert_eq!(stats.completion_rate, 50.0);
}

#[test]
fn test_offline_works_locally() {
    let store = Store::new(Box::new(TestEnv::new()));
    let mut sync = TodoSync::new(store, None, None);

    let id = sync.create(NewTodo::new("Offline")).unwrap();
    assert_eq!(id, "id-1");
    sync.toggle_completed(&id).unwrap();
    sync.add_subtask(&id, NewSubTask::new("Step")).unwrap();
    let stats = sync.stats().unwrap();
    assert_eq!(stats.total_todos, 1);
    assert_eq!(stats.completed_todos, 1);
    sync.delete(&id).unwrap();
    assert!(sync.store().todos().is_empty());
}
