//! Translation between server records and the canonical [`Todo`] shape.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Attachment, Category, Comment, NewTodo, Priority, Recurrence, Status, SubTask, TimeEntry, Todo, TodoPatch,
    TodoStats,
};

const COLLECTIONS: [&str; 6] = ["subTasks", "comments", "attachments", "timeEntries", "dependencies", "tags"];
const NESTED: [&str; 4] = ["subTasks", "comments", "attachments", "timeEntries"];

/// Maps the server's workflow vocabulary onto [`Status`]. Unknown values
/// fall back to [`Status::Todo`].
pub fn map_status(raw: &str) -> Status {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pending" | "todo" => Status::Todo,
        "in-progress" | "in_progress" | "inprogress" => Status::InProgress,
        "completed" | "done" => Status::Done,
        other => {
            tracing::debug!(status = other, "unrecognised status, treating as todo");
            Status::Todo
        }
    }
}

/// Server spelling of a status.
pub fn status_to_wire(status: Status) -> &'static str {
    match status {
        Status::Todo => "pending",
        Status::InProgress => "in-progress",
        Status::Done => "completed",
    }
}

fn is_present(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).is_some_and(|v| !v.is_null())
}

/// Identity may arrive as `id` or `_id`, as a string or a number.
fn take_id(map: &mut Map<String, Value>) -> Option<String> {
    for key in ["id", "_id"] {
        match map.remove(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Fills in identity and audit stamps on a nested item so it deserializes.
/// Items without an id get one derived from the parent and their position,
/// so repeated pulls agree on it.
fn normalize_nested(item: &mut Value, fallback_id: String, fallback_stamp: &Value) {
    let Value::Object(map) = item else {
        return;
    };
    let id = take_id(map).unwrap_or(fallback_id);
    map.insert("id".into(), Value::String(id));
    if !is_present(map, "createdAt") {
        map.insert("createdAt".into(), fallback_stamp.clone());
    }
    if !is_present(map, "updatedAt") {
        let created = map.get("createdAt").cloned().unwrap_or(Value::Null);
        map.insert("updatedAt".into(), created);
    }
    coerce_whole(map, "duration", u64::from(u32::MAX));
    coerce_whole(map, "size", u64::MAX);
}

/// Rounds a numeric field to a non-negative integer no larger than `max`.
/// Numeric strings are accepted; anything else is removed so the field's
/// default applies.
fn coerce_whole(map: &mut Map<String, Value>, key: &str, max: u64) {
    let number = match map.get(key) {
        None | Some(Value::Null) => return,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match number.filter(|n| n.is_finite()) {
        Some(n) => {
            let whole = n.round().clamp(0.0, max as f64) as u64;
            map.insert(key.into(), Value::from(whole));
        }
        None => {
            tracing::debug!(field = key, "dropping non-numeric value");
            map.remove(key);
        }
    }
}

/// Removes `key` when its value does not decode as `T`, so the field's
/// default applies instead of failing the whole record.
fn drop_unless<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) {
    let Some(value) = map.get(key) else {
        return;
    };
    if value.is_null() {
        return;
    }
    if let Err(e) = serde_json::from_value::<T>(value.clone()) {
        tracing::debug!(field = key, error = %e, "dropping unreadable value");
        map.remove(key);
    }
}

/// Keeps only the items of a collection that decode as `T`.
fn retain_items<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) {
    if let Some(Value::Array(items)) = map.get_mut(key) {
        items.retain(|item| match serde_json::from_value::<T>(item.clone()) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(collection = key, error = %e, "skipping unreadable item");
                false
            }
        });
    }
}

/// Converts one server record into a [`Todo`].
///
/// Accepts `_id` for identity and `title` for text, maps the status
/// vocabulary, defaults missing collections to empty, derives `completed`
/// from status, and stamps missing audit fields with `now`.
pub fn normalize(record: Value, now: DateTime<Utc>) -> ApiResult<Todo> {
    let Value::Object(mut map) = record else {
        return Err(ApiError::Decode("todo record is not an object".into()));
    };

    let id = take_id(&mut map).ok_or_else(|| ApiError::Decode("todo record has no id".into()))?;
    map.insert("id".into(), Value::String(id.clone()));
    // derived locally
    map.remove("progress");

    if !is_present(&map, "text") {
        if let Some(title) = map.remove("title") {
            map.insert("text".into(), title);
        }
    }

    let status = map.get("status").and_then(Value::as_str).map(map_status);
    map.insert("status".into(), Value::String(status.unwrap_or_default().as_str().into()));

    for key in ["priority", "category"] {
        if let Some(Value::String(raw)) = map.get(key) {
            let lowered = raw.trim().to_ascii_lowercase();
            map.insert(key.into(), Value::String(lowered));
        }
    }
    drop_unless::<Priority>(&mut map, "priority");
    drop_unless::<Category>(&mut map, "category");
    for key in ["estimatedTime", "actualTime"] {
        coerce_whole(&mut map, key, u64::from(u32::MAX));
    }
    if let Some(Value::Object(recurrence)) = map.get_mut("recurrence") {
        coerce_whole(recurrence, "interval", u64::from(u32::MAX));
    }
    drop_unless::<Recurrence>(&mut map, "recurrence");
    drop_unless::<Map<String, Value>>(&mut map, "customFields");

    for key in COLLECTIONS {
        if !map.get(key).is_some_and(Value::is_array) {
            map.insert(key.into(), Value::Array(Vec::new()));
        }
    }

    if !is_present(&map, "createdAt") {
        map.insert("createdAt".into(), serde_json::to_value(now).map_err(|e| ApiError::Decode(e.to_string()))?);
    }
    let created = map.get("createdAt").cloned().unwrap_or(Value::Null);
    if !is_present(&map, "updatedAt") {
        map.insert("updatedAt".into(), created.clone());
    }
    if !is_present(&map, "lastActivityAt") {
        let updated = map.get("updatedAt").cloned().unwrap_or(Value::Null);
        map.insert("lastActivityAt".into(), updated);
    }

    for key in NESTED {
        if let Some(Value::Array(items)) = map.get_mut(key) {
            for (i, item) in items.iter_mut().enumerate() {
                normalize_nested(item, format!("{}-{}-{}", id, key, i), &created);
            }
        }
    }
    retain_items::<SubTask>(&mut map, "subTasks");
    retain_items::<Comment>(&mut map, "comments");
    retain_items::<Attachment>(&mut map, "attachments");
    retain_items::<TimeEntry>(&mut map, "timeEntries");
    retain_items::<String>(&mut map, "tags");
    retain_items::<String>(&mut map, "dependencies");

    let mut todo: Todo = serde_json::from_value(Value::Object(map)).map_err(|e| ApiError::Decode(e.to_string()))?;
    match status {
        Some(status) => todo.set_status(status),
        None => {
            let completed = todo.completed;
            todo.set_completed(completed);
        }
    }
    todo.recompute_progress();
    Ok(todo)
}

/// Normalizes a list, skipping records that cannot be read.
pub fn normalize_all(records: Vec<Value>, now: DateTime<Utc>) -> Vec<Todo> {
    records
        .into_iter()
        .filter_map(|record| match normalize(record, now) {
            Ok(todo) => Some(todo),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable todo record");
                None
            }
        })
        .collect()
}

fn rewrite_status(value: &mut Value) {
    if let Some(map) = value.as_object_mut() {
        if let Some(status) = map.get("status").and_then(Value::as_str).map(map_status) {
            map.insert("status".into(), Value::String(status_to_wire(status).into()));
        }
    }
}

/// Request body for a patch, using the server's status spelling.
pub fn patch_payload(patch: &TodoPatch) -> Value {
    let mut value = serde_json::to_value(patch).unwrap_or_else(|_| Value::Object(Map::new()));
    rewrite_status(&mut value);
    value
}

/// Request body for a new todo, using the server's status spelling.
pub fn draft_payload(draft: &NewTodo) -> Value {
    let mut value = serde_json::to_value(draft).unwrap_or_else(|_| Value::Object(Map::new()));
    rewrite_status(&mut value);
    value
}

#[derive(Deserialize)]
struct Bucket {
    #[serde(rename = "_id")]
    key: Option<String>,
    count: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStats {
    #[serde(default)]
    total_todos: usize,
    #[serde(default)]
    completed_todos: usize,
    #[serde(default)]
    pending_todos: usize,
    #[serde(default)]
    status_distribution: Vec<Bucket>,
    #[serde(default)]
    priority_distribution: Vec<Bucket>,
    #[serde(default)]
    category_distribution: Vec<Bucket>,
    #[serde(default)]
    tag_usage: Vec<Bucket>,
    #[serde(default)]
    estimated_total_time: f64,
    #[serde(default)]
    actual_total_time: f64,
    #[serde(default)]
    completion_rate: f64,
}

/// Reads the stats endpoint's `{_id, count}` bucket lists into [`TodoStats`].
pub fn parse_stats(value: Value) -> ApiResult<TodoStats> {
    let raw: RawStats = serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;
    let fold = |buckets: Vec<Bucket>, rename: fn(&str) -> String| {
        let mut out: BTreeMap<String, usize> = BTreeMap::new();
        for bucket in buckets {
            let key = rename(bucket.key.as_deref().unwrap_or("none"));
            *out.entry(key).or_default() += bucket.count;
        }
        out
    };
    Ok(TodoStats {
        total_todos: raw.total_todos,
        completed_todos: raw.completed_todos,
        pending_todos: raw.pending_todos,
        status_distribution: fold(raw.status_distribution, |s| map_status(s).as_str().to_string()),
        priority_distribution: fold(raw.priority_distribution, str::to_string),
        category_distribution: fold(raw.category_distribution, str::to_string),
        tag_usage: fold(raw.tag_usage, str::to_string),
        estimated_total_time: raw.estimated_total_time.max(0.0) as u64,
        actual_total_time: raw.actual_total_time.max(0.0) as u64,
        completion_rate: raw.completion_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_round_trips_through_wire_names() {
        for status in Status::ALL {
            assert_eq!(map_status(status_to_wire(status)), status);
        }
    }

    #[test]
    fn test_patch_payload_uses_wire_status() {
        let payload = patch_payload(&TodoPatch::status(Status::Done));
        assert_eq!(payload, json!({ "status": "completed" }));
    }

    #[test]
    fn test_parse_stats_buckets() {
        let stats = parse_stats(json!({
            "totalTodos": 3,
            "completedTodos": 1,
            "pendingTodos": 2,
            "statusDistribution": [{ "_id": "pending", "count": 2 }, { "_id": "completed", "count": 1 }],
            "tagUsage": [{ "_id": "home", "count": 2 }],
            "completionRate": 33.3
        }))
        .unwrap();
        assert_eq!(stats.status_distribution.get("todo"), Some(&2));
        assert_eq!(stats.status_distribution.get("done"), Some(&1));
        assert_eq!(stats.tag_usage.get("home"), Some(&2));
    }

    #[test]
    fn test_coerce_whole_rounds_and_clamps() {
        let mut map = json!({ "a": 1.5, "b": -3.2, "c": "17", "d": "soon", "e": 9e12 })
            .as_object()
            .cloned()
            .unwrap();
        for key in ["a", "b", "c", "d", "e"] {
            coerce_whole(&mut map, key, u64::from(u32::MAX));
        }
        assert_eq!(map["a"], json!(2));
        assert_eq!(map["b"], json!(0));
        assert_eq!(map["c"], json!(17));
        assert!(!map.contains_key("d"));
        assert_eq!(map["e"], json!(u32::MAX));
    }

    #[test]
    fn test_unreadable_optional_fields_fall_back() {
        let now = Utc::now();
        let todo = normalize(
            json!({
                "_id": "t1",
                "text": "Loose",
                "priority": "High",
                "recurrence": { "type": "fortnightly" },
                "customFields": "not an object",
                "tags": ["home", 7],
                "comments": [{ "text": "first" }, "garbage"]
            }),
            now,
        )
        .unwrap();
        assert_eq!(todo.priority, Priority::High);
        assert_eq!(todo.recurrence, None);
        assert!(todo.custom_fields.is_empty());
        assert_eq!(todo.tags, ["home"]);
        assert_eq!(todo.comments.len(), 1);
        assert_eq!(todo.comments[0].id, "t1-comments-0");
        assert_eq!(todo.comments[0].created_at, now);
    }
}
