use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Workflow state of a todo. Also the set of kanban columns, in display order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in-progress",
            Status::Done => "done",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Status::Todo => "To Do",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
        }
    }

    /// Next column to the right, saturating at `Done`.
    pub fn next(&self) -> Status {
        match self {
            Status::Todo => Status::InProgress,
            _ => Status::Done,
        }
    }

    /// Next column to the left, saturating at `Todo`.
    pub fn previous(&self) -> Status {
        match self {
            Status::Done => Status::InProgress,
            _ => Status::Todo,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Ordinal used for sorting: low < medium < high.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Shopping,
    Health,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Work,
        Category::Personal,
        Category::Shopping,
        Category::Health,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Shopping => "shopping",
            Category::Health => "health",
            Category::Other => "other",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Repeat rule attached to a todo.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    #[serde(rename = "type")]
    pub kind: RecurrenceType,
    /// Repeat every `interval` units of `kind`.
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

fn default_interval() -> u32 {
    1
}

/// A checklist item inside a todo.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    /// Unique within the parent todo only.
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    /// Set when `completed` flips to true, cleared when it flips back.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub text: String,
    /// Author's user id. Older records call this `userId`.
    #[serde(default, alias = "userId")]
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub url: String,
    /// MIME type as reported by the uploader.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: String,
    /// Minutes spent.
    pub duration: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single task record, the aggregate root of the store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Opaque identifier, immutable once assigned.
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    /// Mirrors `status == Done`.
    #[serde(default)]
    pub completed: bool,
    /// Derived from subtasks (or `completed` when there are none).
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    /// Estimated effort in minutes.
    #[serde(default)]
    pub estimated_time: Option<u32>,
    /// Effort actually spent in minutes.
    #[serde(default)]
    pub actual_time: Option<u32>,
    #[serde(default)]
    pub is_starred: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub parent_task_id: Option<String>,
    /// Ids of todos this one waits on. Not validated against the store.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub sub_tasks: Vec<SubTask>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
    /// Free-form fields owned by the server; carried through untouched.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom_fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_settings: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

/// Everything a caller supplies to create a todo. Identity, audit stamps and
/// progress are assigned by the store.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub text: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub category: Category,
    pub tags: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub recurrence: Option<Recurrence>,
    pub estimated_time: Option<u32>,
    pub is_starred: bool,
    pub assigned_to: Option<String>,
    pub parent_task_id: Option<String>,
    pub dependencies: Vec<String>,
}

impl NewTodo {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Default::default() }
    }
}

/// Partial change-set for a todo. `None` leaves a field untouched; for
/// nullable fields `Some(None)` clears it.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Option<Recurrence>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_time: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_starred: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        *self == TodoPatch::default()
    }

    pub fn status(status: Status) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    /// Layers `later` over `self`; fields set in `later` win.
    pub fn merge(&mut self, later: &TodoPatch) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if later.$field.is_some() { self.$field = later.$field.clone(); })*
            };
        }
        take!(
            text, description, status, completed, priority, category, tags, due_date,
            recurrence, estimated_time, actual_time, is_starred, is_archived, assigned_to,
            dependencies
        );
    }
}

/// Drops duplicate tags while keeping the first occurrence.
fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// `round(100 * done / total)` when there are subtasks, else all-or-nothing
/// on `completed`.
pub fn compute_progress(sub_tasks: &[SubTask], completed: bool) -> u8 {
    if sub_tasks.is_empty() {
        return if completed { 100 } else { 0 };
    }
    let done = sub_tasks.iter().filter(|s| s.completed).count();
    ((done as f64 * 100.0) / sub_tasks.len() as f64).round() as u8
}

impl Todo {
    /// Builds a fresh todo from a draft, stamping every audit field with `now`.
    pub fn from_draft(id: String, draft: NewTodo, now: DateTime<Utc>) -> Todo {
        let completed = draft.status == Status::Done;
        let mut todo = Todo {
            id,
            text: draft.text,
            description: draft.description,
            status: draft.status,
            completed,
            progress: 0,
            priority: draft.priority,
            category: draft.category,
            tags: dedup_tags(draft.tags),
            due_date: draft.due_date,
            recurrence: draft.recurrence,
            estimated_time: draft.estimated_time,
            actual_time: None,
            is_starred: draft.is_starred,
            is_archived: false,
            assigned_to: draft.assigned_to,
            parent_task_id: draft.parent_task_id,
            dependencies: draft.dependencies,
            sub_tasks: Vec::new(),
            comments: Vec::new(),
            attachments: Vec::new(),
            time_entries: Vec::new(),
            custom_fields: Map::new(),
            notification_settings: None,
            created_at: now,
            updated_at: now,
            last_activity_at: now,
        };
        todo.recompute_progress();
        todo
    }

    /// Refreshes `updated_at` and `last_activity_at`, never moving them
    /// before `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        let stamp = now.max(self.created_at);
        self.updated_at = stamp;
        self.last_activity_at = stamp;
    }

    pub fn recompute_progress(&mut self) {
        self.progress = compute_progress(&self.sub_tasks, self.completed);
    }

    /// Sets completion and keeps `status` in step with it.
    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
        if completed {
            self.status = Status::Done;
        } else if self.status == Status::Done {
            self.status = Status::Todo;
        }
        self.recompute_progress();
    }

    /// Sets status and keeps `completed` in step with it.
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.completed = status == Status::Done;
        self.recompute_progress();
    }

    /// Merges a patch into this todo and refreshes the activity stamps.
    /// An empty patch only refreshes the stamps.
    pub fn apply(&mut self, patch: &TodoPatch, now: DateTime<Utc>) {
        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(tags) = &patch.tags {
            self.tags = dedup_tags(tags.clone());
        }
        if let Some(due) = patch.due_date {
            self.due_date = due;
        }
        if let Some(recurrence) = &patch.recurrence {
            self.recurrence = recurrence.clone();
        }
        if let Some(estimate) = patch.estimated_time {
            self.estimated_time = estimate;
        }
        if let Some(actual) = patch.actual_time {
            self.actual_time = actual;
        }
        if let Some(starred) = patch.is_starred {
            self.is_starred = starred;
        }
        if let Some(archived) = patch.is_archived {
            self.is_archived = archived;
        }
        if let Some(assignee) = &patch.assigned_to {
            self.assigned_to = assignee.clone();
        }
        if let Some(dependencies) = &patch.dependencies {
            self.dependencies = dependencies.clone();
        }
        // status wins over completed when a patch carries both
        if let Some(completed) = patch.completed {
            self.set_completed(completed);
        }
        if let Some(status) = patch.status {
            self.set_status(status);
        }
        self.touch(now);
    }

    /// Sum of logged time entries in minutes.
    pub fn logged_minutes(&self) -> u64 {
        self.time_entries.iter().map(|e| u64::from(e.duration)).sum()
    }
}

/// Items living inside a todo's nested collections.
pub trait Nested {
    fn id(&self) -> &str;
    fn touch(&mut self, now: DateTime<Utc>);
}

/// Creation payload for a nested item.
pub trait NestedDraft {
    type Item: Nested;
    fn into_item(self, id: String, now: DateTime<Utc>) -> Self::Item;
}

/// Partial change-set for a nested item.
pub trait NestedPatch {
    type Item: Nested;
    fn apply_to(&self, item: &mut Self::Item, now: DateTime<Utc>);
}

macro_rules! impl_nested {
    ($($ty:ty),*) => {
        $(impl Nested for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn touch(&mut self, now: DateTime<Utc>) {
                self.updated_at = now.max(self.created_at);
            }
        })*
    };
}

impl_nested!(SubTask, Comment, Attachment, TimeEntry);

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewSubTask {
    pub text: String,
    pub completed: bool,
}

impl NewSubTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), completed: false }
    }
}

impl NestedDraft for NewSubTask {
    type Item = SubTask;
    fn into_item(self, id: String, now: DateTime<Utc>) -> SubTask {
        SubTask {
            id,
            text: self.text,
            completed: self.completed,
            completed_at: self.completed.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubTaskPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

impl NestedPatch for SubTaskPatch {
    type Item = SubTask;
    fn apply_to(&self, item: &mut SubTask, now: DateTime<Utc>) {
        if let Some(text) = &self.text {
            item.text = text.clone();
        }
        if let Some(completed) = self.completed {
            if completed && !item.completed {
                item.completed_at = Some(now);
            } else if !completed {
                item.completed_at = None;
            }
            item.completed = completed;
        }
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub text: String,
    pub author: String,
}

impl NestedDraft for NewComment {
    type Item = Comment;
    fn into_item(self, id: String, now: DateTime<Utc>) -> Comment {
        Comment { id, text: self.text, author: self.author, created_at: now, updated_at: now }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentPatch {
    pub text: Option<String>,
}

impl NestedPatch for CommentPatch {
    type Item = Comment;
    fn apply_to(&self, item: &mut Comment, _now: DateTime<Utc>) {
        if let Some(text) = &self.text {
            item.text = text.clone();
        }
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAttachment {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: u64,
}

impl NestedDraft for NewAttachment {
    type Item = Attachment;
    fn into_item(self, id: String, now: DateTime<Utc>) -> Attachment {
        Attachment {
            id,
            name: self.name,
            url: self.url,
            kind: self.kind,
            size: self.size,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentPatch {
    pub name: Option<String>,
    pub url: Option<String>,
}

impl NestedPatch for AttachmentPatch {
    type Item = Attachment;
    fn apply_to(&self, item: &mut Attachment, _now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(url) = &self.url {
            item.url = url.clone();
        }
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTimeEntry {
    pub duration: u32,
    pub description: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl NestedDraft for NewTimeEntry {
    type Item = TimeEntry;
    fn into_item(self, id: String, now: DateTime<Utc>) -> TimeEntry {
        TimeEntry {
            id,
            duration: self.duration,
            description: self.description,
            start_time: self.start_time,
            end_time: self.end_time,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeEntryPatch {
    pub duration: Option<u32>,
    pub description: Option<String>,
}

impl NestedPatch for TimeEntryPatch {
    type Item = TimeEntry;
    fn apply_to(&self, item: &mut TimeEntry, _now: DateTime<Utc>) {
        if let Some(duration) = self.duration {
            item.duration = duration;
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
    }
}

/// Authenticated account as returned by the login/register endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Bearer token plus the user it belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Aggregate counts, shaped like the server's stats endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodoStats {
    pub total_todos: usize,
    pub completed_todos: usize,
    pub pending_todos: usize,
    #[serde(default)]
    pub status_distribution: BTreeMap<String, usize>,
    #[serde(default)]
    pub priority_distribution: BTreeMap<String, usize>,
    #[serde(default)]
    pub category_distribution: BTreeMap<String, usize>,
    #[serde(default)]
    pub tag_usage: BTreeMap<String, usize>,
    #[serde(default)]
    pub estimated_total_time: u64,
    #[serde(default)]
    pub actual_total_time: u64,
    /// Percentage of todos completed, 0-100.
    #[serde(default)]
    pub completion_rate: f64,
}
