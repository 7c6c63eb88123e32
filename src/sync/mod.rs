//! Remote sync: keeps the local [`Store`] and the REST backend in step.
//!
//! Todo-level edits are optimistic. The change is applied locally first and
//! recorded in a [`PendingLedger`]; the server's answer then confirms it or
//! rolls it back, in the order the requests were issued. Without a backend
//! every operation is purely local.

pub mod backend;
pub mod normalize;
pub mod pending;

use serde::Serialize;

use crate::error::{ApiError, ApiResult, AppError, AppResult};
use crate::models::{
    NewAttachment, NewComment, NewSubTask, NewTimeEntry, NewTodo, Status, Todo, TodoPatch, TodoStats,
};
use crate::projection;
use crate::storage::Storage;
use crate::store::{Action, Store};

pub use backend::{HttpBackend, NestedResource, RetryPolicy, TodoBackend};
pub use normalize::{map_status, normalize, status_to_wire};
pub use pending::{Outcome, PendingLedger, Ticket};

const LOCAL_ID_PREFIX: &str = "local-";

/// Owner of the store plus its remote and on-disk mirrors.
pub struct TodoSync {
    store: Store,
    backend: Option<Box<dyn TodoBackend>>,
    storage: Option<Storage>,
    pending: PendingLedger,
}

impl TodoSync {
    pub fn new(store: Store, backend: Option<Box<dyn TodoBackend>>, storage: Option<Storage>) -> Self {
        TodoSync { store, backend, storage, pending: PendingLedger::new() }
    }

    /// A local-only instance seeded from the on-disk cache.
    pub fn offline(store: Store, storage: Storage) -> Self {
        let mut sync = Self::new(store, None, Some(storage));
        sync.load_cache();
        sync
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn is_online(&self) -> bool {
        self.backend.is_some()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.is_pending(id)
    }

    pub fn in_flight(&self) -> usize {
        self.pending.in_flight()
    }

    /// Seeds the store from the on-disk cache, if any.
    pub fn load_cache(&mut self) {
        if let Some(storage) = &self.storage {
            let todos = storage.load_todos();
            tracing::debug!(count = todos.len(), "loaded cached todos");
            self.store.dispatch(Action::SetAll(todos));
        }
    }

    fn persist(&self) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save_todos(self.store.todos()) {
                tracing::warn!(error = %e, "failed to mirror todos to disk");
            }
        }
    }

    /// Dispatches and mirrors the todo list to disk when it changed.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let changed = self.store.dispatch(action);
        if changed {
            self.persist();
        }
        changed
    }

    fn require(&self, id: &str) -> AppResult<&Todo> {
        self.store.get(id).ok_or_else(|| AppError::NotFound(format!("todo {}", id)))
    }

    fn normalize(&self, record: serde_json::Value) -> ApiResult<Todo> {
        normalize::normalize(record, self.store.env().now())
    }

    /// Installs a server record for `id`, replaying any patches still in
    /// flight for it.
    fn reconcile(&mut self, id: &str, record: Todo) {
        let now = self.store.env().now();
        let todo = self.pending.rebase(record.clone(), now).unwrap_or(record);
        self.dispatch(Action::Replace { id: id.to_string(), todo });
    }

    /// Replaces the local list with the server's. Returns the number of todos.
    pub fn refresh(&mut self) -> AppResult<usize> {
        let Some(backend) = &self.backend else {
            return Ok(self.store.todos().len());
        };
        let records = backend.list()?;
        let todos = normalize::normalize_all(records, self.store.env().now());
        let count = todos.len();
        self.pending = PendingLedger::new();
        self.dispatch(Action::SetAll(todos));
        tracing::info!(count, "pulled todos from server");
        Ok(count)
    }

    /// Creates a todo and returns its id (the server's id when online).
    pub fn create(&mut self, draft: NewTodo) -> AppResult<String> {
        if draft.text.trim().is_empty() {
            return Err(AppError::Validation("todo text cannot be empty".into()));
        }
        let payload = normalize::draft_payload(&draft);
        let local_id = self.store.add(draft);
        if self.backend.is_none() {
            self.persist();
            return Ok(local_id);
        }
        let local_id = self.adopt_local_id(local_id);
        self.persist();
        let result = match &self.backend {
            Some(backend) => backend.create(&payload),
            None => Err(ApiError::NotAuthenticated),
        };
        self.finish_create(&local_id, result)
    }

    /// Marks a freshly added todo as provisional until the server assigns an id.
    fn adopt_local_id(&mut self, id: String) -> String {
        let provisional = format!("{}{}", LOCAL_ID_PREFIX, id);
        if let Some(todo) = self.store.get(&id) {
            let mut todo = todo.clone();
            todo.id = provisional.clone();
            self.store.dispatch(Action::Replace { id, todo });
        }
        provisional
    }

    /// Settles a create: swaps the provisional todo for the server's record,
    /// or removes it if the request failed.
    pub fn finish_create(&mut self, local_id: &str, result: ApiResult<serde_json::Value>) -> AppResult<String> {
        match result.and_then(|record| self.normalize(record)) {
            Ok(todo) => {
                let id = todo.id.clone();
                self.dispatch(Action::Replace { id: local_id.to_string(), todo });
                tracing::info!(id = %id, "todo created");
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "create failed, discarding local copy");
                self.dispatch(Action::Delete(local_id.to_string()));
                Err(e.into())
            }
        }
    }

    /// Applies `patch` locally and opens a ticket for the matching request.
    /// Returns `None` if the todo does not exist.
    pub fn begin_update(&mut self, id: &str, patch: TodoPatch) -> Option<Ticket> {
        let before = self.store.get(id)?.clone();
        let ticket = self.pending.begin(&before, patch.clone());
        self.dispatch(Action::Update { id: id.to_string(), patch });
        Some(ticket)
    }

    /// Settles one update. Confirmations and failures are folded in issue
    /// order; a failure also surfaces as an error.
    pub fn finish_update(&mut self, ticket: &Ticket, result: ApiResult<serde_json::Value>) -> AppResult<()> {
        let result = result.and_then(|record| self.normalize(record));
        let (outcome, error) = match result {
            Ok(todo) => (Outcome::Confirmed(todo), None),
            Err(e) => {
                tracing::warn!(id = %ticket.todo_id(), error = %e, "update rejected, rolling back");
                (Outcome::Failed, Some(e))
            }
        };
        let now = self.store.env().now();
        if let Some(todo) = self.pending.resolve(ticket, outcome, now) {
            self.dispatch(Action::Replace { id: ticket.todo_id().to_string(), todo });
        }
        match error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Merges `patch` into a todo, optimistically when online.
    pub fn update(&mut self, id: &str, patch: TodoPatch) -> AppResult<()> {
        if patch.text.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::Validation("todo text cannot be empty".into()));
        }
        self.require(id)?;
        if self.backend.is_none() {
            self.dispatch(Action::Update { id: id.to_string(), patch });
            return Ok(());
        }
        let payload = normalize::patch_payload(&patch);
        let Some(ticket) = self.begin_update(id, patch) else {
            return Err(AppError::NotFound(format!("todo {}", id)));
        };
        let result = match &self.backend {
            Some(backend) => backend.update(id, &payload),
            None => Err(ApiError::NotAuthenticated),
        };
        self.finish_update(&ticket, result)
    }

    pub fn toggle_completed(&mut self, id: &str) -> AppResult<()> {
        let completed = !self.require(id)?.completed;
        // the server derives nothing from `completed`, so send both
        let status = if completed { Status::Done } else { Status::Todo };
        self.update(id, TodoPatch { completed: Some(completed), status: Some(status), ..Default::default() })
    }

    pub fn toggle_star(&mut self, id: &str) -> AppResult<()> {
        let starred = !self.require(id)?.is_starred;
        self.update(id, TodoPatch { is_starred: Some(starred), ..Default::default() })
    }

    pub fn toggle_archive(&mut self, id: &str) -> AppResult<()> {
        let archived = !self.require(id)?.is_archived;
        self.update(id, TodoPatch { is_archived: Some(archived), ..Default::default() })
    }

    /// Kanban column move: commits locally, then sends the patch without
    /// waiting to reconcile. A rejected patch is logged and the local move
    /// stands until the next pull.
    pub fn move_to_status(&mut self, id: &str, status: Status) -> AppResult<()> {
        self.require(id)?;
        let patch = TodoPatch::status(status);
        let payload = normalize::patch_payload(&patch);
        self.dispatch(Action::Update { id: id.to_string(), patch });
        if let Some(backend) = &self.backend {
            if let Err(e) = backend.update(id, &payload) {
                tracing::warn!(id, error = %e, "column move not saved on server");
            }
        }
        Ok(())
    }

    /// Moves a todo within the list. Order is local only; the server keeps
    /// none. Returns false for out-of-range indices.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.store.todos().len();
        if from >= len || to >= len {
            return false;
        }
        self.dispatch(Action::Reorder { from, to });
        true
    }

    /// Deletes on the server first; the local copy goes only once that
    /// succeeds.
    pub fn delete(&mut self, id: &str) -> AppResult<()> {
        self.require(id)?;
        if let Some(backend) = &self.backend {
            if !id.starts_with(LOCAL_ID_PREFIX) {
                backend.delete(id)?;
            }
        }
        self.pending.forget(id);
        self.dispatch(Action::Delete(id.to_string()));
        Ok(())
    }

    /// Creates a child item through its own endpoint when online.
    fn add_nested<T: Serialize>(
        &mut self,
        todo_id: &str,
        resource: NestedResource,
        item: &T,
        local: Action,
    ) -> AppResult<()> {
        self.require(todo_id)?;
        let Some(backend) = &self.backend else {
            self.dispatch(local);
            return Ok(());
        };
        let payload = serde_json::to_value(item).map_err(|e| ApiError::Decode(e.to_string()))?;
        let record = backend.add_nested(todo_id, resource, &payload)?;
        let todo = self.normalize(record)?;
        self.reconcile(todo_id, todo);
        Ok(())
    }

    pub fn add_subtask(&mut self, todo_id: &str, subtask: NewSubTask) -> AppResult<()> {
        if subtask.text.trim().is_empty() {
            return Err(AppError::Validation("subtask text cannot be empty".into()));
        }
        let local = Action::AddSubTask { todo_id: todo_id.to_string(), subtask: subtask.clone() };
        self.add_nested(todo_id, NestedResource::SubTasks, &subtask, local)
    }

    pub fn add_comment(&mut self, todo_id: &str, comment: NewComment) -> AppResult<()> {
        if comment.text.trim().is_empty() {
            return Err(AppError::Validation("comment text cannot be empty".into()));
        }
        let local = Action::AddComment { todo_id: todo_id.to_string(), comment: comment.clone() };
        self.add_nested(todo_id, NestedResource::Comments, &comment, local)
    }

    pub fn log_time(&mut self, todo_id: &str, entry: NewTimeEntry) -> AppResult<()> {
        if entry.duration == 0 {
            return Err(AppError::Validation("time entry must be at least one minute".into()));
        }
        let local = Action::AddTimeEntry { todo_id: todo_id.to_string(), entry: entry.clone() };
        self.add_nested(todo_id, NestedResource::TimeEntries, &entry, local)
    }

    pub fn add_attachment(&mut self, todo_id: &str, attachment: NewAttachment) -> AppResult<()> {
        if attachment.name.trim().is_empty() || attachment.url.trim().is_empty() {
            return Err(AppError::Validation("attachment needs a name and a url".into()));
        }
        self.edit_nested(todo_id, Action::AddAttachment { todo_id: todo_id.to_string(), attachment })
    }

    /// Applies a nested-collection action locally and, when online, sends the
    /// parent's collections as a patch. A rejected patch restores the parent.
    pub fn edit_nested(&mut self, todo_id: &str, action: Action) -> AppResult<()> {
        let before = self.require(todo_id)?.clone();
        self.dispatch(action);
        let Some(backend) = &self.backend else {
            return Ok(());
        };
        let Some(after) = self.store.get(todo_id) else {
            return Ok(());
        };
        let payload = serde_json::json!({
            "subTasks": after.sub_tasks,
            "comments": after.comments,
            "attachments": after.attachments,
            "timeEntries": after.time_entries,
        });
        match backend.update(todo_id, &payload).and_then(|record| self.normalize(record)) {
            Ok(todo) => {
                self.reconcile(todo_id, todo);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(id = todo_id, error = %e, "nested edit rejected, restoring");
                self.dispatch(Action::Replace { id: todo_id.to_string(), todo: before });
                Err(e.into())
            }
        }
    }

    /// Server-side stats when online, otherwise computed from the local list.
    pub fn stats(&self) -> AppResult<TodoStats> {
        match &self.backend {
            Some(backend) => Ok(normalize::parse_stats(backend.stats()?)?),
            None => Ok(projection::stats(self.store.todos())),
        }
    }
}
