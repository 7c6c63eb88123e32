//! Ledger of optimistic updates waiting on the server.
//!
//! Each todo with in-flight patches keeps the last record the server
//! confirmed (`base`) and a queue of patches in issue order. Responses may
//! arrive in any order; they are folded into `base` strictly front to back,
//! and the locally visible record is always `base` with every still-pending
//! patch replayed on top. A slow response to an old request therefore never
//! overwrites a newer local edit.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

use crate::models::{Todo, TodoPatch};

/// Correlation handle for one in-flight update.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticket {
    todo_id: String,
    seq: u64,
}

impl Ticket {
    pub fn todo_id(&self) -> &str {
        &self.todo_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The server accepted the patch and returned this record.
    Confirmed(Todo),
    Failed,
}

#[derive(Debug)]
struct PendingOp {
    seq: u64,
    patch: TodoPatch,
    outcome: Option<Outcome>,
}

#[derive(Debug)]
struct Queue {
    base: Todo,
    ops: VecDeque<PendingOp>,
}

impl Queue {
    fn view(&self, now: DateTime<Utc>) -> Todo {
        let mut view = self.base.clone();
        for op in &self.ops {
            if op.outcome != Some(Outcome::Failed) {
                view.apply(&op.patch, now);
            }
        }
        view
    }
}

#[derive(Debug, Default)]
pub struct PendingLedger {
    next_seq: u64,
    queues: HashMap<String, Queue>,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a patch about to be sent for `before.id`. `before` is the
    /// record as it looked prior to the local apply.
    pub fn begin(&mut self, before: &Todo, patch: TodoPatch) -> Ticket {
        self.next_seq += 1;
        let seq = self.next_seq;
        let queue = self
            .queues
            .entry(before.id.clone())
            .or_insert_with(|| Queue { base: before.clone(), ops: VecDeque::new() });
        queue.ops.push_back(PendingOp { seq, patch, outcome: None });
        Ticket { todo_id: before.id.clone(), seq }
    }

    pub fn is_pending(&self, todo_id: &str) -> bool {
        self.queues.contains_key(todo_id)
    }

    /// Number of patches not yet folded into their base.
    pub fn in_flight(&self) -> usize {
        self.queues.values().map(|q| q.ops.len()).sum()
    }

    /// Records the response for `ticket` and returns the record the store
    /// should now show, or `None` for an unknown or already settled ticket.
    pub fn resolve(&mut self, ticket: &Ticket, outcome: Outcome, now: DateTime<Utc>) -> Option<Todo> {
        let queue = self.queues.get_mut(&ticket.todo_id)?;
        let op = queue.ops.iter_mut().find(|op| op.seq == ticket.seq)?;
        op.outcome = Some(outcome);

        while let Some(op) = queue.ops.pop_front() {
            match op.outcome {
                Some(Outcome::Confirmed(record)) => queue.base = record,
                Some(Outcome::Failed) => {
                    tracing::debug!(id = %ticket.todo_id, seq = op.seq, "dropping failed patch");
                }
                None => {
                    queue.ops.push_front(op);
                    break;
                }
            }
        }

        if queue.ops.is_empty() {
            return self.queues.remove(&ticket.todo_id).map(|q| q.base);
        }
        Some(queue.view(now))
    }

    /// Installs a record the server returned outside the ledger (for example
    /// from a nested-resource call) as the new base. Returns the record to
    /// show if patches are still pending, `None` otherwise.
    pub fn rebase(&mut self, record: Todo, now: DateTime<Utc>) -> Option<Todo> {
        let queue = self.queues.get_mut(&record.id)?;
        queue.base = record;
        Some(queue.view(now))
    }

    /// Drops everything pending for a deleted todo.
    pub fn forget(&mut self, todo_id: &str) {
        self.queues.remove(todo_id);
    }
}
