//! REST client for the todo backend.
//!
//! Records travel as raw JSON; turning them into [`crate::models::Todo`] is
//! the job of [`super::normalize`].

use std::time::Duration;

use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// Child collections with their own creation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestedResource {
    SubTasks,
    Comments,
    TimeEntries,
}

impl NestedResource {
    pub fn path(&self) -> &'static str {
        match self {
            NestedResource::SubTasks => "subtasks",
            NestedResource::Comments => "comments",
            NestedResource::TimeEntries => "time-entries",
        }
    }
}

/// Anything that can store todos for the signed-in user.
pub trait TodoBackend {
    fn list(&self) -> ApiResult<Vec<Value>>;
    fn create(&self, payload: &Value) -> ApiResult<Value>;
    fn update(&self, id: &str, patch: &Value) -> ApiResult<Value>;
    fn delete(&self, id: &str) -> ApiResult<()>;
    /// Creates a child item and returns the updated parent record.
    fn add_nested(&self, todo_id: &str, resource: NestedResource, payload: &Value) -> ApiResult<Value>;
    fn stats(&self) -> ApiResult<Value>;
}

/// Bounded exponential backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries, including the first one.
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { attempts: 3, base_delay: Duration::from_millis(200) }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        RetryPolicy { attempts: 1, base_delay: Duration::ZERO }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry.saturating_sub(1))
    }

    /// Runs `op`, retrying transient errors until the attempts run out.
    pub fn run<T>(&self, mut op: impl FnMut() -> ApiResult<T>) -> ApiResult<T> {
        let mut attempt = 1;
        loop {
            match op() {
                Err(e) if e.is_transient() && attempt < self.attempts => {
                    let delay = self.delay(attempt);
                    tracing::warn!(attempt, ?delay, error = %e, "request failed, retrying");
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// Reads a JSON body; empty bodies come back as `Value::Null`.
pub(crate) fn read_body(response: ureq::Response) -> ApiResult<Value> {
    let text = response
        .into_string()
        .map_err(|e| ApiError::Network(format!("Failed to read response: {}", e)))?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Maps a ureq outcome onto [`ApiError`], pulling `message` out of JSON
/// error bodies when the server sends one.
pub(crate) fn into_result(outcome: Result<ureq::Response, ureq::Error>) -> ApiResult<Value> {
    match outcome {
        Ok(response) => read_body(response),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            Err(ApiError::Status { status, message })
        }
        Err(ureq::Error::Transport(t)) => Err(ApiError::Network(t.to_string())),
    }
}

/// [`TodoBackend`] over HTTP with bearer-token auth.
pub struct HttpBackend {
    base_url: String,
    token: String,
    agent: ureq::Agent,
    retry: RetryPolicy,
}

impl HttpBackend {
    pub fn new(base_url: &str, token: impl Into<String>, retry: RetryPolicy, timeout: Duration) -> Self {
        HttpBackend {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            retry,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/todos{}", self.base_url, path)
    }

    fn send(&self, method: &str, path: &str, body: Option<&Value>) -> ApiResult<Value> {
        let url = self.url(path);
        let attempt = || {
            tracing::debug!(method, url = %url, "sending request");
            let request = self
                .agent
                .request(method, &url)
                .set("Authorization", &format!("Bearer {}", self.token));
            let outcome = match body {
                Some(body) => request.send_json(body),
                None => request.call(),
            };
            into_result(outcome)
        };
        // creating twice is worse than failing once
        if method == "POST" {
            attempt()
        } else {
            self.retry.run(attempt)
        }
    }
}

impl TodoBackend for HttpBackend {
    fn list(&self) -> ApiResult<Vec<Value>> {
        match self.send("GET", "", None)? {
            Value::Array(records) => Ok(records),
            other => Err(ApiError::Decode(format!("expected a list of todos, got {}", other))),
        }
    }

    fn create(&self, payload: &Value) -> ApiResult<Value> {
        self.send("POST", "", Some(payload))
    }

    fn update(&self, id: &str, patch: &Value) -> ApiResult<Value> {
        self.send("PATCH", &format!("/{}", id), Some(patch))
    }

    fn delete(&self, id: &str) -> ApiResult<()> {
        self.send("DELETE", &format!("/{}", id), None).map(|_| ())
    }

    fn add_nested(&self, todo_id: &str, resource: NestedResource, payload: &Value) -> ApiResult<Value> {
        self.send("POST", &format!("/{}/{}", todo_id, resource.path()), Some(payload))
    }

    fn stats(&self) -> ApiResult<Value> {
        self.send("GET", "/stats", None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_retry_stops_on_permanent_error() {
        let calls = Cell::new(0);
        let policy = RetryPolicy { attempts: 5, base_delay: Duration::ZERO };
        let result: ApiResult<()> = policy.run(|| {
            calls.set(calls.get() + 1);
            Err(ApiError::Status { status: 404, message: "gone".into() })
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_retry_gives_up_after_attempts() {
        let calls = Cell::new(0);
        let policy = RetryPolicy { attempts: 3, base_delay: Duration::ZERO };
        let result: ApiResult<()> = policy.run(|| {
            calls.set(calls.get() + 1);
            Err(ApiError::Network("refused".into()))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_recovers() {
        let calls = Cell::new(0);
        let policy = RetryPolicy { attempts: 3, base_delay: Duration::ZERO };
        let result = policy.run(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 2 {
                Err(ApiError::Status { status: 503, message: "busy".into() })
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy { attempts: 4, base_delay: Duration::from_millis(100) };
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(3), Duration::from_millis(400));
    }
}
