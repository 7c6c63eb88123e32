//! Login, registration and the bearer token that comes out of them.

use std::time::Duration;

use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::models::Session;
use crate::sync::backend::into_result;

/// A usable token is a JWT: three non-empty dot-separated segments.
pub fn validate_token(token: &str) -> ApiResult<()> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() == 3 && parts.iter().all(|p| !p.is_empty()) {
        Ok(())
    } else {
        Err(ApiError::InvalidToken)
    }
}

/// Parses a `{token, user}` body and checks the token shape.
pub fn parse_session(body: Value) -> ApiResult<Session> {
    let session: Session = serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    validate_token(&session.token)?;
    Ok(session)
}

pub struct AuthClient {
    base_url: String,
    agent: ureq::Agent,
}

impl AuthClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        AuthClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    fn post(&self, path: &str, body: Value) -> ApiResult<Session> {
        let url = format!("{}/api/users/{}", self.base_url, path);
        tracing::debug!(url = %url, "authenticating");
        let response = into_result(self.agent.post(&url).send_json(body))?;
        parse_session(response)
    }

    pub fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        self.post("login", json!({ "email": email, "password": password }))
    }

    pub fn register(&self, name: &str, email: &str, password: &str) -> ApiResult<Session> {
        self.post("register", json!({ "name": name, "email": email, "password": password }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_token_shape() {
        assert!(validate_token("aaa.bbb.ccc").is_ok());
        assert!(matches!(validate_token("not-a-jwt"), Err(ApiError::InvalidToken)));
        assert!(validate_token("a..c").is_err());
    }

    #[test]
    fn test_parse_session_accepts_mongo_ids() {
        let session = parse_session(json!({
            "token": "h.p.s",
            "user": { "_id": "u1", "name": "Ada", "email": "ada@example.com" }
        }))
        .unwrap();
        assert_eq!(session.user.id, "u1");
    }

    #[test]
    fn test_parse_session_rejects_bad_token() {
        let body = json!({ "token": "opaque", "user": { "id": "u1", "email": "a@b.c" } });
        assert!(matches!(parse_session(body), Err(ApiError::InvalidToken)));
    }
}
