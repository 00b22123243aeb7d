//! Transport-facing request/response shapes and structural validation.
//!
//! # Responsibility
//! - Decode JSON bodies and query strings into typed requests.
//! - Reject structurally invalid requests before any storage call.
//!
//! # Invariants
//! - Missing body fields decode to their zero value and are then validated,
//!   so `{}` and `{"subject":""}` fail the same way.
//! - Pagination parameters never fail; unparsable values fall back.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use todo_core::{TodoId, TodoItem};

/// Page length used when `size` is absent or unparsable.
pub const DEFAULT_READ_SIZE: i64 = 5;

/// Structural request problems detected at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request body is empty")]
    EmptyBody,
    #[error("request body is not valid JSON for this operation: {0}")]
    Malformed(String),
    #[error("subject must not be empty")]
    EmptySubject,
    #[error("id must not be zero")]
    MissingId,
    #[error("ids must not be empty")]
    EmptyIds,
}

/// Decodes a JSON body regardless of the declared content type.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::EmptyBody);
    }
    serde_json::from_slice(body).map_err(|err| ValidationError::Malformed(err.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub description: String,
}

impl CreateTodoRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.subject.is_empty() {
            return Err(ValidationError::EmptySubject);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTodoResponse {
    pub todo: TodoItem,
}

/// Cursor parameters of `GET /todos`, parsed permissively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTodoParams {
    pub prev_id: TodoId,
    pub size: i64,
}

impl Default for ReadTodoParams {
    fn default() -> Self {
        Self {
            prev_id: 0,
            size: DEFAULT_READ_SIZE,
        }
    }
}

impl ReadTodoParams {
    /// Builds parameters from raw query pairs; the first occurrence of a key
    /// wins and anything unparsable keeps its default.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut prev_id = None;
        let mut size = None;
        for (key, value) in pairs {
            match key {
                "prev_id" if prev_id.is_none() => prev_id = Some(value),
                "size" if size.is_none() => size = Some(value),
                _ => {}
            }
        }

        let defaults = Self::default();
        Self {
            prev_id: prev_id
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.prev_id),
            size: size
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadTodoResponse {
    pub todos: Vec<TodoItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default)]
    pub id: TodoId,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub description: String,
}

impl UpdateTodoRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.subject.is_empty() {
            return Err(ValidationError::EmptySubject);
        }
        if self.id == 0 {
            return Err(ValidationError::MissingId);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTodoResponse {
    pub todo: TodoItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteTodoRequest {
    #[serde(default)]
    pub ids: Vec<TodoId>,
}

impl DeleteTodoRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ids.is_empty() {
            return Err(ValidationError::EmptyIds);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthzResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_subject() {
        let missing: CreateTodoRequest = decode_body(br#"{"description":"x"}"#).unwrap();
        assert_eq!(missing.validate(), Err(ValidationError::EmptySubject));

        let ok: CreateTodoRequest = decode_body(br#"{"subject":"buy milk"}"#).unwrap();
        assert_eq!(ok.description, "");
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn update_requires_subject_and_non_zero_id() {
        let no_id = UpdateTodoRequest {
            subject: "x".to_string(),
            ..Default::default()
        };
        assert_eq!(no_id.validate(), Err(ValidationError::MissingId));

        let no_subject = UpdateTodoRequest {
            id: 3,
            ..Default::default()
        };
        assert_eq!(no_subject.validate(), Err(ValidationError::EmptySubject));
    }

    #[test]
    fn delete_requires_ids() {
        let empty: DeleteTodoRequest = decode_body(br#"{"ids":[]}"#).unwrap();
        assert_eq!(empty.validate(), Err(ValidationError::EmptyIds));
        let some: DeleteTodoRequest = decode_body(br#"{"ids":[1,2]}"#).unwrap();
        assert!(some.validate().is_ok());
    }

    #[test]
    fn decode_body_rejects_empty_and_malformed_payloads() {
        assert_eq!(
            decode_body::<CreateTodoRequest>(b"  "),
            Err(ValidationError::EmptyBody)
        );
        assert!(matches!(
            decode_body::<CreateTodoRequest>(b"{\"subject\":"),
            Err(ValidationError::Malformed(_))
        ));
        assert!(matches!(
            decode_body::<DeleteTodoRequest>(br#"{"ids":"1"}"#),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn read_params_default_and_parse_permissively() {
        assert_eq!(ReadTodoParams::from_pairs([]), ReadTodoParams::default());

        let parsed = ReadTodoParams::from_pairs([("prev_id", "12"), ("size", "3")]);
        assert_eq!(parsed, ReadTodoParams { prev_id: 12, size: 3 });

        let garbage = ReadTodoParams::from_pairs([("prev_id", "abc"), ("size", "")]);
        assert_eq!(garbage, ReadTodoParams { prev_id: 0, size: DEFAULT_READ_SIZE });

        let repeated = ReadTodoParams::from_pairs([("size", "2"), ("size", "9")]);
        assert_eq!(repeated.size, 2);
    }
}
