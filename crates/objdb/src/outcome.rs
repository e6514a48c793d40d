//! Result records returned by mutating operations.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::{DbError, DbResult};

/// Outcome of a `save` or `delete`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Why a mutating operation was refused without touching the store.
#[derive(Clone, Debug, PartialEq)]
pub enum Rejection {
    /// Another live object owns the name.
    DuplicateName { name: String },
    /// Another live object has the same values for the declared unique key.
    UniqueViolation { key: Vec<(String, Value)> },
    /// The id is not live.
    NotFound { id: u64 },
}

impl Rejection {
    pub fn message(&self) -> String {
        match self {
            Self::DuplicateName { name } => format!("data with name: {name} already exists"),
            Self::UniqueViolation { key } => {
                let key = key
                    .iter()
                    .map(|(attr, value)| format!("{attr}={value}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("data with {key} already exists")
            }
            Self::NotFound { id } => format!("object id={id} not found"),
        }
    }

    pub fn into_error(self) -> DbError {
        match self {
            Self::DuplicateName { name } => DbError::DuplicateName { name },
            rejection @ Self::UniqueViolation { .. } => DbError::UniqueViolation {
                message: rejection.message(),
            },
            Self::NotFound { id } => DbError::NotFound { id },
        }
    }
}

/// `{status, message, id}` record returned by `save` and `delete`.
///
/// A rejected operation leaves the store untouched; `message` explains why
/// and `id` echoes the id the caller supplied, if any.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OpResult {
    pub status: Status,
    pub message: Option<String>,
    pub id: Option<u64>,
    #[serde(skip)]
    rejection: Option<Rejection>,
}

impl OpResult {
    pub fn success(id: u64) -> Self {
        Self {
            status: Status::Success,
            message: None,
            id: Some(id),
            rejection: None,
        }
    }

    pub fn rejected(rejection: Rejection, id: Option<u64>) -> Self {
        Self {
            status: Status::Error,
            message: Some(rejection.message()),
            id,
            rejection: Some(rejection),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }

    /// Convert into a `Result` carrying the id, so callers can use `?`.
    pub fn into_result(self) -> DbResult<u64> {
        if let Some(rejection) = self.rejection {
            return Err(rejection.into_error());
        }
        self.id
            .ok_or_else(|| DbError::Serialization("success result carries no id".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_serializes_like_a_status_record() {
        let r = OpResult::success(1);
        assert!(r.is_success());
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({ "status": "success", "message": null, "id": 1 })
        );
        assert_eq!(r.into_result().unwrap(), 1);
    }

    #[test]
    fn duplicate_name_message() {
        let r = OpResult::rejected(
            Rejection::DuplicateName {
                name: "alice".into(),
            },
            None,
        );
        assert_eq!(r.status, Status::Error);
        assert_eq!(
            r.message.as_deref(),
            Some("data with name: alice already exists")
        );
        assert!(r.id.is_none());
        assert!(matches!(
            r.into_result(),
            Err(DbError::DuplicateName { name }) if name == "alice"
        ));
    }

    #[test]
    fn not_found_echoes_requested_id() {
        let r = OpResult::rejected(Rejection::NotFound { id: 42 }, Some(42));
        assert_eq!(r.message.as_deref(), Some("object id=42 not found"));
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({ "status": "error", "message": "object id=42 not found", "id": 42 })
        );
        assert!(matches!(r.into_result(), Err(DbError::NotFound { id: 42 })));
    }

    #[test]
    fn unique_violation_lists_key() {
        let rejection = Rejection::UniqueViolation {
            key: vec![
                ("email".into(), json!("a@x.io")),
                ("org".into(), json!(3)),
            ],
        };
        assert_eq!(
            rejection.message(),
            r#"data with email="a@x.io", org=3 already exists"#
        );
        let err = rejection.into_error();
        assert_eq!(err.to_string(), r#"data with email="a@x.io", org=3 already exists"#);
    }

    #[test]
    fn status_display() {
        assert_eq!(Status::Success.to_string(), "success");
        assert_eq!(Status::Error.to_string(), "error");
    }
}
