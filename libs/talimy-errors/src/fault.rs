//! The [`Fault`] tagged union and its decode step from loosely-shaped JSON.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One offending input field of a structured validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Dotted path, e.g. `address.city` or `items.0.id`.
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Storage failure. Only ever logged; clients see a masked message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseFault {
    pub code: Option<String>,
    pub constraint: Option<String>,
    pub detail: Option<String>,
}

/// Response payload attached to an HTTP-status fault.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpPayload {
    /// Already in `{code, message, details?}` shape; rendered unchanged.
    Structured {
        code: String,
        message: String,
        details: Option<Value>,
    },
    /// A list of messages, rendered as a validation failure.
    Messages(Vec<String>),
    /// A single message; the code is derived from the status.
    Text(String),
    /// Anything else; rendered with the status default code and a generic message.
    Unrecognized(Value),
}

impl HttpPayload {
    /// Decode a payload the way HTTP exceptions carry it.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let mut object = match value {
            Value::String(text) => return Self::Text(text),
            Value::Object(object) => object,
            other => return Self::Unrecognized(other),
        };

        if let (Some(Value::String(_)), Some(Value::String(_))) =
            (object.get("code"), object.get("message"))
        {
            let code = take_string(&mut object, "code").unwrap_or_default();
            let message = take_string(&mut object, "message").unwrap_or_default();
            return Self::Structured {
                code,
                message,
                details: object.remove("details"),
            };
        }

        match object.remove("message") {
            Some(Value::Array(items)) => Self::Messages(items.into_iter().map(value_text).collect()),
            Some(Value::String(message)) => Self::Text(message),
            Some(other) => {
                object.insert("message".to_owned(), other);
                Self::Unrecognized(Value::Object(object))
            }
            None => Self::Unrecognized(Value::Object(object)),
        }
    }
}

/// Any failure that can escape the request pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Fault {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    #[error("database operation failed")]
    Database(DatabaseFault),

    #[error("HTTP {status}")]
    Http {
        status: StatusCode,
        payload: HttpPayload,
    },

    #[error("{}", .message.as_deref().unwrap_or("unhandled exception"))]
    Unhandled {
        message: Option<String>,
        trace: Option<String>,
    },
}

impl Fault {
    /// HTTP fault with a plain message; the code is derived from `status`.
    #[must_use]
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            payload: HttpPayload::Text(message.into()),
        }
    }

    #[must_use]
    pub fn unhandled(message: impl Into<String>) -> Self {
        Self::Unhandled {
            message: Some(message.into()),
            trace: None,
        }
    }

    /// Decode an arbitrary error object.
    ///
    /// Precedence: schema-validation shape (`issues` list), database-like shape
    /// (5-character alphanumeric `code`, or a `constraint` or `detail` field),
    /// HTTP shape (`status` plus `response`), then the catch-all.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut object) = value else {
            return match value {
                Value::String(message) => Self::unhandled(message),
                _ => Self::Unhandled {
                    message: None,
                    trace: None,
                },
            };
        };

        if let Some(Value::Array(issues)) = object.get("issues") {
            return Self::Validation(issues.iter().map(issue_violation).collect());
        }

        let database_like = object
            .get("code")
            .and_then(Value::as_str)
            .is_some_and(is_sql_state)
            || object.contains_key("constraint")
            || object.contains_key("detail");
        if database_like {
            return Self::Database(DatabaseFault {
                code: object.get("code").map(|v| value_text(v.clone())),
                constraint: take_string(&mut object, "constraint"),
                detail: take_string(&mut object, "detail"),
            });
        }

        let status = object
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
            .and_then(|s| StatusCode::from_u16(s).ok());
        if let (Some(status), Some(response)) = (status, object.remove("response")) {
            return Self::Http {
                status,
                payload: HttpPayload::from_value(response),
            };
        }

        Self::Unhandled {
            message: take_string(&mut object, "message"),
            trace: take_string(&mut object, "stack"),
        }
    }
}

fn is_sql_state(code: &str) -> bool {
    code.len() == 5 && code.chars().all(|c| c.is_ascii_alphanumeric())
}

fn issue_violation(issue: &Value) -> FieldViolation {
    let field = issue
        .get("path")
        .and_then(Value::as_array)
        .map(|segments| {
            segments
                .iter()
                .map(|segment| value_text(segment.clone()))
                .collect::<Vec<_>>()
                .join(".")
        })
        .unwrap_or_default();
    let message = issue
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Invalid value")
        .to_owned();
    FieldViolation { field, message }
}

fn take_string(object: &mut serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match object.remove(key)? {
        Value::String(text) => Some(text),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
