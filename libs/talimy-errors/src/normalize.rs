//! Fault to envelope mapping.

use http::StatusCode;

use crate::envelope::{ErrorBody, ErrorDetail, ErrorDetails};
use crate::fault::{DatabaseFault, Fault, HttpPayload};

pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
pub const UNHANDLED_EXCEPTION: &str = "UNHANDLED_EXCEPTION";

const VALIDATION_MESSAGE: &str = "Validation failed";
const DATABASE_MESSAGE: &str = "Database operation failed";
const INTERNAL_MESSAGE: &str = "Internal server error";
const REQUEST_FAILED_MESSAGE: &str = "Request failed";

/// A fault ready to be written to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub status: StatusCode,
    pub body: ErrorBody,
    /// Server-side diagnostics (database text, stack trace). Never rendered.
    pub internal: Option<String>,
}

/// Map any fault to its status and client-visible error body.
#[must_use]
pub fn normalize(fault: &Fault) -> Normalized {
    match fault {
        Fault::Validation(violations) => Normalized {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody::new(VALIDATION_ERROR, VALIDATION_MESSAGE).with_details(
                violations
                    .iter()
                    .map(|v| ErrorDetail::field(v.field.clone(), v.message.clone()))
                    .collect(),
            ),
            internal: None,
        },
        Fault::Database(db) => Normalized {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody::new(DATABASE_ERROR, DATABASE_MESSAGE),
            internal: Some(describe_database(db)),
        },
        Fault::Http { status, payload } => Normalized {
            status: *status,
            body: http_body(*status, payload),
            internal: None,
        },
        Fault::Unhandled { message, trace } => Normalized {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody::new(
                UNHANDLED_EXCEPTION,
                message.as_deref().unwrap_or(INTERNAL_MESSAGE),
            ),
            internal: trace.clone(),
        },
    }
}

fn http_body(status: StatusCode, payload: &HttpPayload) -> ErrorBody {
    match payload {
        HttpPayload::Structured {
            code,
            message,
            details,
        } => ErrorBody {
            code: code.clone(),
            message: message.clone(),
            details: details.clone().map(ErrorDetails::Opaque),
        },
        HttpPayload::Messages(messages) => ErrorBody::new(VALIDATION_ERROR, VALIDATION_MESSAGE)
            .with_details(messages.iter().map(ErrorDetail::message).collect()),
        HttpPayload::Text(message) => ErrorBody::new(default_code_for_status(status), message),
        HttpPayload::Unrecognized(_) => {
            ErrorBody::new(default_code_for_status(status), REQUEST_FAILED_MESSAGE)
        }
    }
}

/// Machine-readable code used when an HTTP fault brings only a message.
#[must_use]
pub fn default_code_for_status(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::UNAUTHORIZED => "UNAUTHENTICATED",
        StatusCode::FORBIDDEN => "FORBIDDEN",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::REQUEST_TIMEOUT => "REQUEST_TIMEOUT",
        StatusCode::CONFLICT => "CONFLICT",
        StatusCode::SERVICE_UNAVAILABLE => "SERVICE_UNAVAILABLE",
        s if s.is_server_error() => "INTERNAL_SERVER_ERROR",
        _ => "HTTP_EXCEPTION",
    }
}

fn describe_database(db: &DatabaseFault) -> String {
    format!(
        "code={} constraint={} detail={}",
        db.code.as_deref().unwrap_or("-"),
        db.constraint.as_deref().unwrap_or("-"),
        db.detail.as_deref().unwrap_or("-"),
    )
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::envelope::ErrorEnvelope;
    use crate::fault::FieldViolation;
    use serde_json::json;

    fn rendered(fault: &Fault) -> (StatusCode, serde_json::Value) {
        let normalized = normalize(fault);
        (
            normalized.status,
            serde_json::to_value(ErrorEnvelope::from(normalized.body)).unwrap(),
        )
    }

    #[test]
    fn single_field_validation_failure() {
        let (status, body) = rendered(&Fault::Validation(vec![FieldViolation::new(
            "id",
            "Invalid uuid",
        )]));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": {
                    "code": "VALIDATION_ERROR",
                    "message": "Validation failed",
                    "details": [{"field": "id", "message": "Invalid uuid"}]
                }
            })
        );
    }

    #[test]
    fn database_error_text_is_masked() {
        let fault = Fault::from_value(json!({
            "code": "23505",
            "detail": "duplicate key value violates unique constraint"
        }));
        let normalized = normalize(&fault);
        let body = serde_json::to_value(ErrorEnvelope::from(normalized.body)).unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": {"code": "DATABASE_ERROR", "message": "Database operation failed"}
            })
        );
        assert!(!body.to_string().contains("duplicate"));
        assert!(normalized.internal.unwrap().contains("duplicate key"));
    }

    #[test]
    fn structured_http_payload_passes_through_with_own_status() {
        let (status, body) = rendered(&Fault::Http {
            status: StatusCode::CONFLICT,
            payload: HttpPayload::Structured {
                code: "SLUG_TAKEN".to_owned(),
                message: "Slug already in use".to_owned(),
                details: Some(json!([{"field": "slug", "message": "taken"}])),
            },
        });
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            body["error"],
            json!({
                "code": "SLUG_TAKEN",
                "message": "Slug already in use",
                "details": [{"field": "slug", "message": "taken"}]
            })
        );
    }

    #[test]
    fn message_list_becomes_validation_details_without_field() {
        let (status, body) = rendered(&Fault::Http {
            status: StatusCode::BAD_REQUEST,
            payload: HttpPayload::Messages(vec!["a".to_owned(), "b".to_owned()]),
        });
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"], json!([{"message": "a"}, {"message": "b"}]));
    }

    #[test]
    fn bare_message_gets_status_default_code() {
        let (status, body) = rendered(&Fault::http(StatusCode::NOT_FOUND, "Exam not found"));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!({"code": "NOT_FOUND", "message": "Exam not found"}));
    }

    #[test]
    fn unrecognized_payload_gets_generic_message() {
        let (_, body) = rendered(&Fault::Http {
            status: StatusCode::IM_A_TEAPOT,
            payload: HttpPayload::Unrecognized(json!({"foo": "bar"})),
        });
        assert_eq!(body["error"], json!({"code": "HTTP_EXCEPTION", "message": "Request failed"}));
    }

    #[test]
    fn catch_all_keeps_message_or_falls_back() {
        let (status, body) = rendered(&Fault::unhandled("boom"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], json!({"code": "UNHANDLED_EXCEPTION", "message": "boom"}));

        let (_, body) = rendered(&Fault::Unhandled {
            message: None,
            trace: Some("at handler".to_owned()),
        });
        assert_eq!(body["error"]["message"], "Internal server error");
        assert!(!body.to_string().contains("handler"));
    }

    #[test]
    fn default_codes_by_status() {
        assert_eq!(default_code_for_status(StatusCode::UNAUTHORIZED), "UNAUTHENTICATED");
        assert_eq!(default_code_for_status(StatusCode::REQUEST_TIMEOUT), "REQUEST_TIMEOUT");
        assert_eq!(
            default_code_for_status(StatusCode::SERVICE_UNAVAILABLE),
            "SERVICE_UNAVAILABLE"
        );
        assert_eq!(
            default_code_for_status(StatusCode::BAD_GATEWAY),
            "INTERNAL_SERVER_ERROR"
        );
        assert_eq!(
            default_code_for_status(StatusCode::UNPROCESSABLE_ENTITY),
            "HTTP_EXCEPTION"
        );
    }
}
