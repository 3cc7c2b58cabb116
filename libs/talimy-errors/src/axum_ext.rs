//! Axum integration: faults as responses, the logging middleware that every
//! error response passes through, and the catch-all handlers.

use std::any::Any;

use axum::{
    Json,
    extract::{Request, rejection::JsonRejection},
    http::{Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::envelope::ErrorEnvelope;
use crate::fault::{Fault, HttpPayload};
use crate::normalize::normalize;

/// Attached to every error response so [`error_contract`] can log it with
/// the request line.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
    pub internal: Option<String>,
}

impl IntoResponse for Fault {
    fn into_response(self) -> Response {
        let normalized = normalize(&self);
        let report = ErrorReport {
            code: normalized.body.code.clone(),
            message: normalized.body.message.clone(),
            internal: normalized.internal,
        };
        let mut response =
            (normalized.status, Json(ErrorEnvelope::from(normalized.body))).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Body that parsed but did not fit, or did not parse, is a validation
/// failure; the rest keep their own status and text.
impl From<JsonRejection> for Fault {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => Fault::Http {
                status: rejection.status(),
                payload: HttpPayload::Messages(vec![rejection.body_text()]),
            },
            _ => Fault::http(rejection.status(), rejection.body_text()),
        }
    }
}

/// Outermost middleware: logs every error response with method and path, and
/// wraps error responses produced outside of [`Fault`] (e.g. router 405s) into
/// the envelope.
pub async fn error_contract(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let mut response = next.run(request).await;
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    if response.extensions().get::<ErrorReport>().is_none() {
        let reason = status.canonical_reason().unwrap_or("Request failed");
        response = Fault::http(status, reason).into_response();
    }

    if let Some(report) = response.extensions().get::<ErrorReport>() {
        let internal = report.internal.as_deref().unwrap_or_default();
        if status.is_server_error() {
            tracing::error!(
                %method,
                path = %path,
                status = status.as_u16(),
                code = %report.code,
                internal,
                "{}",
                report.message
            );
        } else {
            tracing::warn!(
                %method,
                path = %path,
                status = status.as_u16(),
                code = %report.code,
                "{}",
                report.message
            );
        }
    }

    response
}

/// Router fallback for unmatched paths.
#[allow(clippy::unused_async)]
pub async fn not_found_fallback(method: Method, uri: Uri) -> Fault {
    Fault::http(StatusCode::NOT_FOUND, format!("Cannot {method} {}", uri.path()))
}

/// Panic handler for `tower_http::catch_panic::CatchPanicLayer::custom`.
///
/// The panic payload is logged, never rendered.
#[allow(clippy::needless_pass_by_value)] // signature fixed by CatchPanicLayer
#[must_use]
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_owned()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_owned()
    };
    Fault::Unhandled {
        message: None,
        trace: Some(format!("panic: {detail}")),
    }
    .into_response()
}
