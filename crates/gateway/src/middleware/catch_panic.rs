//! Route-boundary handling for panics raised while serving a request

use axum::response::{IntoResponse, Response};
use invoice_intake_common::errors::AppError;
use std::any::Any;

/// Turn a handler panic into the standard 500 envelope
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    tracing::error!(panic = %message, "Request handler panicked");
    AppError::Internal { message }.into_response()
}
