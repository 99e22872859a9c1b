//! HTTP surface.
//!
//! ```text
//! POST /generate_pdf   JSON array of {template, data} → merged PDF attachment
//! GET  /health         liveness check, always "ok"
//! ```
//!
//! Failures become `{"error": "<message>"}` with a status derived from
//! [`ErrorKind`]: 400, 404 or 500.

use crate::config::ServiceConfig;
use crate::error::{ErrorKind, Tmpl2PdfError};
use crate::generate::PdfGenerator;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Message sent instead of internal error details when redaction is on.
pub const REDACTED_MESSAGE: &str = "Internal server error";

#[derive(Clone)]
struct AppState {
    generator: Arc<PdfGenerator>,
    redact_internal_errors: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// A pipeline error on its way to the client.
struct ApiError {
    error: Tmpl2PdfError,
    redact: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.kind() {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status.is_server_error() {
            tracing::error!(error = %self.error, "PDF generation failed");
            if self.redact {
                REDACTED_MESSAGE.to_string()
            } else {
                self.error.to_string()
            }
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.error, "rejected request");
            self.error.to_string()
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Build the application router around a shared generator.
pub fn router(generator: Arc<PdfGenerator>, redact_internal_errors: bool) -> Router {
    let state = AppState {
        generator,
        redact_internal_errors,
    };
    Router::new()
        .route("/generate_pdf", post(generate_pdf))
        // Batches carry arbitrary `data`; no body size cap.
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Health checks stay out of the request trace.
        .merge(Router::new().route("/health", get(health)))
}

async fn generate_pdf(State(state): State<AppState>, body: Bytes) -> Response {
    match state.generator.generate(&body).await {
        Ok(pdf) => (
            [
                (header::CONTENT_TYPE, "application/pdf"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"merged.pdf\""),
            ],
            pdf,
        )
            .into_response(),
        Err(error) => ApiError {
            error,
            redact: state.redact_internal_errors,
        }
        .into_response(),
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Bind `config.bind_addr` and serve until Ctrl-C.
pub async fn serve(generator: Arc<PdfGenerator>, config: &ServiceConfig) -> std::io::Result<()> {
    let app = router(generator, config.redact_internal_errors);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("tmpl2pdf listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for Ctrl-C, shutdown only by kill: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;

    fn status_and_body(error: Tmpl2PdfError, redact: bool) -> (StatusCode, Response) {
        let response = ApiError { error, redact }.into_response();
        (response.status(), response)
    }

    #[test]
    fn kinds_map_to_statuses() {
        let (s, _) = status_and_body(Tmpl2PdfError::InvalidBatch, false);
        assert_eq!(s, StatusCode::BAD_REQUEST);
        let (s, _) = status_and_body(
            Tmpl2PdfError::TemplateNotFound {
                template: "a.html".into(),
            },
            false,
        );
        assert_eq!(s, StatusCode::NOT_FOUND);
        let (s, _) = status_and_body(
            Tmpl2PdfError::Conversion(ConvertError::Other("boom".into())),
            true,
        );
        assert_eq!(s, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_responses_are_json() {
        let (_, response) = status_and_body(Tmpl2PdfError::InvalidBatch, false);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
