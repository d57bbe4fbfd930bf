use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::validation::ValidationErrors;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Required parameter missing: {0}")]
    MissingParameter(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("Not supported format")]
    UnsupportedFormat,
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("template error")]
    Template(#[from] tera::Error),
    #[error("background queue is closed")]
    QueueClosed,
}

/// Envelope returned by every failing API request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub errors: Vec<String>,
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn todo_list_not_found() -> Self {
        Self::not_found("Todo list not found")
    }

    pub fn item_not_found() -> Self {
        Self::not_found("Item not found")
    }

    pub fn missing_parameter(param: impl Into<String>) -> Self {
        Self::MissingParameter(param.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MissingParameter(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedFormat => StatusCode::NOT_ACCEPTABLE,
            Self::Database(_) | Self::Migration(_) | Self::Template(_) | Self::QueueClosed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Human readable messages safe to hand back to a client.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::NotFound(msg) | Self::BadRequest(msg) => vec![msg.clone()],
            Self::Validation(errors) => errors.full_messages(),
            Self::MissingParameter(_) | Self::UnsupportedFormat => vec![self.to_string()],
            Self::Database(_) => vec!["database operation failed".to_string()],
            Self::Migration(_) => vec!["database migration failed".to_string()],
            Self::Template(_) | Self::QueueClosed => vec!["internal server error".to_string()],
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database(err) => error!(error = %err, "database operation failed"),
            Self::Migration(err) => error!(error = %err, "database migration failed"),
            Self::Template(err) => error!(error = ?err, "template rendering failed"),
            Self::QueueClosed => error!("job queue receiver has shut down"),
            _ => {}
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log_internal();
        let status = self.status();
        let body = ErrorBody {
            errors: self.messages(),
        };
        (status, Json(body)).into_response()
    }
}

/// Wrapper that renders an [`AppError`] as a small HTML fragment instead of JSON.
#[derive(Debug)]
pub struct HtmlError(pub AppError);

impl<E> From<E> for HtmlError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

const ERRORS_TEMPLATE: &str = include_str!("../templates/errors.html");

impl HtmlError {
    fn render(&self) -> tera::Result<String> {
        let mut context = tera::Context::new();
        context.insert("messages", &self.0.messages());
        tera::Tera::one_off(ERRORS_TEMPLATE, &context, true)
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        self.0.log_internal();
        let status = self.0.status();
        match self.render() {
            Ok(body) => (status, axum::response::Html(body)).into_response(),
            Err(err) => {
                error!(error = ?err, "error fragment rendering failed");
                status.into_response()
            }
        }
    }
}
