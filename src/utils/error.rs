use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::utils::response::ProblemDetails;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{detail}")]
    Validation {
        detail: String,
        errors: Vec<String>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Single-message validation failure.
    pub fn validation(detail: impl Into<String>) -> Self {
        AppError::Validation {
            detail: detail.into(),
            errors: Vec::new(),
        }
    }

    /// Batch validation failure carrying one message per rejected item.
    pub fn batch_validation(detail: impl Into<String>, errors: Vec<String>) -> Self {
        AppError::Validation {
            detail: detail.into(),
            errors,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "Bad Request",
            AppError::NotFound(_) => "Not Found",
            AppError::Database(_) => "Internal Server Error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let title = self.title();

        // Only expose high-level detail to the client; storage errors are
        // logged and replaced with a generic message.
        let (detail, errors) = match self {
            AppError::Validation { detail, errors } => {
                (detail, (!errors.is_empty()).then_some(errors))
            }
            AppError::NotFound(detail) => (detail, None),
            AppError::Database(e) => {
                error!(error = ?e, "Database error");
                (
                    "An error occurred while processing your request.".to_string(),
                    None,
                )
            }
        };

        let mut problem = ProblemDetails::new(status, title, detail);
        if let Some(errors) = errors {
            problem = problem.with_errors(errors);
        }
        problem.into_response()
    }
}
