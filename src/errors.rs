use crate::engine::judge::JudgeError;
use crate::response::ApiResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use deadpool_diesel::InteractError;
use deadpool_diesel::postgres::PoolError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String), // 400

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String), // 400

    #[error("Unauthorized: {0}")]
    Unauthorized(String), // 401

    #[error("Forbidden: {0}")]
    Forbidden(String), // 403

    #[error("Precondition not met: {0}")]
    PreconditionNotMet(String), // 403

    #[error("Not Found: {0}")]
    NotFound(String), // 404

    #[error("Conflict: {0}")]
    Conflict(String), // 409

    #[error("Code execution failed: {0}")]
    ExecutionFailed(String), // 422

    #[error("Internal Server Error: {0}")]
    InternalServerError(#[from] anyhow::Error), // 500
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::PreconditionNotMet(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ExecutionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text sent to the client. Internal causes stay in the logs.
    fn client_message(self) -> String {
        match self {
            AppError::UnsupportedLanguage(code) => format!("Unsupported language: {}", code),
            AppError::ExecutionFailed(diagnostic) => {
                format!("Code execution failed: {}", diagnostic)
            }
            AppError::InternalServerError(source) => {
                error!(
                    "Responding with 500 Internal Server Error. Source: {:?}",
                    source
                );
                "An internal server error occurred".to_string()
            }
            AppError::BadRequest(message)
            | AppError::Unauthorized(message)
            | AppError::Forbidden(message)
            | AppError::PreconditionNotMet(message)
            | AppError::NotFound(message)
            | AppError::Conflict(message) => message,
        }
    }
}

impl From<PoolError> for AppError {
    fn from(err: PoolError) -> Self {
        error!("Could not check out a database connection: {:?}", err);
        AppError::InternalServerError(anyhow::Error::new(err).context("Database pool error"))
    }
}

impl From<InteractError> for AppError {
    fn from(err: InteractError) -> Self {
        error!("Blocking database task did not complete: {:?}", err);
        AppError::InternalServerError(anyhow::anyhow!("Database interaction error: {}", err))
    }
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => {
                warn!("Query expected a row but found none");
                AppError::NotFound("Resource not found (database query)".to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                warn!("Foreign key violation: {}", info.message());
                AppError::NotFound("A referenced record does not exist".to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                warn!("Unique violation: {}", info.message());
                AppError::Conflict("Record already exists".to_string())
            }
            other => {
                error!("Unhandled Diesel error encountered: {:?}", other);
                AppError::InternalServerError(
                    anyhow::Error::new(other).context("Database query error"),
                )
            }
        }
    }
}

impl From<JudgeError> for AppError {
    fn from(err: JudgeError) -> Self {
        warn!("Judge rejected submission: {}", err);
        match err {
            JudgeError::UnsupportedLanguage(code) => AppError::UnsupportedLanguage(code),
            JudgeError::ExecutionFailed(diagnostic) => AppError::ExecutionFailed(diagnostic),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        ApiResponse::<()>::failure(status, self.client_message()).into_response()
    }
}
