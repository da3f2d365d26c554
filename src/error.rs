// Error types for the Proton VPN handle service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::any::Any;
use thiserror::Error;

use crate::api::ErrorResponse;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Convert error to user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Io(_) => "File system error. Check permissions and paths.".to_string(),
            AppError::Config(msg) => format!("Configuration error: {}", msg),
            AppError::ConfigParse(_) => {
                "Config file is not valid TOML. Check its syntax.".to_string()
            }
            AppError::Serialization(_) => {
                "Data format error. This might be a bug, please report it.".to_string()
            }
            AppError::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(_) => {
                tracing::warn!("Rejected request: {}", self);
                error_response(StatusCode::BAD_REQUEST, "Bad request", self.user_message())
            }
            _ => {
                tracing::error!("Request failed: {}", self);
                internal_error(self.user_message())
            }
        }
    }
}

fn internal_error(message: String) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", message)
}

fn error_response(status: StatusCode, error: &str, message: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message,
        }),
    )
        .into_response()
}

/// Turn a handler panic into the same 500 payload as a returned error
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", message);
    internal_error(message)
}
