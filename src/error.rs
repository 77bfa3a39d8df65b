/**
 * Error Types
 * Request-level errors and their JSON shape
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::StoreError;
use crate::images::ImageHostError;

/// Error response body shared by every route
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidUpload(String),

    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },

    #[error("{context}: {source}")]
    ImageHost {
        context: String,
        #[source]
        source: ImageHostError,
    },
}

impl AppError {
    pub fn store(context: impl Into<String>, source: StoreError) -> Self {
        AppError::Store {
            context: context.into(),
            source,
        }
    }

    pub fn image_host(context: impl Into<String>, source: ImageHostError) -> Self {
        AppError::ImageHost {
            context: context.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            AppError::Store { .. } | AppError::ImageHost { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::NotFound(_) => ErrorResponse {
                message: self.to_string(),
                error: None,
            },
            AppError::Validation(detail) => ErrorResponse {
                message: "Missing or invalid fields".to_string(),
                error: Some(detail.clone()),
            },
            AppError::InvalidUpload(detail) => ErrorResponse {
                message: "Invalid image upload".to_string(),
                error: Some(detail.clone()),
            },
            AppError::Store { context, source } => {
                tracing::error!(error = %source, "{}", context);
                ErrorResponse {
                    message: context.clone(),
                    error: Some(source.to_string()),
                }
            }
            AppError::ImageHost { context, source } => {
                tracing::error!(error = %source, "{}", context);
                ErrorResponse {
                    message: context.clone(),
                    error: Some(source.to_string()),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
