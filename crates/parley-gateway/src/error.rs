// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of failures onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parley_core::ParleyError;
use serde::Serialize;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// A handler failure.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Parley(ParleyError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Parley(e) => match e {
                ParleyError::Config(_) => StatusCode::BAD_REQUEST,
                ParleyError::Messaging { .. } | ParleyError::Completion { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                ParleyError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                ParleyError::Storage { .. } | ParleyError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl From<ParleyError> for ApiError {
    fn from(e: ParleyError) -> Self {
        Self::Parley(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            Self::BadRequest(m) | Self::NotFound(m) | Self::Conflict(m) => m,
            Self::Parley(e) => {
                if status.is_server_error() {
                    tracing::warn!(error = %e, "request failed");
                }
                e.to_string()
            }
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}
