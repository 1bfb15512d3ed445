// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley messaging bridge.

use thiserror::Error;

/// The primary error type used across all Parley adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage errors (file I/O, JSON serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging provider errors (sidecar unreachable, send rejected, fetch failed).
    #[error("messaging error: {message}")]
    Messaging {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// LLM completion errors (API failure, empty output, malformed response).
    #[error("completion error: {message}")]
    Completion {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Shorthand for a messaging error without an underlying source.
    pub fn messaging(message: impl Into<String>) -> Self {
        Self::Messaging {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a completion error without an underlying source.
    pub fn completion(message: impl Into<String>) -> Self {
        Self::Completion {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps any error as a storage error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }
}
