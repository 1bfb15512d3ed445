// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for Parley.
//!
//! Serves the web client's REST surface and live viewer socket, and
//! receives provider events from the browser-automation sidecar over a
//! webhook. All routes but `/health` require the configured bearer token.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod ws;

pub use auth::AuthConfig;
pub use error::ApiError;
pub use server::{router, start_server, GatewayState, HealthState, ServerConfig};
