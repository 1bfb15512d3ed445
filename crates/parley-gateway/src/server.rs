// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use parley_agent::ParleyAgent;
use parley_core::ParleyError;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;
use crate::ws;

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub agent: ParleyAgent,
    pub auth: AuthConfig,
    pub health: HealthState,
}

impl GatewayState {
    pub fn new(agent: ParleyAgent, bearer_token: Option<String>) -> Self {
        Self {
            agent,
            auth: AuthConfig { bearer_token },
            health: HealthState {
                start_time: std::time::Instant::now(),
            },
        }
    }
}

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Every gateway route.
///
/// - GET /health (public)
/// - /v1/* (bearer auth via middleware)
/// - GET /ws (auth via `token` query parameter during the handshake)
pub fn router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/conversations", get(handlers::list_conversations))
        .route("/v1/conversations/{id}", delete(handlers::delete_conversation))
        .route(
            "/v1/conversations/{id}/messages",
            get(handlers::get_messages).post(handlers::post_message),
        )
        .route(
            "/v1/conversations/{id}/messages/{msg_id}",
            delete(handlers::delete_message),
        )
        .route(
            "/v1/conversations/{id}/mode",
            get(handlers::get_mode).put(handlers::put_mode),
        )
        .route(
            "/v1/assistant",
            get(handlers::get_assistant).put(handlers::put_assistant),
        )
        .route("/v1/assistant/instruction", get(handlers::get_instruction))
        .route("/v1/sync", post(handlers::post_sync))
        .route("/v1/provider/events", post(handlers::post_provider_events))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state.clone());

    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(ws_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves the gateway until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), ParleyError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ParleyError::Messaging {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| ParleyError::Messaging {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway server stopped");
    Ok(())
}
