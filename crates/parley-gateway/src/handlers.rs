// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parley_agent::AdapterHealth;
use parley_core::jid::normalize_jid;
use parley_core::{ChatMode, Message, ProviderEvent};
use parley_storage::ConversationSummary;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::server::GatewayState;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when every adapter is healthy, `degraded` otherwise.
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub viewers: usize,
    pub adapters: Vec<AdapterHealth>,
}

/// Query parameters for GET /v1/conversations.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// One row of the conversation listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: String,
    pub name: Option<String>,
    pub profile_pic_url: Option<String>,
    pub mode: ChatMode,
    pub message_count: usize,
    pub last_message: Option<Message>,
}

#[derive(Debug, Serialize)]
pub struct ConversationList {
    pub items: Vec<ConversationView>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

/// Request body for POST /v1/conversations/{id}/messages.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    /// Records stored for this send, in order.
    pub messages: Vec<Message>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub for_everyone: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModeBody {
    pub mode: ChatMode,
}

#[derive(Debug, Serialize)]
pub struct ModeResponse {
    pub conversation: String,
    pub mode: ChatMode,
}

/// Assistant inputs; absent fields are left unchanged on update.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantBody {
    #[serde(default)]
    pub training_text: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InstructionResponse {
    pub instruction: String,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub accepted: usize,
}

fn conversation_key(raw: &str) -> Result<String, ApiError> {
    let key = normalize_jid(raw);
    if key.is_empty() {
        return Err(ApiError::BadRequest("conversation id is empty".into()));
    }
    Ok(key)
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let adapters = state.agent.health().await;
    let status = if adapters.iter().all(AdapterHealth::is_healthy) {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        viewers: state.agent.fanout().viewer_count(),
        adapters,
    })
}

/// GET /v1/conversations
pub async fn list_conversations(
    State(state): State<GatewayState>,
    Query(query): Query<ListQuery>,
) -> Json<ConversationList> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = state
        .agent
        .store
        .list_conversations(query.page.unwrap_or(1), limit)
        .await;

    let mut items = Vec::with_capacity(page.items.len());
    for ConversationSummary {
        id,
        message_count,
        last_message,
    } in page.items
    {
        let contact = state.agent.contacts.lookup(&id).unwrap_or_default();
        let mode = state.agent.registry.mode(&id).await;
        items.push(ConversationView {
            name: contact.name,
            profile_pic_url: contact.profile_pic_url,
            mode,
            message_count,
            last_message,
            id,
        });
    }

    Json(ConversationList {
        items,
        total: page.total,
        page: page.page,
        limit: page.limit,
    })
}

/// GET /v1/conversations/{id}/messages
pub async fn get_messages(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let conversation = conversation_key(&id)?;
    Ok(Json(state.agent.open_conversation(&conversation).await))
}

/// POST /v1/conversations/{id}/messages
pub async fn post_message(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<SendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let conversation = conversation_key(&id)?;
    if body.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".into()));
    }
    let messages = state.agent.dispatcher.send(&conversation, &body.text).await?;
    Ok(Json(SendResponse { messages }))
}

/// DELETE /v1/conversations/{id}
pub async fn delete_conversation(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let conversation = conversation_key(&id)?;
    if state.agent.delete_conversation(&conversation).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("conversation {conversation} not found")))
    }
}

/// DELETE /v1/conversations/{id}/messages/{msg_id}
pub async fn delete_message(
    State(state): State<GatewayState>,
    Path((id, message_id)): Path<(String, String)>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Message>, ApiError> {
    let conversation = conversation_key(&id)?;
    state
        .agent
        .delete_message(&conversation, &message_id, query.for_everyone)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("message {message_id} not found")))
}

/// GET /v1/conversations/{id}/mode
pub async fn get_mode(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<ModeResponse>, ApiError> {
    let conversation = conversation_key(&id)?;
    let mode = state.agent.registry.mode(&conversation).await;
    Ok(Json(ModeResponse { conversation, mode }))
}

/// PUT /v1/conversations/{id}/mode
pub async fn put_mode(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<ModeBody>,
) -> Result<Json<ModeResponse>, ApiError> {
    let conversation = conversation_key(&id)?;
    state.agent.registry.set_mode(&conversation, body.mode).await;
    Ok(Json(ModeResponse {
        conversation,
        mode: body.mode,
    }))
}

/// GET /v1/assistant
pub async fn get_assistant(State(state): State<GatewayState>) -> Json<AssistantBody> {
    Json(AssistantBody {
        training_text: Some(state.agent.registry.training_text().await),
        schedule: Some(state.agent.registry.schedule().await),
    })
}

/// PUT /v1/assistant
pub async fn put_assistant(
    State(state): State<GatewayState>,
    Json(body): Json<AssistantBody>,
) -> Json<AssistantBody> {
    state
        .agent
        .registry
        .set_assistant(body.training_text, body.schedule)
        .await;
    get_assistant(State(state)).await
}

/// GET /v1/assistant/instruction
pub async fn get_instruction(State(state): State<GatewayState>) -> Json<InstructionResponse> {
    Json(InstructionResponse {
        instruction: state.agent.dispatcher.current_instruction().await,
    })
}

/// POST /v1/sync
pub async fn post_sync(State(state): State<GatewayState>) -> Response {
    match state.agent.sync.run_once().await {
        Some(report) => Json(report).into_response(),
        None => ApiError::Conflict("a sync pass is already running".into()).into_response(),
    }
}

/// POST /v1/provider/events
///
/// Accepts one event or an array of events. Each is handled on its own
/// task; the response does not wait for them.
pub async fn post_provider_events(
    State(state): State<GatewayState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    let events = match body {
        Value::Array(items) => items,
        Value::Object(_) => vec![body],
        _ => return Err(ApiError::BadRequest("expected an event object or array".into())),
    };

    let accepted = events.len();
    for raw in events {
        let pipeline = state.agent.pipeline.clone();
        tokio::spawn(async move {
            pipeline.handle_event(ProviderEvent::new(raw)).await;
        });
    }
    debug!(accepted, "provider events queued");
    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse { accepted })))
}
