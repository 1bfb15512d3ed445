// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion provider trait for the LLM collaborator.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::CompletionRequest;

/// Opaque single-turn text completion.
///
/// Implementations hold their own credentials. Callers bound every call
/// with a timeout and treat any error as "no completion available".
#[async_trait]
pub trait CompletionProvider: PluginAdapter {
    /// Completes `request.user_text` under `request.system_instruction`.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ParleyError>;
}
