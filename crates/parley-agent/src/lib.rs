// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message ingestion, mode dispatch and reconciliation for Parley.
//!
//! Provider events flow through [`Pipeline`]: the [`ContentResolver`]
//! extracts content, the [`Committer`] gates, stores and publishes it,
//! and the [`Dispatcher`] applies the conversation's mode. The
//! [`SyncRunner`] feeds messages typed on the primary device into the same
//! commit path. [`ParleyAgent`] wires these together for the binary and
//! the gateway.

pub mod clock;
pub mod commit;
pub mod contacts;
pub mod dispatcher;
pub mod fanout;
pub mod pipeline;
pub mod reply;
pub mod resolver;
pub mod rewrite;
pub mod schedule;
pub mod shutdown;
pub mod sync;

use std::sync::Arc;
use std::time::Duration;

use parley_config::ParleyConfig;
use parley_core::jid::to_chat_jid;
use parley_core::{
    AdapterType, CompletionProvider, HealthStatus, Message, MessagingProvider, PluginAdapter,
    ViewerEvent,
};
use serde::Serialize;
use parley_storage::{ModeRegistry, TranscriptStore};
use tracing::{info, warn};

pub use clock::{Clock, FixedClock, WallClock};
pub use commit::{Committed, Committer};
pub use contacts::ContactCache;
pub use dispatcher::{Dispatcher, DispatcherSettings};
pub use fanout::Fanout;
pub use pipeline::Pipeline;
pub use resolver::ContentResolver;
pub use sync::{SyncReport, SyncRunner};

/// Outcome of one adapter's health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    pub adapter_type: AdapterType,
    /// `healthy`, `degraded` or `unhealthy`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AdapterHealth {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

async fn check<A: PluginAdapter + ?Sized>(adapter: &A) -> AdapterHealth {
    let (status, detail) = match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => ("healthy", None),
        Ok(HealthStatus::Degraded(why)) => ("degraded", Some(why)),
        Ok(HealthStatus::Unhealthy(why)) => ("unhealthy", Some(why)),
        Err(e) => ("unhealthy", Some(e.to_string())),
    };
    AdapterHealth {
        name: adapter.name().to_string(),
        adapter_type: adapter.adapter_type(),
        status: status.to_string(),
        detail,
    }
}

/// Every long-lived component of a running bridge.
#[derive(Clone)]
pub struct ParleyAgent {
    pub provider: Arc<dyn MessagingProvider>,
    pub completer: Arc<dyn CompletionProvider>,
    pub store: Arc<TranscriptStore>,
    pub registry: Arc<ModeRegistry>,
    pub contacts: Arc<ContactCache>,
    pub committer: Arc<Committer>,
    pub dispatcher: Arc<Dispatcher>,
    pub pipeline: Arc<Pipeline>,
    pub sync: Arc<SyncRunner>,
}

impl ParleyAgent {
    pub fn new(
        config: &ParleyConfig,
        provider: Arc<dyn MessagingProvider>,
        completer: Arc<dyn CompletionProvider>,
        store: Arc<TranscriptStore>,
        registry: Arc<ModeRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let contacts = Arc::new(ContactCache::new());
        let fanout = Fanout::new(config.gateway.event_buffer);
        let committer = Arc::new(Committer::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            fanout,
        ));
        let resolver = Arc::new(ContentResolver::new(
            Arc::clone(&provider),
            config.bridge.bot_ids.clone(),
            config.bridge.self_id.clone(),
            config.bridge.history_limit,
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&provider),
            Arc::clone(&completer),
            Arc::clone(&committer),
            Arc::clone(&registry),
            Arc::clone(&contacts),
            Arc::clone(&clock),
            DispatcherSettings::from_config(config),
        ));
        let sync = Arc::new(SyncRunner::new(
            Arc::clone(&provider),
            Arc::clone(&resolver),
            Arc::clone(&committer),
            Arc::clone(&contacts),
            Arc::clone(&store),
            Arc::clone(&clock),
            config.bridge.history_limit,
            Duration::from_secs(config.sync.lookback_secs),
        ));
        let pipeline = Arc::new(Pipeline::new(
            Arc::clone(&provider),
            resolver,
            Arc::clone(&committer),
            Arc::clone(&dispatcher),
            Arc::clone(&contacts),
            Arc::clone(&sync),
            clock,
        ));

        Self {
            provider,
            completer,
            store,
            registry,
            contacts,
            committer,
            dispatcher,
            pipeline,
            sync,
        }
    }

    pub fn fanout(&self) -> &Fanout {
        self.committer.fanout()
    }

    /// Health of the messaging provider and the completer, in that order.
    pub async fn health(&self) -> Vec<AdapterHealth> {
        vec![
            check(&*self.provider).await,
            check(&*self.completer).await,
        ]
    }

    /// Lets both adapters release their resources. Failures are logged.
    pub async fn shutdown(&self) {
        if let Err(e) = self.provider.shutdown().await {
            warn!(adapter = self.provider.name(), error = %e, "adapter shutdown failed");
        }
        if let Err(e) = self.completer.shutdown().await {
            warn!(adapter = self.completer.name(), error = %e, "adapter shutdown failed");
        }
        info!("adapters shut down");
    }

    /// Transcript of `conversation`, kicking off an on-demand sync.
    pub async fn open_conversation(&self, conversation: &str) -> Vec<Message> {
        self.sync.spawn_for(conversation);
        self.store.messages(conversation).await
    }

    /// Removes one message and tells viewers about it.
    ///
    /// With `for_everyone`, the provider is asked to delete it too; that
    /// request is best effort.
    pub async fn delete_message(
        &self,
        conversation: &str,
        id: &str,
        for_everyone: bool,
    ) -> Option<Message> {
        let removed = self.store.delete_message(conversation, id).await?;

        if for_everyone && !removed.id.starts_with("local_") {
            let jid = to_chat_jid(conversation);
            if let Err(e) = self.provider.delete_message(&jid, &removed.id, true).await {
                warn!(
                    conversation,
                    id = %removed.id,
                    error = %e,
                    "provider delete failed, removed locally only"
                );
            }
        }

        self.committer
            .announce(ViewerEvent::MessageDeleted {
                from: conversation.to_string(),
                id: removed.id.clone(),
            })
            .await;
        Some(removed)
    }

    /// Drops a whole conversation. Its mode is kept.
    pub async fn delete_conversation(&self, conversation: &str) -> bool {
        if !self.store.delete_conversation(conversation).await {
            return false;
        }
        self.registry.forget_contact(conversation).await;
        self.committer
            .announce(ViewerEvent::ConversationDeleted {
                from: conversation.to_string(),
            })
            .await;
        info!(conversation, "conversation deleted");
        true
    }
}
