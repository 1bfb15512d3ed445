// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley messaging bridge.
//!
//! This crate provides the error type, domain types, raw provider event
//! accessors, and the adapter traits implemented by the messaging and
//! completion collaborators.

pub mod error;
pub mod event;
pub mod jid;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ParleyError;
pub use event::ProviderEvent;
pub use types::{
    AdapterType, ChatMode, Direction, HealthStatus, Message, MessageEvent, MessageKind,
    ViewerEvent,
};

pub use traits::{CompletionProvider, MessagingProvider, PluginAdapter};
