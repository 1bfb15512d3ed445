// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for Parley's external collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod completion;
pub mod messaging;

pub use adapter::PluginAdapter;
pub use completion::CompletionProvider;
pub use messaging::MessagingProvider;
