// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence layer for the Parley messaging bridge.
//!
//! Two process-wide stores, each a JSON document held fully in memory and
//! rewritten whole on every mutation:
//!
//! - [`TranscriptStore`]: per-conversation message logs behind the
//!   deduplication gate.
//! - [`ModeRegistry`]: conversation modes, assistant training text and
//!   schedule, and last-contact times.

pub mod file;
pub mod modes;
pub mod transcript;

pub use file::JsonFile;
pub use modes::ModeRegistry;
pub use transcript::{ConversationPage, ConversationSummary, TranscriptStore, DUPLICATE_WINDOW_MS};
