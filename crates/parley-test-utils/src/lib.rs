// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Provides mock adapters and a harness for fast, deterministic,
//! CI-runnable tests without a browser sidecar or an LLM.
//!
//! # Components
//!
//! - [`MockMessenger`] - Mock messaging provider with recorded sends and scripted history
//! - [`MockCompletion`] - Mock LLM with queued responses, failures and delay
//! - [`ManualClock`] - Clock that only moves when told to
//! - [`TestHarness`] - A full agent over temp storage and the mocks above

pub mod clock;
pub mod harness;
pub mod mock_completion;
pub mod mock_messenger;

pub use clock::ManualClock;
pub use harness::TestHarness;
pub use mock_completion::MockCompletion;
pub use mock_messenger::{MockMessenger, SentText};
