// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push channel to every connected viewer.
//!
//! A viewer that falls more than the channel capacity behind loses the
//! oldest events and is told how many it missed by its receiver.

use parley_core::ViewerEvent;
use tokio::sync::broadcast;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct Fanout {
    tx: broadcast::Sender<ViewerEvent>,
}

impl Fanout {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewerEvent> {
        self.tx.subscribe()
    }

    /// Sends `event` to all current viewers and returns how many got it.
    pub fn publish(&self, event: ViewerEvent) -> usize {
        let conversation = event.conversation().to_string();
        match self.tx.send(event) {
            Ok(receivers) => {
                trace!(conversation = %conversation, receivers, "viewer event published");
                receivers
            }
            // No viewers connected.
            Err(_) => 0,
        }
    }

    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
