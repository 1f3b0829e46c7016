//! Typed store events delivered to an injected sink.
//!
//! The storage layer never logs directly; everything an embedder needs to
//! observe flows through [`StoreEvent`]. A process that only wants log lines
//! can hand the receiver end to [`spawn_log_bridge`].

use crossbeam_channel::{Receiver, Sender};
use std::thread;

/// Events emitted by the store over its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// The store was opened and the schema is ready.
    Connected,
    /// Opening the store failed; the handle is unusable.
    ConnectError(String),
    /// A block was committed; carries the new height.
    BlockAdded(u32),
    /// An operation failed. Emitted exactly once per failure, before the
    /// error is returned to the caller.
    Error(String),
}

/// Sending half of the event channel, injected at [`crate::store::Database::open`].
pub type EventSink = Sender<StoreEvent>;

/// Forwards store events to `tracing` on a background thread.
///
/// Returns the join handle; the thread exits when the store (and with it the
/// sending half of the channel) is dropped.
pub fn spawn_log_bridge(events: Receiver<StoreEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for event in events {
            match event {
                StoreEvent::Connected => tracing::info!("store connected"),
                StoreEvent::ConnectError(e) => tracing::error!("store connect failed: {}", e),
                StoreEvent::BlockAdded(height) => tracing::info!("block added at height {}", height),
                StoreEvent::Error(e) => tracing::error!("store error: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn bridge_drains_channel_and_exits() {
        let (tx, rx) = unbounded();
        let handle = spawn_log_bridge(rx);
        tx.send(StoreEvent::Connected).unwrap();
        tx.send(StoreEvent::BlockAdded(1)).unwrap();
        drop(tx);
        handle.join().unwrap();
    }
}
