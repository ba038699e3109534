//! Graceful stop signal shared by the server and its background tasks.
//!
//! Each task holds its own `broadcast::Receiver<()>` and waits on `recv()`;
//! [`Shutdown::trigger`] wakes all of them at once. A receiver created after
//! the trigger does not observe it.

use tokio::sync::broadcast;

/// Handle that fans one stop event out to every subscriber. Clones share
/// the same channel.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// A receiver for [`HttpServer::run`](crate::http::HttpServer::run) or
    /// any other task that must stop with the server.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every current subscriber. Safe to call with none listening.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
