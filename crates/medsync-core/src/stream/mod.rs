// ── Snapshot subscriptions ──
//
// A subscriber sees whole network roots, never diffs. Roots published
// while nobody is polling collapse into the newest one.

mod filter;

use std::sync::Arc;

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Network;

pub use filter::StockFilter;

/// Receiver side of the store's root channel.
pub struct NetworkStream {
    receiver: watch::Receiver<Arc<Network>>,
}

impl NetworkStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Network>>) -> Self {
        Self { receiver }
    }

    /// Wait until a write publishes a new root. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Arc<Network>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Yields the root at subscription time, then each later root.
    pub fn into_stream(self) -> impl Stream<Item = Arc<Network>> + Send + Unpin {
        WatchStream::new(self.receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn changed_ends_when_store_is_dropped() {
        let (sender, receiver) = watch::channel(Arc::new(Network::default()));
        let mut stream = NetworkStream::new(receiver);
        drop(sender);

        assert!(stream.changed().await.is_none());
    }
}
