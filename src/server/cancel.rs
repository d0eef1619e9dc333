use async_channel::{Receiver, Sender};

/// Signals the accept loop to stop.
///
/// Clones share the same signal. Cancelling is idempotent and wakes every task
/// waiting in [`cancelled`](CancellationToken::cancelled).
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Sender<()>,
    receiver: Receiver<()>,
}

impl CancellationToken {
    /// Create a new token.
    pub fn new() -> Self {
        let (sender, receiver) = async_channel::bounded(1);
        Self { sender, receiver }
    }

    /// Cancel the token.
    pub fn cancel(&self) {
        self.sender.close();
    }

    /// Whether the token was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.sender.is_closed()
    }

    /// Wait until the token is cancelled.
    pub async fn cancelled(&self) {
        // Nothing is ever sent, so `recv` only returns once the channel closes.
        let _ = self.receiver.recv().await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
