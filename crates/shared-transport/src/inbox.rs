//! Single-consumer queue between listeners and the node worker.

use shared_types::Message;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// Default number of messages buffered before listeners apply backpressure.
pub const DEFAULT_INBOX_CAPACITY: usize = 1024;

/// Many producers (connection tasks), one consumer (the node worker).
pub struct Inbox {
    sender: mpsc::Sender<Message>,
    receiver: Mutex<mpsc::Receiver<Message>>,
}

impl Inbox {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Producer handle for a listener task.
    pub fn sender(&self) -> mpsc::Sender<Message> {
        self.sender.clone()
    }

    /// Wait up to `timeout` for the next message.
    pub async fn recv_timeout(&self, timeout: Duration) -> Option<Message> {
        tokio::time::timeout(timeout, async {
            let mut receiver = self.receiver.lock().await;
            receiver.recv().await
        })
        .await
        .ok()
        .flatten()
    }

    /// Number of messages waiting.
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new(DEFAULT_INBOX_CAPACITY)
    }
}
