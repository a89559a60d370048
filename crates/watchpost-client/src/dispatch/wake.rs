use std::sync::Arc;

use tokio::sync::Notify;

use super::queue::WakeScheduler;

/// Wake-up backed by `tokio::sync::Notify`.
///
/// `schedule` stores a permit, so the consumer loop's next
/// `notified().await` completes on its next turn without sleeping. A
/// cancelled queue ignores a stale permit (`WakeOutcome::Closed`).
#[derive(Clone, Default)]
pub struct NotifyScheduler {
    notify: Arc<Notify>,
}

impl NotifyScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self) -> Arc<Notify> {
        Arc::clone(&self.notify)
    }
}

impl WakeScheduler for NotifyScheduler {
    fn schedule(&self) {
        self.notify.notify_one();
    }
}
