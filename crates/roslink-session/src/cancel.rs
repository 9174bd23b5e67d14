use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

const DEFAULT_REASON: &str = "cancelled";

/// Cancellation source for session operations.
///
/// Clones share state. The first reason passed to [`cancel`](Self::cancel)
/// is the one every waiter observes.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    reason: Arc<Mutex<Option<String>>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal. Later calls do not replace the first reason.
    pub fn cancel(&self, reason: impl Into<String>) {
        {
            let mut slot = self.reason.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(reason.into());
            }
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The cancellation reason, once the signal has fired.
    pub fn reason(&self) -> Option<String> {
        if !self.token.is_cancelled() {
            return None;
        }
        Some(self.current_reason())
    }

    /// Wait until the signal fires and return its reason.
    pub async fn cancelled(&self) -> String {
        self.token.cancelled().await;
        self.current_reason()
    }

    /// The underlying token, for composing with other cancellation-aware code.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    fn current_reason(&self) -> String {
        self.reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| DEFAULT_REASON.to_string())
    }
}
