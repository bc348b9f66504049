//! Single-fire exit signal.

use std::sync::Arc;

use tokio::sync::watch;

/// Exit status reported for both stdin closure and explicit shutdown.
pub const EXIT_SUCCESS: i32 = 0;

/// Completion value marking daemon termination.
///
/// The first call to [`ExitSignal::complete`] fixes the status; later calls
/// are ignored. Clones observe the same signal.
#[derive(Debug, Clone)]
pub struct ExitSignal {
    state: Arc<watch::Sender<Option<i32>>>,
}

impl ExitSignal {
    /// Creates an unresolved signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(None);
        Self {
            state: Arc::new(sender),
        }
    }

    /// Resolves the signal with `status`.
    ///
    /// Returns `true` when this call resolved the signal and `false` when it
    /// had already been resolved.
    pub fn complete(&self, status: i32) -> bool {
        self.state.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(status);
            true
        })
    }

    /// Returns the resolved status, if any.
    #[must_use]
    pub fn status(&self) -> Option<i32> {
        *self.state.borrow()
    }

    /// Waits until the signal resolves and returns its status.
    pub async fn wait(&self) -> i32 {
        let mut receiver = self.state.subscribe();
        let resolved = match receiver.wait_for(Option::is_some).await {
            Ok(status) => *status,
            Err(_) => None,
        };
        resolved.unwrap_or(EXIT_SUCCESS)
    }
}

impl Default for ExitSignal {
    fn default() -> Self {
        Self::new()
    }
}
