// Data-load signals
//
// A signal counts completed network loads for one endpoint. Callers arm it
// before the action that triggers the fetch, then wait for the armed number
// of loads to complete after that point.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Why a signal wait did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalFailure {
    /// Fewer loads than armed completed in time.
    TimedOut { seen: u64, expected: u64 },
    /// The awaited load completed but failed.
    LoadFailed,
}

impl std::fmt::Display for SignalFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalFailure::TimedOut { seen, expected } => {
                write!(f, "timed out after {} of {} load(s)", seen, expected)
            }
            SignalFailure::LoadFailed => write!(f, "load completed unsuccessfully"),
        }
    }
}

/// An observable "data finished loading" event.
#[async_trait]
pub trait DataLoadSignal: Send + Sync {
    /// Name used in errors and logs, typically the URL pattern.
    fn label(&self) -> &str;

    /// Starts counting from now; `wait` returns after `expected` more loads.
    fn arm(&self, expected: u64);

    /// Waits for the armed loads. The last of them must have succeeded.
    async fn wait(&self, timeout: Duration) -> std::result::Result<(), SignalFailure>;
}

#[derive(Debug, Clone, Copy, Default)]
struct LoadState {
    completed: u64,
    last_ok: bool,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    baseline: u64,
    expected: u64,
}

/// A `DataLoadSignal` fed by explicit `notify_*` calls.
///
/// Clones share state, so one clone can be handed to a network hook while
/// another is passed to the widget driver.
#[derive(Clone)]
pub struct CountingSignal {
    label: Arc<str>,
    state: Arc<watch::Sender<LoadState>>,
    armed: Arc<Mutex<Armed>>,
}

impl CountingSignal {
    pub fn new(label: impl Into<String>) -> Self {
        let (state, _) = watch::channel(LoadState::default());
        Self {
            label: Arc::from(label.into()),
            state: Arc::new(state),
            armed: Arc::new(Mutex::new(Armed {
                baseline: 0,
                expected: 1,
            })),
        }
    }

    pub fn notify_success(&self) {
        self.notify(true);
    }

    pub fn notify_failure(&self) {
        self.notify(false);
    }

    pub fn notify(&self, ok: bool) {
        self.state.send_modify(|s| {
            s.completed += 1;
            s.last_ok = ok;
        });
        tracing::trace!(signal = %self.label, ok, "data load completed");
    }

    /// Total loads observed since creation.
    pub fn completed(&self) -> u64 {
        self.state.borrow().completed
    }
}

impl std::fmt::Debug for CountingSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountingSignal")
            .field("label", &self.label)
            .field("completed", &self.completed())
            .finish()
    }
}

#[async_trait]
impl DataLoadSignal for CountingSignal {
    fn label(&self) -> &str {
        &self.label
    }

    fn arm(&self, expected: u64) {
        let baseline = self.completed();
        *self.armed.lock() = Armed { baseline, expected };
    }

    async fn wait(&self, timeout: Duration) -> std::result::Result<(), SignalFailure> {
        let armed = *self.armed.lock();
        let target = armed.baseline + armed.expected;
        let mut rx = self.state.subscribe();

        let reached = tokio::time::timeout(timeout, rx.wait_for(|s| s.completed >= target)).await;
        match reached {
            Ok(Ok(state)) if state.last_ok => Ok(()),
            Ok(Ok(_)) => Err(SignalFailure::LoadFailed),
            // The sender lives in `self`, so the channel cannot close while waiting
            Ok(Err(_)) | Err(_) => Err(SignalFailure::TimedOut {
                seen: self.completed().saturating_sub(armed.baseline),
                expected: armed.expected,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_after_arming() {
        let signal = CountingSignal::new("**/gen/find-many");
        signal.notify_success();
        signal.arm(1);

        let notifier = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            notifier.notify_success();
        });

        assert!(signal.wait(Duration::from_secs(2)).await.is_ok());
        assert_eq!(signal.completed(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loads_before_arming_do_not_count() {
        let signal = CountingSignal::new("**/user/find-many");
        signal.notify_success();
        signal.arm(1);

        let err = signal.wait(Duration::from_secs(1)).await.unwrap_err();
        assert_eq!(
            err,
            SignalFailure::TimedOut {
                seen: 0,
                expected: 1
            }
        );
    }

    #[tokio::test]
    async fn test_failed_load_is_reported() {
        let signal = CountingSignal::new("**/gen/find-many");
        signal.arm(1);
        signal.notify_failure();
        assert_eq!(
            signal.wait(Duration::from_secs(1)).await.unwrap_err(),
            SignalFailure::LoadFailed
        );
    }

    #[tokio::test]
    async fn test_waits_for_expected_count() {
        let signal = CountingSignal::new("**/gen/find-many");
        signal.arm(2);
        signal.notify_success();
        signal.notify_success();
        assert!(signal.wait(Duration::from_millis(50)).await.is_ok());
    }
}
