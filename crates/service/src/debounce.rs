//! Rebuild debouncer - coalesces bursts of store mutations into one delayed rebuild
//!
//! The debouncer is either idle or pending. The first notification moves it
//! to pending and spawns a single task that waits out the quiet period and
//! then runs the rebuild once. Notifications that arrive while pending are
//! absorbed. When the rebuild finishes, successfully or not, the state goes
//! back to idle and the next notification schedules a fresh attempt.

use crate::remote_index::RemoteIndex;
use crate::Result;
use ontograph_store::{Mutation, MutationListener};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// The expensive action being debounced
pub trait RebuildTrigger: Send + Sync + 'static {
    fn rebuild(&self) -> impl Future<Output = Result<()>> + Send;
}

impl<T: RebuildTrigger> RebuildTrigger for Arc<T> {
    fn rebuild(&self) -> impl Future<Output = Result<()>> + Send {
        (**self).rebuild()
    }
}

impl RebuildTrigger for RemoteIndex {
    async fn rebuild(&self) -> Result<()> {
        let ack = self.try_build().await?;
        info!("Remote index rebuild acknowledged: {}", ack);
        Ok(())
    }
}

/// Debounces rebuild requests. Cloning yields another handle to the same state.
pub struct RebuildDebouncer<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    trigger: T,
    quiet_period: Duration,
    pending: AtomicBool,
    completed: AtomicUsize,
    idle: Notify,
    runtime: Handle,
}

impl<T> Clone for RebuildDebouncer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: RebuildTrigger> RebuildDebouncer<T> {
    /// Create a debouncer that spawns its timer on the current tokio runtime
    pub fn new(trigger: T, quiet_period: Duration) -> Result<Self> {
        Ok(Self::with_handle(trigger, quiet_period, Handle::try_current()?))
    }

    /// Create a debouncer that spawns its timer on `runtime`
    pub fn with_handle(trigger: T, quiet_period: Duration, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(Inner {
                trigger,
                quiet_period,
                pending: AtomicBool::new(false),
                completed: AtomicUsize::new(0),
                idle: Notify::new(),
                runtime,
            }),
        }
    }

    /// Signal that the document store changed. Never blocks.
    ///
    /// Returns `true` when this call scheduled a rebuild, `false` when one was
    /// already pending.
    pub fn notify(&self) -> bool {
        if self
            .inner
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Rebuild already pending, coalescing");
            return false;
        }

        let inner = Arc::clone(&self.inner);
        debug!("Rebuild scheduled in {:?}", inner.quiet_period);
        self.inner.runtime.spawn(async move {
            let _idle = IdleOnDrop(&inner);
            tokio::time::sleep(inner.quiet_period).await;
            match inner.trigger.rebuild().await {
                Ok(()) => debug!("Rebuild finished"),
                Err(e) => warn!("Rebuild failed: {}", e),
            }
            inner.completed.fetch_add(1, Ordering::AcqRel);
        });
        true
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Number of rebuild attempts that have run, including failed ones
    pub fn completed(&self) -> usize {
        self.inner.completed.load(Ordering::Acquire)
    }

    pub fn quiet_period(&self) -> Duration {
        self.inner.quiet_period
    }

    /// Wait until no rebuild is pending
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.is_pending() {
                return;
            }
            notified.await;
        }
    }
}

/// Returns the debouncer to idle when the rebuild task ends, even if it panicked
struct IdleOnDrop<'a, T>(&'a Inner<T>);

impl<T> Drop for IdleOnDrop<'_, T> {
    fn drop(&mut self) {
        self.0.pending.store(false, Ordering::Release);
        self.0.idle.notify_waiters();
    }
}

impl<T: RebuildTrigger> MutationListener for RebuildDebouncer<T> {
    fn on_mutation(&self, mutation: Mutation) {
        debug!("Store mutation: {:?}", mutation);
        self.notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceError;

    #[derive(Default)]
    struct CountingTrigger {
        calls: AtomicUsize,
        fail: bool,
    }

    impl RebuildTrigger for CountingTrigger {
        async fn rebuild(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ServiceError::RemoteUnavailable)
            } else {
                Ok(())
            }
        }
    }

    const QUIET: Duration = Duration::from_secs(3);

    #[tokio::test(start_paused = true)]
    async fn test_burst_triggers_once() {
        let trigger = Arc::new(CountingTrigger::default());
        let debouncer = RebuildDebouncer::new(trigger.clone(), QUIET).unwrap();

        assert!(debouncer.notify());
        for _ in 0..20 {
            assert!(!debouncer.notify());
        }
        assert!(debouncer.is_pending());

        debouncer.wait_idle().await;
        assert_eq!(trigger.calls.load(Ordering::SeqCst), 1);
        assert_eq!(debouncer.completed(), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_waits_for_quiet_period() {
        let trigger = Arc::new(CountingTrigger::default());
        let debouncer = RebuildDebouncer::new(trigger.clone(), QUIET).unwrap();

        debouncer.notify();
        tokio::time::sleep(QUIET / 2).await;
        assert_eq!(trigger.calls.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        debouncer.wait_idle().await;
        assert_eq!(trigger.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_window_schedules_again() {
        let trigger = Arc::new(CountingTrigger::default());
        let debouncer = RebuildDebouncer::new(trigger.clone(), QUIET).unwrap();

        debouncer.notify();
        debouncer.wait_idle().await;
        assert!(debouncer.notify());
        debouncer.notify();
        debouncer.wait_idle().await;

        assert_eq!(trigger.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_wedge_the_debouncer() {
        let trigger = Arc::new(CountingTrigger {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let debouncer = RebuildDebouncer::new(trigger.clone(), QUIET).unwrap();

        debouncer.notify();
        debouncer.wait_idle().await;
        assert!(!debouncer.is_pending());
        assert!(debouncer.notify());
        debouncer.wait_idle().await;

        assert_eq!(trigger.calls.load(Ordering::SeqCst), 2);
        assert_eq!(debouncer.completed(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_mutations_feed_the_debouncer() {
        let trigger = Arc::new(CountingTrigger::default());
        let debouncer = RebuildDebouncer::new(trigger.clone(), QUIET).unwrap();

        for id in 0..5 {
            debouncer.on_mutation(Mutation::Saved(id));
        }
        debouncer.on_mutation(Mutation::Deleted(1));
        debouncer.wait_idle().await;

        assert_eq!(trigger.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_requires_a_runtime() {
        let result = RebuildDebouncer::new(CountingTrigger::default(), QUIET);
        assert!(matches!(result, Err(ServiceError::NoRuntime(_))));
    }

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_when_idle() {
        let debouncer = RebuildDebouncer::new(CountingTrigger::default(), QUIET).unwrap();
        debouncer.wait_idle().await;
        assert_eq!(debouncer.completed(), 0);
    }
}
