//! Background side effects of the lifecycle
//!
//! History appends and block creation run as spawned tasks so they never
//! delay or fail the request that triggered them. Failures are handed to a
//! [`SideEffectSink`].

use og_shared::phone::mask_phone_number;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Notify};
use tracing::error;

use crate::store::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffectKind {
    HistoryAppend,
    Block,
}

impl SideEffectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SideEffectKind::HistoryAppend => "history_append",
            SideEffectKind::Block => "block",
        }
    }
}

/// A background effect that did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffectFailure {
    pub kind: SideEffectKind,
    pub identity: String,
    pub error: StoreError,
}

/// Receiver of background failures
pub trait SideEffectSink: Send + Sync {
    fn report(&self, failure: SideEffectFailure);
}

/// Logs failures as error events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl SideEffectSink for TracingSink {
    fn report(&self, failure: SideEffectFailure) {
        error!(
            phone = %mask_phone_number(&failure.identity),
            effect = failure.kind.as_str(),
            error = %failure.error,
            event = "side_effect_failed",
            "Background side effect failed"
        );
    }
}

/// Forwards failures to an mpsc channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<SideEffectFailure>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SideEffectFailure>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl SideEffectSink for ChannelSink {
    fn report(&self, failure: SideEffectFailure) {
        // Receiver gone means nobody is listening any more
        let _ = self.sender.send(failure);
    }
}

#[derive(Default)]
struct Pending {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrements the pending count even if the task panics
struct PendingGuard(Arc<Pending>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Spawner for fire-and-forget store effects
///
/// Effects run on the bound runtime when one is set, otherwise on the
/// runtime of the calling task.
pub struct SideEffects {
    sink: Arc<dyn SideEffectSink>,
    pending: Arc<Pending>,
    runtime: Option<Handle>,
}

impl SideEffects {
    pub fn new(sink: Arc<dyn SideEffectSink>) -> Self {
        Self {
            sink,
            pending: Arc::new(Pending::default()),
            runtime: None,
        }
    }

    /// Run every effect on `runtime`, so effects survive the runtime that triggered them
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub(super) fn set_sink(&mut self, sink: Arc<dyn SideEffectSink>) {
        self.sink = sink;
    }

    /// Run `effect` in the background, reporting an error to the sink
    pub fn spawn<F>(&self, kind: SideEffectKind, identity: &str, effect: F)
    where
        F: Future<Output = StoreResult<()>> + Send + 'static,
    {
        self.pending.count.fetch_add(1, Ordering::AcqRel);
        let guard = PendingGuard(self.pending.clone());
        let sink = self.sink.clone();
        let identity = identity.to_string();

        let task = async move {
            let _guard = guard;
            if let Err(error) = effect.await {
                sink.report(SideEffectFailure {
                    kind,
                    identity,
                    error,
                });
            }
        };
        match &self.runtime {
            Some(runtime) => drop(runtime.spawn(task)),
            None => drop(tokio::spawn(task)),
        }
    }

    /// Effects spawned and not yet finished
    pub fn pending(&self) -> usize {
        self.pending.count.load(Ordering::Acquire)
    }

    /// Wait until every spawned effect has finished
    pub async fn drain(&self) {
        loop {
            let idle = self.pending.idle.notified();
            if self.pending() == 0 {
                return;
            }
            idle.await;
        }
    }
}

impl Default for SideEffects {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_waits_for_effects() {
        let effects = SideEffects::default();
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let done = done.clone();
            effects.spawn(SideEffectKind::HistoryAppend, "id", async move {
                tokio::task::yield_now().await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        effects.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(effects.pending(), 0);
    }

    #[tokio::test]
    async fn test_failures_reach_the_sink() {
        let (sink, mut receiver) = ChannelSink::new();
        let effects = SideEffects::new(Arc::new(sink));

        effects.spawn(SideEffectKind::Block, "+15550100", async {
            Err(StoreError::Backend("connection reset".into()))
        });
        effects.drain().await;

        let failure = receiver.try_recv().unwrap();
        assert_eq!(failure.kind, SideEffectKind::Block);
        assert_eq!(failure.identity, "+15550100");
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_effects_outlive_the_spawning_runtime() {
        let effects = Arc::new(SideEffects::default().with_runtime(Handle::current()));
        let done = Arc::new(AtomicUsize::new(0));

        let (spawner, counter) = (effects.clone(), done.clone());
        std::thread::spawn(move || {
            let worker = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            worker.block_on(async move {
                spawner.spawn(SideEffectKind::Block, "id", async move {
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
            });
            // The worker runtime shuts down here
        })
        .join()
        .unwrap();

        effects.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drain_with_nothing_pending() {
        SideEffects::default().drain().await;
    }
}
