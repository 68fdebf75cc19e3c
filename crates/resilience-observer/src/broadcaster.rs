//! Broadcast scheduler: periodic `agent_status_batch` fan-out.
//!
//! One background task fires at a fixed interval. Ticks run one at a
//! time inside that task; a tick that comes due while the previous one is
//! still running is skipped ([`MissedTickBehavior::Skip`]), never queued
//! and never run concurrently.

use std::sync::Arc;
use std::time::Duration;

use resilience_core::orchestrator::SwarmOrchestrator;
use resilience_types::ServerMessage;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::hub::{BroadcastReport, HubError, SubscriptionHub};

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No subscribers; no snapshot was built.
    Skipped,
    /// A batch was broadcast.
    Broadcast(BroadcastReport),
}

/// Run one scheduler tick.
///
/// With zero subscribers this returns [`TickOutcome::Skipped`] without
/// touching the registry.
///
/// # Errors
///
/// Returns [`HubError::Serialization`] if the batch cannot be encoded.
pub async fn run_tick(
    orchestrator: &SwarmOrchestrator,
    hub: &SubscriptionHub,
) -> Result<TickOutcome, HubError> {
    if hub.subscriber_count().await == 0 {
        return Ok(TickOutcome::Skipped);
    }
    let snapshot = orchestrator.snapshot().await;
    let report = hub.broadcast(&ServerMessage::status_batch(snapshot)).await?;
    Ok(TickOutcome::Broadcast(report))
}

/// Handle to the running scheduler task.
///
/// Owned by the process entry point, which calls
/// [`shutdown`](Self::shutdown) to cancel and join it.
#[derive(Debug)]
pub struct BroadcastScheduler {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl BroadcastScheduler {
    /// Spawn the scheduler on the current runtime.
    ///
    /// The first tick fires immediately. The task stops when `cancel` is
    /// cancelled, including mid-tick.
    pub fn spawn(
        orchestrator: Arc<SwarmOrchestrator>,
        hub: Arc<SubscriptionHub>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            run(orchestrator, hub, interval, task_cancel).await;
        });
        info!(interval = ?interval, "Broadcast scheduler started");
        Self { cancel, handle }
    }

    /// Cancel the scheduler and wait for its task to exit.
    ///
    /// # Errors
    ///
    /// Returns the [`JoinError`] if the task panicked.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        self.cancel.cancel();
        self.handle.await?;
        info!("Broadcast scheduler stopped");
        Ok(())
    }
}

async fn run(
    orchestrator: Arc<SwarmOrchestrator>,
    hub: Arc<SubscriptionHub>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            outcome = run_tick(&orchestrator, &hub) => match outcome {
                Ok(TickOutcome::Skipped) => debug!("No subscribers, tick skipped"),
                Ok(TickOutcome::Broadcast(report)) => debug!(
                    delivered = report.delivered,
                    removed = report.removed.len(),
                    "Status batch sent"
                ),
                Err(e) => error!(error = %e, "Broadcast tick failed"),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use resilience_core::config::ResilienceConfig;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    use super::*;
    use crate::hub::Frame;

    fn orchestrator() -> Arc<SwarmOrchestrator> {
        Arc::new(SwarmOrchestrator::from_config(&ResilienceConfig::default()).unwrap())
    }

    fn hub() -> Arc<SubscriptionHub> {
        Arc::new(SubscriptionHub::new(None, Duration::from_millis(50)))
    }

    fn message_type(frame: &str) -> String {
        let value: serde_json::Value = serde_json::from_str(frame).unwrap();
        value["type"].as_str().unwrap().to_owned()
    }

    /// Count the status batches queued on `rx` right now.
    fn drain_batches(rx: &mut mpsc::Receiver<Frame>) -> usize {
        let mut batches = 0;
        while let Ok(frame) = rx.try_recv() {
            if message_type(&frame) == "agent_status_batch" {
                batches += 1;
            }
        }
        batches
    }

    #[tokio::test]
    async fn tick_without_subscribers_is_skipped() {
        let outcome = run_tick(&orchestrator(), &hub()).await.unwrap();
        assert_eq!(outcome, TickOutcome::Skipped);
    }

    #[tokio::test]
    async fn tick_with_subscribers_sends_a_batch() {
        let orch = orchestrator();
        let hub = hub();
        let (tx, mut rx) = mpsc::channel(4);
        hub.subscribe(tx, &ServerMessage::system("hello")).await.unwrap();

        let outcome = run_tick(&orch, &hub).await.unwrap();
        assert!(matches!(outcome, TickOutcome::Broadcast(ref r) if r.delivered == 1));

        let _initial = rx.recv().await;
        let batch = rx.recv().await.unwrap();
        assert_eq!(message_type(&batch), "agent_status_batch");
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_keeps_ticking_and_shuts_down() {
        let orch = orchestrator();
        let hub = hub();
        let (tx, mut rx) = mpsc::channel(8);
        hub.subscribe(tx, &ServerMessage::system("hello")).await.unwrap();

        let scheduler = BroadcastScheduler::spawn(
            Arc::clone(&orch),
            Arc::clone(&hub),
            Duration::from_secs(2),
            CancellationToken::new(),
        );

        let _initial = rx.recv().await;
        for _ in 0..3 {
            let frame = rx.recv().await.unwrap();
            assert_eq!(message_type(&frame), "agent_status_batch");
        }

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_subscriber_does_not_stop_the_scheduler() {
        let orch = orchestrator();
        let hub = hub();
        let (dead_tx, dead_rx) = mpsc::channel(8);
        let (live_tx, mut live_rx) = mpsc::channel(8);
        hub.subscribe(dead_tx, &ServerMessage::system("a")).await.unwrap();
        hub.subscribe(live_tx, &ServerMessage::system("b")).await.unwrap();
        drop(dead_rx);

        let cancel = CancellationToken::new();
        let scheduler = BroadcastScheduler::spawn(
            Arc::clone(&orch),
            Arc::clone(&hub),
            Duration::from_secs(2),
            cancel.clone(),
        );

        let _initial = live_rx.recv().await;
        assert!(live_rx.recv().await.is_some());
        assert_eq!(hub.subscriber_count().await, 1);
        assert!(live_rx.recv().await.is_some());

        cancel.cancel();
        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tick_drops_missed_ticks_instead_of_queueing() {
        let orch = orchestrator();
        // Delivery timeout well past the interval: the first pass holds
        // the scheduler for 5s while ticks at 2s and 4s come due.
        let hub = Arc::new(SubscriptionHub::new(None, Duration::from_secs(5)));

        // The initial frame fills the stuck subscriber's only slot.
        let (stuck_tx, _stuck_rx) = mpsc::channel(1);
        let (live_tx, mut live_rx) = mpsc::channel(32);
        hub.subscribe(stuck_tx, &ServerMessage::system("stuck")).await.unwrap();
        hub.subscribe(live_tx, &ServerMessage::system("live")).await.unwrap();

        let start = Instant::now();
        let scheduler = BroadcastScheduler::spawn(
            Arc::clone(&orch),
            Arc::clone(&hub),
            Duration::from_secs(2),
            CancellationToken::new(),
        );

        // While the first pass waits on the stuck subscriber no other tick
        // runs, so the live subscriber has only the t=0 batch.
        tokio::time::sleep_until(start + Duration::from_millis(4_900)).await;
        assert_eq!(drain_batches(&mut live_rx), 1);
        assert_eq!(hub.subscriber_count().await, 2);

        // The pass ends at 5s and drops the stuck subscriber. The two
        // missed ticks collapse into a single late tick.
        tokio::time::sleep_until(start + Duration::from_millis(5_500)).await;
        assert_eq!(hub.subscriber_count().await, 1);
        assert_eq!(drain_batches(&mut live_rx), 1);

        // The schedule is back on the 2s grid: the next tick is at 6s.
        tokio::time::sleep_until(start + Duration::from_millis(6_500)).await;
        assert_eq!(drain_batches(&mut live_rx), 1);
        tokio::time::sleep_until(start + Duration::from_millis(7_900)).await;
        assert_eq!(drain_batches(&mut live_rx), 0);

        scheduler.shutdown().await.unwrap();
    }
}
