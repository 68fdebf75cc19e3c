//! Subscription hub: the set of live subscriber sinks and fan-out to them.
//!
//! Each subscriber is an [`mpsc::Sender`] of pre-serialized frames. The
//! owning connection task drains the matching receiver and writes frames
//! to its socket. A message is serialized once per broadcast and shared
//! between subscribers as a [`Frame`].
//!
//! # Failure isolation
//!
//! A broadcast pass delivers to every subscriber concurrently, each with
//! its own timeout. A subscriber whose sink is closed or stays full past
//! the timeout is removed after the pass completes. Nothing about that
//! failure reaches the other subscribers or the broadcaster's caller
//! beyond the [`BroadcastReport`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use resilience_core::config::BroadcastConfig;
use resilience_types::{ServerMessage, SubscriberId};
use tokio::sync::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::{debug, info, warn};

/// One serialized outbound message, shared by every recipient.
pub type Frame = Arc<str>;

/// Why a single delivery failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryFailure {
    /// The subscriber's receiver is gone.
    #[error("subscriber channel closed")]
    Closed,

    /// The subscriber did not accept the frame within the delivery timeout.
    #[error("subscriber delivery timed out")]
    TimedOut,
}

/// Errors returned by [`SubscriptionHub`] operations.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The configured subscriber limit has been reached.
    #[error("subscriber limit of {max} reached")]
    CapacityExceeded {
        /// The configured limit.
        max: usize,
    },

    /// The initial message could not be delivered to a new subscriber.
    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryFailure),

    /// A message could not be serialized.
    #[error("failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Outcome of one broadcast pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Subscribers in the pass snapshot.
    pub attempted: usize,
    /// Subscribers that accepted the frame.
    pub delivered: usize,
    /// Subscribers removed after the pass, with the reason.
    pub removed: Vec<(SubscriberId, DeliveryFailure)>,
}

/// Owns the subscriber set.
#[derive(Debug)]
pub struct SubscriptionHub {
    subscribers: RwLock<BTreeMap<SubscriberId, mpsc::Sender<Frame>>>,
    max_subscribers: Option<usize>,
    delivery_timeout: Duration,
}

impl SubscriptionHub {
    /// Create an empty hub.
    ///
    /// `max_subscribers` of `None` means unlimited.
    pub fn new(max_subscribers: Option<usize>, delivery_timeout: Duration) -> Self {
        Self {
            subscribers: RwLock::new(BTreeMap::new()),
            max_subscribers,
            delivery_timeout,
        }
    }

    /// Create a hub from the `broadcast` config section.
    pub fn from_config(config: &BroadcastConfig) -> Self {
        Self::new(config.subscriber_limit(), config.delivery_timeout())
    }

    /// Admit a subscriber and deliver `initial` to it.
    ///
    /// The initial frame is queued on the sink before the subscriber
    /// becomes visible to broadcasts, so it always arrives first.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::CapacityExceeded`] when the hub is full,
    /// [`HubError::Serialization`] if `initial` cannot be encoded, and
    /// [`HubError::Delivery`] if the sink rejects the initial frame. In
    /// every error case the subscriber is not admitted.
    pub async fn subscribe(
        &self,
        sink: mpsc::Sender<Frame>,
        initial: &ServerMessage,
    ) -> Result<SubscriberId, HubError> {
        let frame = encode(initial)?;
        let mut subscribers = self.subscribers.write().await;
        if let Some(max) = self.max_subscribers {
            if subscribers.len() >= max {
                return Err(HubError::CapacityExceeded { max });
            }
        }
        deliver(&sink, frame, self.delivery_timeout).await?;

        let id = SubscriberId::new();
        subscribers.insert(id, sink);
        info!(subscriber = %id, total = subscribers.len(), "Subscriber connected");
        Ok(id)
    }

    /// Remove a subscriber. Returns whether it was present.
    ///
    /// Removing an unknown or already-removed subscriber is a no-op.
    pub async fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.write().await;
        let removed = subscribers.remove(&id).is_some();
        if removed {
            info!(subscriber = %id, total = subscribers.len(), "Subscriber disconnected");
        }
        removed
    }

    /// Number of live subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Whether `id` is currently subscribed.
    pub async fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.read().await.contains_key(&id)
    }

    /// Serialize `message` once and deliver it to every subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Serialization`] if `message` cannot be
    /// encoded. Per-subscriber failures are reported, not returned.
    pub async fn broadcast(&self, message: &ServerMessage) -> Result<BroadcastReport, HubError> {
        let frame = encode(message)?;
        Ok(self.broadcast_frame(frame, message.kind()).await)
    }

    /// Deliver an already-encoded frame to every subscriber.
    ///
    /// The recipient list is fixed when the pass starts; subscribers
    /// admitted during the pass get the next one.
    async fn broadcast_frame(&self, frame: Frame, kind: &'static str) -> BroadcastReport {
        let targets: Vec<(SubscriberId, mpsc::Sender<Frame>)> = {
            let subscribers = self.subscribers.read().await;
            subscribers
                .iter()
                .map(|(id, sink)| (*id, sink.clone()))
                .collect()
        };
        if targets.is_empty() {
            return BroadcastReport::default();
        }

        let timeout = self.delivery_timeout;
        let outcomes = join_all(targets.into_iter().map(|(id, sink)| {
            let frame = Arc::clone(&frame);
            async move { (id, deliver(&sink, frame, timeout).await) }
        }))
        .await;

        let mut report = BroadcastReport {
            attempted: outcomes.len(),
            ..BroadcastReport::default()
        };
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(failure) => {
                    warn!(subscriber = %id, %failure, "Dropping subscriber after failed delivery");
                    report.removed.push((id, failure));
                }
            }
        }

        if !report.removed.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for (id, _) in &report.removed {
                subscribers.remove(id);
            }
        }

        debug!(
            kind,
            attempted = report.attempted,
            delivered = report.delivered,
            removed = report.removed.len(),
            "Broadcast pass complete"
        );
        report
    }

    /// Drop every subscriber sink. Connection tasks see their receiver
    /// close and exit. Returns how many were closed.
    pub async fn close_all(&self) -> usize {
        let mut subscribers = self.subscribers.write().await;
        let closed = subscribers.len();
        subscribers.clear();
        info!(closed, "All subscribers closed");
        closed
    }
}

fn encode(message: &ServerMessage) -> Result<Frame, HubError> {
    Ok(Arc::from(serde_json::to_string(message)?))
}

async fn deliver(
    sink: &mpsc::Sender<Frame>,
    frame: Frame,
    timeout: Duration,
) -> Result<(), DeliveryFailure> {
    sink.send_timeout(frame, timeout).await.map_err(|e| match e {
        SendTimeoutError::Closed(_) => DeliveryFailure::Closed,
        SendTimeoutError::Timeout(_) => DeliveryFailure::TimedOut,
    })
}
