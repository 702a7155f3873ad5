use crate::types::ServerMessage;
use async_trait::async_trait;
use catalog_common::IndexSnapshot;
use catalog_indexing::SnapshotSink;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    #[error("subscriber has disconnected")]
    Closed,
}

/// Receiving half of one subscriber's update slot
pub type UpdateReceiver = watch::Receiver<Option<Arc<str>>>;

/// Sending half of one subscriber's update slot.
///
/// The slot holds only the newest update. A subscriber that falls behind skips
/// the superseded snapshots and always ends on the latest one; the updates it
/// does see arrive in publish order. Messages are pre-serialized so one
/// publish is shared by every subscriber.
#[derive(Debug, Clone)]
pub struct SubscriberChannel {
    sender: Arc<watch::Sender<Option<Arc<str>>>>,
}

impl SubscriberChannel {
    pub fn new() -> (Self, UpdateReceiver) {
        let (sender, receiver) = watch::channel(None);
        (
            Self {
                sender: Arc::new(sender),
            },
            receiver,
        )
    }

    /// Replace any update the subscriber has not picked up yet
    pub fn deliver(&self, message: Arc<str>) -> Result<(), DeliveryFailure> {
        self.sender
            .send(Some(message))
            .map_err(|_| DeliveryFailure::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Wait for the next update, skipping any that were superseded meanwhile.
/// `None` once the broadcaster side is gone.
pub async fn next_update(updates: &mut UpdateReceiver) -> Option<Arc<str>> {
    loop {
        updates.changed().await.ok()?;
        if let Some(message) = updates.borrow_and_update().clone() {
            return Some(message);
        }
    }
}

/// Outcome of one publish across all subscribers
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: Vec<(SubscriberId, DeliveryFailure)>,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed.len()
    }
}

/// Fan-out of snapshot updates to live subscribers
#[derive(Debug, Default)]
pub struct Broadcaster {
    subscribers: RwLock<HashMap<SubscriberId, SubscriberChannel>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, channel: SubscriberChannel) -> SubscriberId {
        let id = SubscriberId::new();
        let mut subscribers = self.subscribers.write().await;
        subscribers.insert(id, channel);
        info!(subscriber = %id, total = subscribers.len(), "Subscriber registered");
        id
    }

    pub async fn unregister(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.write().await;
        let removed = subscribers.remove(&id).is_some();
        if removed {
            info!(subscriber = %id, total = subscribers.len(), "Subscriber unregistered");
        }
        removed
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Serialize once and offer the message to every subscriber.
    ///
    /// Failures are reported, never raised. A subscriber stays registered
    /// after a failed delivery; it leaves when its connection ends.
    pub async fn publish(&self, snapshot: &IndexSnapshot) -> DeliveryReport {
        let message: Arc<str> = match serde_json::to_string(&ServerMessage::Update(snapshot)) {
            Ok(json) => json.into(),
            Err(e) => {
                error!(error = %e, "Failed to serialize snapshot update");
                return DeliveryReport::default();
            }
        };

        let subscribers = self.subscribers.read().await;
        let mut report = DeliveryReport::default();
        for (id, channel) in subscribers.iter() {
            match channel.deliver(Arc::clone(&message)) {
                Ok(()) => report.delivered += 1,
                Err(failure) => {
                    warn!(subscriber = %id, %failure, "Delivery failed");
                    report.failed.push((*id, failure));
                }
            }
        }
        debug!(
            entries = snapshot.len(),
            delivered = report.delivered,
            failed = report.failed.len(),
            "Published snapshot update"
        );
        report
    }
}

#[async_trait]
impl SnapshotSink for Broadcaster {
    async fn snapshot_changed(&self, snapshot: IndexSnapshot) {
        let report = self.publish(&snapshot).await;
        info!(
            entries = snapshot.len(),
            delivered = report.delivered,
            failed = report.failed.len(),
            "Broadcast snapshot"
        );
    }
}
