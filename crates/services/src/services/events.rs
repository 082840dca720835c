//! Change fan-out. Every mutation publishes a typed event carrying the
//! changed row's id; subscribers patch or reload as they see fit instead of
//! diffing whole tables.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tokio::sync::broadcast;
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Topic {
    WorkOrders,
    RouteItems,
    Tasks,
    Notifications,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ChangeEvent {
    pub topic: Topic,
    pub op: ChangeOp,
    pub entity_id: Uuid,
    /// Set for per-user topics (notifications); the feed delivers those only
    /// to the affected user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// A send with no live subscribers returns an error; the event is just
    /// dropped in that case.
    pub fn publish(&self, event: ChangeEvent) {
        tracing::debug!(topic = %event.topic, op = %event.op, entity_id = %event.entity_id, "change event");
        let _ = self.tx.send(event);
    }

    pub fn publish_change(&self, topic: Topic, op: ChangeOp, entity_id: Uuid) {
        self.publish(ChangeEvent {
            topic,
            op,
            entity_id,
            user_id: None,
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}
