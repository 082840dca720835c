use db::models::notification::Notification;
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use super::events::{ChangeEvent, ChangeOp, EventHub, Topic};

#[derive(Clone)]
pub struct NotificationService {
    pool: SqlitePool,
    hub: EventHub,
}

impl NotificationService {
    pub fn new(pool: SqlitePool, hub: EventHub) -> Self {
        Self { pool, hub }
    }

    /// Store a notification and push it onto the change feed for its user.
    pub async fn notify(
        &self,
        user_id: Uuid,
        kind: &str,
        title: &str,
        body: &str,
        entity_id: Option<Uuid>,
    ) -> Result<Notification, sqlx::Error> {
        let notification =
            Notification::create(&self.pool, user_id, kind, title, body, entity_id).await?;
        self.hub.publish(ChangeEvent {
            topic: Topic::Notifications,
            op: ChangeOp::Insert,
            entity_id: notification.id,
            user_id: Some(user_id),
        });
        Ok(notification)
    }

    /// Best-effort variant for fan-out inside larger operations: a failed
    /// notification is logged, never propagated.
    pub async fn try_notify(
        &self,
        user_id: Uuid,
        kind: &str,
        title: &str,
        body: &str,
        entity_id: Option<Uuid>,
    ) {
        if let Err(error) = self.notify(user_id, kind, title, body, entity_id).await {
            warn!(%user_id, kind, %error, "failed to deliver notification");
        }
    }

    pub async fn recent_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>, sqlx::Error> {
        Notification::find_recent_for_user(&self.pool, user_id, 50).await
    }

    pub async fn mark_read(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let updated = Notification::mark_read(&self.pool, id, user_id).await?;
        if let Some(notification) = &updated {
            self.hub.publish(ChangeEvent {
                topic: Topic::Notifications,
                op: ChangeOp::Update,
                entity_id: notification.id,
                user_id: Some(user_id),
            });
        }
        Ok(updated)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let changed = Notification::mark_all_read(&self.pool, user_id).await?;
        if changed > 0 {
            self.hub.publish(ChangeEvent {
                topic: Topic::Notifications,
                op: ChangeOp::Update,
                entity_id: user_id,
                user_id: Some(user_id),
            });
        }
        Ok(changed)
    }
}
