//! WebSocket change feed. Clients subscribe to topics and receive a typed
//! `ChangeEvent` for every mutation, carrying the changed row id so they can
//! patch their local state instead of reloading whole tables.

use std::collections::HashSet;

use axum::{
    Router,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::header::AUTHORIZATION,
    http::HeaderMap,
    response::Response,
    routing::get,
};
use db::models::profile::Profile;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use services::services::{
    auth::Actor,
    events::{ChangeEvent, Topic},
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Browser WebSocket clients cannot set headers; they pass the token here.
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Subscribe { topics: Vec<Topic> },
    Unsubscribe { topics: Vec<Topic> },
}

/// GET /api/events/ws
pub async fn ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .ok_or(ApiError::Unauthorized)?;

    let claims = state
        .auth
        .verify_token(&token)
        .map_err(|_| ApiError::Unauthorized)?;
    let profile = Profile::find_by_id(&state.db.pool, claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    if !profile.active {
        return Err(ApiError::Unauthorized);
    }
    let actor = Actor {
        id: profile.id,
        role: profile.role,
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, actor)))
}

async fn handle_socket(socket: WebSocket, state: AppState, actor: Actor) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.events.subscribe();
    let mut topics: HashSet<Topic> = HashSet::new();

    debug!(user_id = %actor.id, "event socket opened");

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(message) => apply_subscription(&mut topics, message),
                            Err(err) => {
                                debug!(user_id = %actor.id, %err, "ignoring malformed subscribe message");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(user_id = %actor.id, %err, "event socket read error");
                        break;
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if !wants(&topics, &actor, &event) {
                            continue;
                        }
                        let Ok(payload) = serde_json::to_string(&event) else {
                            continue;
                        };
                        if sender.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(user_id = %actor.id, missed, "event socket lagged, dropping events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    debug!(user_id = %actor.id, "event socket closed");
}

/// Membership in the set is the whole subscription state, so subscribing to
/// a topic twice cannot double-deliver.
fn apply_subscription(topics: &mut HashSet<Topic>, message: ClientMessage) {
    match message {
        ClientMessage::Subscribe { topics: wanted } => topics.extend(wanted),
        ClientMessage::Unsubscribe { topics: unwanted } => {
            for topic in unwanted {
                topics.remove(&topic);
            }
        }
    }
}

/// Notifications are per-user; everything else is tenant-wide.
fn wants(topics: &HashSet<Topic>, actor: &Actor, event: &ChangeEvent) -> bool {
    if !topics.contains(&event.topic) {
        return false;
    }
    match event.topic {
        Topic::Notifications => event.user_id == Some(actor.id),
        _ => true,
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/events/ws", get(ws_handler))
}

#[cfg(test)]
mod tests {
    use db::models::profile::UserRole;
    use services::services::events::ChangeOp;
    use uuid::Uuid;

    use super::*;

    fn actor() -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role: UserRole::Technician,
        }
    }

    fn event(topic: Topic, user_id: Option<Uuid>) -> ChangeEvent {
        ChangeEvent {
            topic,
            op: ChangeOp::Insert,
            entity_id: Uuid::new_v4(),
            user_id,
        }
    }

    #[test]
    fn duplicate_subscriptions_are_idempotent() {
        let mut topics = HashSet::new();
        apply_subscription(
            &mut topics,
            ClientMessage::Subscribe {
                topics: vec![Topic::WorkOrders, Topic::Tasks],
            },
        );
        apply_subscription(
            &mut topics,
            ClientMessage::Subscribe {
                topics: vec![Topic::WorkOrders],
            },
        );
        assert_eq!(topics.len(), 2);

        apply_subscription(
            &mut topics,
            ClientMessage::Unsubscribe {
                topics: vec![Topic::WorkOrders],
            },
        );
        assert!(!topics.contains(&Topic::WorkOrders));
        assert!(topics.contains(&Topic::Tasks));
    }

    #[test]
    fn unsubscribed_topics_are_filtered_out() {
        let mut topics = HashSet::new();
        topics.insert(Topic::Tasks);
        let me = actor();
        assert!(wants(&topics, &me, &event(Topic::Tasks, None)));
        assert!(!wants(&topics, &me, &event(Topic::WorkOrders, None)));
    }

    #[test]
    fn notification_events_only_reach_their_user() {
        let mut topics = HashSet::new();
        topics.insert(Topic::Notifications);
        let me = actor();
        assert!(wants(&topics, &me, &event(Topic::Notifications, Some(me.id))));
        assert!(!wants(
            &topics,
            &me,
            &event(Topic::Notifications, Some(Uuid::new_v4()))
        ));
        assert!(!wants(&topics, &me, &event(Topic::Notifications, None)));
    }

    #[test]
    fn subscribe_messages_parse_from_wire_form() {
        let parsed: ClientMessage =
            serde_json::from_str(r#"{"type":"subscribe","topics":["work_orders","tasks"]}"#)
                .unwrap();
        let mut topics = HashSet::new();
        apply_subscription(&mut topics, parsed);
        assert!(topics.contains(&Topic::WorkOrders));
        assert!(topics.contains(&Topic::Tasks));
    }
}
