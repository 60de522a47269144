use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use lantern_store::{ChannelStore, policy};
use lantern_types::events::{GatewayCommand, GatewayEvent};

use crate::dispatcher::{Dispatcher, Outbox};

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Handle a single WebSocket connection for its whole lifetime.
///
/// The socket splits into a writer task draining this connection's outbox
/// and a reader task applying client commands; whichever finishes first
/// tears down the other, then the disconnect hook clears the connection
/// from every channel it joined.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher, store: Arc<ChannelStore>) {
    let conn_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<GatewayEvent>();

    info!("connection {} opened", conn_id);

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Writer: forward outbox events to the socket, with heartbeat.
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                event = outbox_rx.recv() => {
                    let Some(event) = event else { break };
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            error!("failed to serialize gateway event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(WsMessage::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(WsMessage::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Reader: parse and apply client commands.
    let dispatcher_recv = dispatcher.clone();
    let outbox_recv = outbox.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                WsMessage::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(cmd) => {
                        handle_command(&dispatcher_recv, &store, conn_id, &outbox_recv, cmd).await;
                    }
                    Err(e) => {
                        warn!(
                            "connection {} bad command: {} -- raw: {}",
                            conn_id,
                            e,
                            &text[..text.len().min(200)]
                        );
                    }
                },
                WsMessage::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                WsMessage::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    dispatcher.remove_connection(conn_id).await;
    info!("connection {} closed", conn_id);
}

/// Apply one client command. Failures on this path are logged and swallowed:
/// the subscription channel never carries error payloads back to the sender.
async fn handle_command(
    dispatcher: &Dispatcher,
    store: &ChannelStore,
    conn_id: Uuid,
    outbox: &Outbox,
    cmd: GatewayCommand,
) {
    match cmd {
        GatewayCommand::Join { channel_id } => {
            info!("connection {} joined {}", conn_id, channel_id);
            dispatcher.join(&channel_id, conn_id, outbox.clone()).await;

            // History replays to the joining connection alone.
            let messages = store.read_all(&channel_id).await;
            let _ = outbox.send(GatewayEvent::History {
                channel_id,
                messages,
            });
        }

        GatewayCommand::Message(submission) => {
            let (channel_id, message) = match policy::normalize(submission) {
                Ok(normalized) => normalized,
                Err(e) => {
                    warn!("connection {} message rejected: {}", conn_id, e);
                    return;
                }
            };
            match store.append(&channel_id, message).await {
                Ok(message) => dispatcher.broadcast_new(&channel_id, message).await,
                Err(e) => error!("failed to persist message for {}: {}", channel_id, e),
            }
        }

        GatewayCommand::Reaction {
            channel_id,
            message_id,
            userid,
            action,
        } => match store.toggle_reaction(&channel_id, &message_id, &userid, action).await {
            Ok(Some(message)) => dispatcher.broadcast_update(&channel_id, message).await,
            // Unknown message: silent no-op.
            Ok(None) => {}
            Err(e) => error!("failed to persist reaction for {}: {}", channel_id, e),
        },

        GatewayCommand::Recall {
            channel_id,
            message_id,
            userid,
        } => match store.recall_message(&channel_id, &message_id, &userid).await {
            Ok(Some(message)) => dispatcher.broadcast_update(&channel_id, message).await,
            // Unknown message, wrong author, or lapsed window: silent no-op.
            Ok(None) => {}
            Err(e) => error!("failed to persist recall for {}: {}", channel_id, e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_types::api::Submission;
    use lantern_types::models::{MessageContent, MessageKind, ReactionKind};

    fn test_store() -> Arc<ChannelStore> {
        let dir = std::env::temp_dir().join(format!("lantern_connection_test_{}", Uuid::new_v4()));
        Arc::new(ChannelStore::open(dir).unwrap())
    }

    fn submission(channel: &str, userid: &str, content: &str) -> Submission {
        Submission {
            channel_id: Some(channel.into()),
            userid: Some(userid.into()),
            content: Some(MessageContent::Text(content.into())),
            ..Submission::default()
        }
    }

    #[tokio::test]
    async fn join_replays_history_only_to_joiner() {
        let store = test_store();
        let dispatcher = Dispatcher::new();

        // Two messages exist before anyone joins.
        for text in ["one", "two"] {
            let (cid, msg) = policy::normalize(submission("c1", "u1", text)).unwrap();
            store.append(&cid, msg).await.unwrap();
        }

        let existing_conn = Uuid::new_v4();
        let (existing_tx, mut existing_rx) = mpsc::unbounded_channel();
        dispatcher.join("c1", existing_conn, existing_tx).await;

        let joiner_conn = Uuid::new_v4();
        let (joiner_tx, mut joiner_rx) = mpsc::unbounded_channel();
        handle_command(
            &dispatcher,
            &store,
            joiner_conn,
            &joiner_tx,
            GatewayCommand::Join {
                channel_id: "c1".into(),
            },
        )
        .await;

        match joiner_rx.try_recv().unwrap() {
            GatewayEvent::History { channel_id, messages } => {
                assert_eq!(channel_id, "c1");
                assert_eq!(messages.len(), 2);
                assert_eq!(messages[0].content, MessageContent::Text("one".into()));
                assert_eq!(messages[1].content, MessageContent::Text("two".into()));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        // The prior subscriber saw nothing.
        assert!(existing_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn submit_persists_and_broadcasts_to_all() {
        let store = test_store();
        let dispatcher = Dispatcher::new();

        let sender_conn = Uuid::new_v4();
        let (sender_tx, mut sender_rx) = mpsc::unbounded_channel();
        dispatcher.join("c1", sender_conn, sender_tx.clone()).await;

        let other_conn = Uuid::new_v4();
        let (other_tx, mut other_rx) = mpsc::unbounded_channel();
        dispatcher.join("c1", other_conn, other_tx).await;

        handle_command(
            &dispatcher,
            &store,
            sender_conn,
            &sender_tx,
            GatewayCommand::Message(submission("c1", "u1", "hi")),
        )
        .await;

        assert_eq!(store.read_all("c1").await.len(), 1);
        for rx in [&mut sender_rx, &mut other_rx] {
            match rx.try_recv().unwrap() {
                GatewayEvent::NewMessage { message, .. } => {
                    assert_eq!(message.kind, MessageKind::Text);
                    assert!(message.reactions.like.is_empty());
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn invalid_submission_is_silent() {
        let store = test_store();
        let dispatcher = Dispatcher::new();

        let conn = Uuid::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatcher.join("c1", conn, tx.clone()).await;

        let mut bad = submission("c1", "u1", "hi");
        bad.content = None;
        handle_command(&dispatcher, &store, conn, &tx, GatewayCommand::Message(bad)).await;

        assert!(store.read_all("c1").await.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reaction_and_recall_broadcast_updates() {
        let store = test_store();
        let dispatcher = Dispatcher::new();

        let (cid, msg) = policy::normalize(submission("c1", "u1", "hi")).unwrap();
        let stored = store.append(&cid, msg).await.unwrap();
        let id = stored.message_id.to_string();

        let conn = Uuid::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatcher.join("c1", conn, tx.clone()).await;

        handle_command(
            &dispatcher,
            &store,
            conn,
            &tx,
            GatewayCommand::Reaction {
                channel_id: "c1".into(),
                message_id: id.clone(),
                userid: "u2".into(),
                action: ReactionKind::Like,
            },
        )
        .await;

        match rx.try_recv().unwrap() {
            GatewayEvent::UpdateMessage { message, .. } => {
                assert_eq!(message.reactions.like, vec!["u2".to_string()]);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        handle_command(
            &dispatcher,
            &store,
            conn,
            &tx,
            GatewayCommand::Recall {
                channel_id: "c1".into(),
                message_id: id,
                userid: "u1".into(),
            },
        )
        .await;

        match rx.try_recv().unwrap() {
            GatewayEvent::UpdateMessage { message, .. } => {
                assert_eq!(message.kind, MessageKind::Retracted);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn denied_recall_broadcasts_nothing() {
        let store = test_store();
        let dispatcher = Dispatcher::new();

        let (cid, msg) = policy::normalize(submission("c1", "u1", "hi")).unwrap();
        let stored = store.append(&cid, msg).await.unwrap();

        let conn = Uuid::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatcher.join("c1", conn, tx.clone()).await;

        handle_command(
            &dispatcher,
            &store,
            conn,
            &tx,
            GatewayCommand::Recall {
                channel_id: "c1".into(),
                message_id: stored.message_id.to_string(),
                userid: "u3".into(),
            },
        )
        .await;

        assert!(rx.try_recv().is_err());
        assert_eq!(store.read_all("c1").await[0].kind, MessageKind::Text);
    }
}
