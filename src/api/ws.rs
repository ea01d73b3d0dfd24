//! WebSocket subscription to book snapshots

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::publisher::{Publisher, Subscription};
use crate::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Registration held by one socket; deregisters when dropped
struct SubscriberGuard {
    publisher: Arc<Publisher>,
    subscription: Subscription,
}

impl SubscriberGuard {
    fn register(publisher: Arc<Publisher>) -> Self {
        let subscription = publisher.register();
        Self {
            publisher,
            subscription,
        }
    }
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        self.publisher.deregister(self.subscription.id);
    }
}

/// Forward snapshots until either side goes away
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut guard = SubscriberGuard::register(state.publisher.clone());
    let id = guard.subscription.id;

    loop {
        tokio::select! {
            payload = guard.subscription.receiver.recv() => {
                let Some(payload) = payload else { break };
                if socket.send(Message::Text(payload.to_string())).await.is_err() {
                    debug!(subscriber_id = id, "Send failed, closing subscription");
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(subscriber_id = id, error = %e, "Socket error");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}
