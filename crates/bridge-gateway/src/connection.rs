use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::{debug, info, warn};

use bridge_social::{MessagingService, PresenceTracker};
use bridge_types::api::Claims;
use bridge_types::events::{GatewayCommand, GatewayEvent};
use bridge_types::models::AccountId;

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// How long an unauthenticated socket may stay open before identifying.
const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a gateway connection needs, cloned per socket.
#[derive(Clone)]
pub struct GatewayContext {
    pub dispatcher: Dispatcher,
    pub messaging: Arc<dyn MessagingService>,
    pub presence: PresenceTracker,
    pub jwt_secret: String,
}

/// Validates a bearer token and returns its claims.
pub fn verify_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// Drives one WebSocket for its whole life. When the token was already
/// checked at the HTTP upgrade, `pre_authenticated` carries the account and
/// the Identify handshake is skipped.
pub async fn handle_connection(
    socket: WebSocket,
    ctx: GatewayContext,
    pre_authenticated: Option<AccountId>,
) {
    let (mut sender, mut receiver) = socket.split();

    let user_id = match pre_authenticated {
        Some(id) => id,
        None => match wait_for_identify(&mut receiver, &ctx.jwt_secret).await {
            Some(id) => id,
            None => {
                warn!("WebSocket client failed to identify, closing");
                return;
            }
        },
    };

    info!("Account {} connected to gateway", user_id);

    let Some(ready) = encode(&GatewayEvent::Ready { user_id }) else {
        return;
    };
    if sender.send(ready).await.is_err() {
        return;
    }
    touch(&ctx.presence, user_id).await;

    run_connection_loop(sender, receiver, ctx, user_id).await;
}

async fn run_connection_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut receiver: SplitStream<WebSocket>,
    ctx: GatewayContext,
    user_id: AccountId,
) {
    let (conn_id, mut user_rx) = ctx.dispatcher.register_user_channel(user_id);

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward targeted events -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                event = user_rx.recv() => {
                    let Some(event) = event else { break };
                    let Some(frame) = encode(&event) else { continue };
                    if sender.send(frame).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!(
                                "Heartbeat timeout for {} (missed {} pongs), dropping connection",
                                user_id, missed_heartbeats
                            );
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read commands from client
    let recv_ctx = ctx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(cmd) => handle_command(&recv_ctx, user_id, cmd).await,
                    Err(e) => {
                        warn!(
                            "{} bad command: {} -- raw: {}",
                            user_id,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    ctx.dispatcher.unregister_user_channel(user_id, conn_id);
    info!("Account {} disconnected from gateway", user_id);
}

async fn wait_for_identify(
    receiver: &mut SplitStream<WebSocket>,
    jwt_secret: &str,
) -> Option<AccountId> {
    let identify = async {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(GatewayCommand::Identify { token }) =
                    serde_json::from_str::<GatewayCommand>(&text)
                {
                    return verify_token(jwt_secret, &token).map(|claims| claims.sub);
                }
            }
        }
        None
    };

    tokio::time::timeout(IDENTIFY_TIMEOUT, identify)
        .await
        .ok()
        .flatten()
}

async fn handle_command(ctx: &GatewayContext, user_id: AccountId, cmd: GatewayCommand) {
    match cmd {
        GatewayCommand::Identify { .. } => {} // Already handled

        GatewayCommand::ChatSend {
            receiver_id,
            content,
            event_id,
        } => {
            let messaging = ctx.messaging.clone();
            let result = tokio::task::spawn_blocking(move || {
                messaging.send(user_id, receiver_id, &content, event_id)
            })
            .await;

            match result {
                Ok(Ok(message)) => {
                    debug!("{} sent message {} over gateway", user_id, message.id);
                    touch(&ctx.presence, user_id).await;
                }
                Ok(Err(e)) => debug!("{} chat.send to {} rejected: {}", user_id, receiver_id, e),
                Err(e) => warn!("chat.send task failed: {}", e),
            }
        }

        GatewayCommand::Heartbeat => touch(&ctx.presence, user_id).await,
    }
}

async fn touch(presence: &PresenceTracker, user_id: AccountId) {
    let presence = presence.clone();
    match tokio::task::spawn_blocking(move || presence.touch(user_id)).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => debug!("Activity for {} not recorded: {}", user_id, e),
        Err(e) => warn!("presence task failed: {}", e),
    }
}

fn encode(event: &GatewayEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Message::Text(text.into())),
        Err(e) => {
            warn!("Failed to encode gateway event: {}", e);
            None
        }
    }
}
