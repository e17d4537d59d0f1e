use crate::domain::state::{AuthorityId, PlayerInput};
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage, WorldUpdateDto};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::{next_connection_id, next_player_id};
use crate::use_cases::{GameEvent, ServerState, WorldUpdate};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    WorldUpdatesClosed,
    ServerStateClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<WorldUpdate>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
) {
    // Serialize each world update once and broadcast the shared bytes.
    loop {
        match world_rx.recv().await {
            Ok(update) => {
                let msg = ServerMessage::WorldUpdate(WorldUpdateDto::from(update));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world update");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                // Store the latest bytes for lag recovery.
                let _ = world_latest_tx.send(bytes.clone());
                let _ = world_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "world serializer lagged; skipping to latest update"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("world updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = next_connection_id();
    let span = info_span!("conn", conn_id, player_id = tracing::field::Empty);
    serve_connection(socket, state).instrument(span).await
}

async fn serve_connection(mut socket: WebSocket, state: Arc<AppState>) {
    let mut ctx = match bootstrap_connection(&mut socket, &state).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "bootstrap failed".into(),
                })))
                .await;
            let _ = socket.close().await;
            return;
        }
    };

    Span::current().record("player_id", ctx.player_id.0);
    info!("client connected");

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

struct ConnCtx {
    player_id: AuthorityId,
    input_tx: mpsc::Sender<GameEvent>,
    world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    world_latest_rx: watch::Receiver<Utf8Bytes>,
    server_state_rx: watch::Receiver<ServerState>,
    has_joined: bool,

    ping_timer: Interval,
    next_nonce: u64,
    // Outstanding probe; a newer ping replaces it.
    pending_ping: Option<(u64, Instant)>,
    last_rtt: Option<Duration>,

    lag_recovery_count: u64,
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,

    last_input_full_log: Instant,
    last_world_lag_log: Instant,
    last_invalid_input_log: Instant,

    close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
) -> Result<ConnCtx, NetError> {
    // Subscribe to updates *before* doing anything else (awaits) to not miss packets.
    let world_bytes_rx = state.world_bytes_tx.subscribe();
    let world_latest_rx = state.world_latest_tx.subscribe();
    let server_state_rx = state.server_state_tx.subscribe();

    let player_id = AuthorityId(next_player_id());
    send_message(socket, &ServerMessage::Identity { player_id: player_id.0 }).await?;

    // Clone as soon as we borrow so the lock is not held across the await.
    let initial_state = server_state_rx.borrow().clone();
    send_message(socket, &ServerMessage::GameState(initial_state.into())).await?;

    let mut ping_timer = tokio::time::interval(state.ping_interval);
    ping_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        player_id,
        input_tx: state.input_tx.clone(),
        world_bytes_rx,
        world_latest_rx,
        server_state_rx,
        has_joined: false,

        ping_timer,
        next_nonce: 1,
        pending_ping: None,
        last_rtt: None,

        lag_recovery_count: 0,
        msgs_in: 0,
        msgs_out: 0,
        bytes_in: 0,
        bytes_out: 0,
        invalid_json: 0,

        last_input_full_log: now,
        last_world_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const MAX_DISPLAY_NAME_LEN: usize = 32;
const DEFAULT_DISPLAY_NAME: &str = "Pilot";

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn display_name_or_default(raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_DISPLAY_NAME_LEN {
        DEFAULT_DISPLAY_NAME.to_string()
    } else {
        name.to_string()
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, ctx).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            world_msg = ctx.world_bytes_rx.recv() => {
                match world_msg {
                    Ok(bytes) => matches!(
                        forward_world_bytes(bytes, socket, ctx).await,
                        LoopControl::Disconnect
                    ),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut ctx.last_world_lag_log) {
                            warn!(missed = n, "world updates lagged; sending snapshot");
                        }

                        // Resync strategy: send the latest world snapshot.
                        let latest = ctx.world_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            ctx.lag_recovery_count += 1;
                            matches!(
                                forward_world_bytes(latest, socket, ctx).await,
                                LoopControl::Disconnect
                            )
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::WorldUpdatesClosed);
                        true
                    }
                }
            }

            changed_state = ctx.server_state_rx.changed() => {
                match changed_state {
                    Ok(()) => {
                        let st = ctx.server_state_rx.borrow().clone();
                        matches!(
                            forward_message(&ServerMessage::GameState(st.into()), socket, ctx).await,
                            LoopControl::Disconnect
                        )
                    }
                    Err(_) => {
                        warn!("server state channel closed; disconnecting");
                        fatal = Some(NetError::ServerStateClosed);
                        true
                    }
                }
            }

            _ = ctx.ping_timer.tick() => {
                let nonce = ctx.next_nonce;
                ctx.next_nonce += 1;
                ctx.pending_ping = Some((nonce, Instant::now()));
                matches!(
                    forward_message(&ServerMessage::Ping { nonce }, socket, ctx).await,
                    LoopControl::Disconnect
                )
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(ctx).await {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    let player_id = ctx.player_id;
    match incoming {
        Some(Ok(Message::Text(text))) => {
            ctx.msgs_in += 1;
            ctx.bytes_in += text.len() as u64;

            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Join(payload)) => {
                    if ctx.has_joined {
                        debug!(%player_id, "duplicate join ignored");
                        return Ok(LoopControl::Continue);
                    }
                    let display_name = display_name_or_default(&payload.display_name);
                    ctx.input_tx
                        .send(GameEvent::Join {
                            player_id,
                            display_name,
                        })
                        .await
                        .map_err(|_| NetError::InputClosed)?;
                    ctx.has_joined = true;
                    Ok(LoopControl::Continue)
                }
                Ok(ClientMessage::Input(input)) => {
                    if !ctx.has_joined {
                        if should_log(&mut ctx.last_invalid_input_log) {
                            warn!(%player_id, "received input before join");
                        }
                        return Ok(LoopControl::Continue);
                    }
                    process_input_message(ctx, input.into())
                }
                Ok(ClientMessage::Pong { nonce }) => {
                    process_pong(ctx, nonce);
                    Ok(LoopControl::Continue)
                }
                Err(parse_err) => {
                    ctx.invalid_json += 1;
                    if should_log(&mut ctx.last_invalid_input_log) {
                        warn!(
                            %player_id,
                            bytes = text.len(),
                            error = %parse_err,
                            "failed to parse client message"
                        );
                    }

                    if ctx.invalid_json > MAX_INVALID_JSON {
                        ctx.close_frame = Some(CloseFrame {
                            code: close_code::POLICY,
                            reason: "too many invalid messages".into(),
                        });
                        return Ok(LoopControl::Disconnect);
                    }
                    Ok(LoopControl::Continue)
                }
            }
        }
        Some(Ok(Message::Binary(_))) => {
            ctx.close_frame = Some(CloseFrame {
                code: close_code::UNSUPPORTED,
                reason: "binary messages not supported".into(),
            });
            Ok(LoopControl::Disconnect)
        }
        Some(Ok(Message::Ping(_) | Message::Pong(_))) => Ok(LoopControl::Continue),
        Some(Ok(Message::Close(_))) => Ok(LoopControl::Disconnect),
        Some(Err(e)) => {
            warn!(%player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(%player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

fn process_input_message(ctx: &mut ConnCtx, input: PlayerInput) -> Result<LoopControl, NetError> {
    let player_id = ctx.player_id;
    let Some(input) = input.sanitized() else {
        if should_log(&mut ctx.last_invalid_input_log) {
            warn!(%player_id, "invalid input values (NaN/inf); dropping");
        }
        return Ok(LoopControl::Continue);
    };

    match ctx.input_tx.try_send(GameEvent::Input { player_id, input }) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_)) => {
            if should_log(&mut ctx.last_input_full_log) {
                warn!(%player_id, "input channel full; dropping input");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Err(NetError::InputClosed),
    }
}

fn process_pong(ctx: &mut ConnCtx, nonce: u64) {
    let player_id = ctx.player_id;
    // Stale or unsolicited pongs carry no usable sample.
    let Some((_, sent_at)) = ctx.pending_ping.take_if(|(pending, _)| *pending == nonce) else {
        debug!(%player_id, nonce, "unmatched pong ignored");
        return;
    };

    let rtt = sent_at.elapsed();
    ctx.last_rtt = Some(rtt);
    if !ctx.has_joined {
        return;
    }
    if let Err(mpsc::error::TrySendError::Full(_)) = ctx
        .input_tx
        .try_send(GameEvent::Latency { player_id, rtt })
    {
        if should_log(&mut ctx.last_input_full_log) {
            warn!(%player_id, "input channel full; dropping latency sample");
        }
    }
}

async fn forward_world_bytes(
    world_msg: Utf8Bytes,
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
) -> LoopControl {
    let bytes_len = world_msg.len();
    match socket.send(Message::Text(world_msg)).await {
        Ok(()) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send world update");
            LoopControl::Disconnect
        }
    }
}

async fn forward_message(
    msg: &ServerMessage,
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
) -> LoopControl {
    match send_message(socket, msg).await {
        Ok(bytes) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes as u64;
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send message");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(ctx: &ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;
    if ctx.has_joined {
        ctx.input_tx
            .send(GameEvent::Leave { player_id })
            .await
            .map_err(|_| NetError::InputClosed)?;
    }

    debug!(
        %player_id,
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        lag_recovery_count = ctx.lag_recovery_count,
        last_rtt_ms = ctx.last_rtt.map(|d| d.as_millis() as u64),
        "connection stats"
    );
    info!(%player_id, "client disconnected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_display_name_is_blank_or_oversized_then_the_default_is_used() {
        assert_eq!(display_name_or_default("  Ace  "), "Ace");
        assert_eq!(display_name_or_default("   "), DEFAULT_DISPLAY_NAME);
        assert_eq!(
            display_name_or_default(&"x".repeat(MAX_DISPLAY_NAME_LEN + 1)),
            DEFAULT_DISPLAY_NAME
        );
    }
}
