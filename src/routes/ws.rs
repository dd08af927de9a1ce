// WebSocket handler and stream logic

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::models::ScoreSample;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements ws_score connection count on drop (connect = +1, drop = -1).
struct WsScoreGuard(Arc<AtomicUsize>);

impl Drop for WsScoreGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

pub(super) async fn ws_score(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let conn_count = state.ws_score_connections.clone();
    // Subscribe first so a sample published after the latest read is still delivered.
    let mut rx = state.stats_tx.subscribe();
    let latest = state.latest.read().await.as_ref().cloned();
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = stream_score(socket, &mut rx, conn_count, latest).await {
            tracing::info!("Score stream error: {}", e);
        }
    })
}

/// Sends the latest sample right away (if any), then every broadcast sample.
async fn stream_score(
    socket: WebSocket,
    rx: &mut broadcast::Receiver<ScoreSample>,
    conn_count: Arc<AtomicUsize>,
    latest: Option<ScoreSample>,
) -> anyhow::Result<()> {
    conn_count.fetch_add(1, Ordering::Relaxed);
    let _guard = WsScoreGuard(conn_count);
    tracing::info!("Client connected to score stream");

    let (mut sender, mut receiver) = socket.split();

    if let Some(sample) = latest {
        let json = serde_json::to_string(&sample)?;
        let r = timeout(WS_SEND_TIMEOUT, sender.send(Message::Text(json.into()))).await;
        if r.is_err() || r.unwrap_or(Ok(())).is_err() {
            return Ok(());
        }
    }

    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(sample) => {
                        let json = serde_json::to_string(&sample)?;
                        let r = timeout(WS_SEND_TIMEOUT, sender.send(Message::Text(json.into()))).await;
                        if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/score client lagged, skipped {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "score stream receive failed");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, sender.send(Message::Ping(Bytes::new()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    break;
                }
            }
        }
    }
    tracing::info!("Client disconnected from score stream");
    Ok(())
}
