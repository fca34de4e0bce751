//! The heartbeat loop: one sibling task of the connection's read loop,
//! sharing liveness state through [`super::connection::SessionState`].

use super::message::heartbeat_payload;
use super::{connection::SessionState, HELLO_TIMEOUT};
use futures_util::SinkExt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio_tungstenite::tungstenite::Message;

pub(crate) type WsSink = futures_util::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    Message,
>;

/// Runs until the shared kill channel fires or a missed heartbeat-ack is
/// detected (a "zombie" connection), at which point it broadcasts the kill
/// signal itself so the sibling read loop unwinds too.
pub async fn heartbeat_task(
    state: Arc<SessionState>,
    sink: Arc<Mutex<WsSink>>,
    kill_tx: broadcast::Sender<()>,
    mut kill_rx: broadcast::Receiver<()>,
) {
    if tokio::time::timeout(HELLO_TIMEOUT, state.hello_received.notified())
        .await
        .is_err()
    {
        log::warn!("no HELLO received within {HELLO_TIMEOUT:?}, triggering reconnect");
        let _ = kill_tx.send(());
        return;
    }

    loop {
        let interval = state
            .heartbeat_interval
            .read()
            .await
            .unwrap_or(Duration::from_secs(45));

        tokio::select! {
            _ = kill_rx.recv() => return,
            _ = tokio::time::sleep(interval) => {
                if !state.last_ack_received.load(Ordering::SeqCst) {
                    log::warn!("heartbeat zombied: no ack received since the last beat, reconnecting");
                    let _ = kill_tx.send(());
                    return;
                }
                state.last_ack_received.store(false, Ordering::SeqCst);
                let payload = heartbeat_payload(*state.last_sequence.read().await);
                let frame = match serde_json::to_string(&payload) {
                    Ok(frame) => frame,
                    Err(error) => {
                        log::error!("failed to encode heartbeat payload: {error}");
                        continue;
                    }
                };
                let mut sink = sink.lock().await;
                if let Err(error) = sink.send(Message::Text(frame)).await {
                    log::warn!("failed to send heartbeat, reconnecting: {error}");
                    let _ = kill_tx.send(());
                    return;
                }
            }
        }
    }
}
