//! The gateway protocol state machine: one WebSocket connection's lifecycle
//! from opening through HELLO, IDENTIFY/RESUME, steady-state dispatch, and
//! the classification of its eventual close into "reconnect" or "fatal".

use super::heartbeat::heartbeat_task;
use super::message::{
    heartbeat_payload, identify_payload, resume_payload, HelloData, IncomingPayload, Opcode,
};
use super::{GATEWAY_VERSION, RECONNECT_BACKOFF_CAP, RECONNECT_BACKOFF_FLOOR};
use crate::bot::Bot;
use crate::cache::Cache;
use crate::error::GatewayError;
use crate::registry::{construct_event, EventRegistry};
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, Notify, RwLock};
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub url: String,
    pub token: String,
}

/// Liveness state for a single connection attempt; `last_sequence` is the one
/// field shared with (and owned by) the parent [`GatewayConnection`] so that
/// it survives across reconnect attempts.
pub(crate) struct SessionState {
    pub heartbeat_interval: RwLock<Option<Duration>>,
    pub hello_received: Notify,
    pub last_ack_received: AtomicBool,
    pub last_sequence: Arc<RwLock<Option<u64>>>,
}

impl SessionState {
    fn new(last_sequence: Arc<RwLock<Option<u64>>>) -> Self {
        Self {
            heartbeat_interval: RwLock::new(None),
            hello_received: Notify::new(),
            last_ack_received: AtomicBool::new(true),
            last_sequence,
        }
    }
}

enum AttemptOutcome {
    Reconnect,
    Fatal(GatewayError),
}

/// A single persistent, authenticated gateway connection: opens a WebSocket,
/// runs the HELLO/IDENTIFY-or-RESUME handshake, then the heartbeat and read
/// loops until the connection drops, reconnecting with backoff until a fatal
/// close code is observed.
pub struct GatewayConnection {
    options: GatewayOptions,
    cache: Arc<Cache>,
    registry: Arc<EventRegistry>,
    bot: Weak<Bot>,
    session_id: Arc<RwLock<Option<String>>>,
    last_sequence: Arc<RwLock<Option<u64>>>,
    stop: Notify,
}

impl GatewayConnection {
    pub fn new(
        options: GatewayOptions,
        cache: Arc<Cache>,
        registry: Arc<EventRegistry>,
        bot: Weak<Bot>,
    ) -> Self {
        Self {
            options,
            cache,
            registry,
            bot,
            session_id: Arc::new(RwLock::new(None)),
            last_sequence: Arc::new(RwLock::new(None)),
            stop: Notify::new(),
        }
    }

    /// Cancels [`run`](Self::run) cooperatively: the in-flight connection
    /// attempt is dropped at its next suspension point, the same way a
    /// missed heartbeat-ack or a RECONNECT frame unwinds a single attempt.
    pub fn request_stop(&self) {
        self.stop.notify_waiters();
    }

    /// Runs until a fatal close code is observed, [`request_stop`](Self::request_stop)
    /// is called, or reconnecting with bounded exponential backoff (floor
    /// 2s, per the corrected missing-HELLO and backoff behaviour) on every
    /// other disconnect.
    pub async fn run(&self) -> Result<(), GatewayError> {
        let mut backoff = RECONNECT_BACKOFF_FLOOR;
        loop {
            let attempt = tokio::select! {
                attempt = self.connect_once() => attempt,
                _ = self.stop.notified() => return Ok(()),
            };
            match attempt {
                Ok(AttemptOutcome::Reconnect) => {
                    log::info!("gateway connection dropped, reconnecting in {backoff:?}");
                    tokio::select! {
                        _ = tokio::time::sleep(jittered(backoff)) => {}
                        _ = self.stop.notified() => return Ok(()),
                    }
                    backoff = (backoff * 2).min(RECONNECT_BACKOFF_CAP);
                }
                Ok(AttemptOutcome::Fatal(error)) => {
                    log::error!("gateway connection failed fatally: {error}");
                    return Err(error);
                }
                Err(error) => {
                    log::warn!("failed to establish gateway connection: {error}, retrying in {backoff:?}");
                    tokio::select! {
                        _ = tokio::time::sleep(jittered(backoff)) => {}
                        _ = self.stop.notified() => return Ok(()),
                    }
                    backoff = (backoff * 2).min(RECONNECT_BACKOFF_CAP);
                }
            }
        }
    }

    async fn connect_once(&self) -> Result<AttemptOutcome, GatewayError> {
        let url = build_url(&self.options.url);
        let (ws_stream, _response) =
            tokio_tungstenite::connect_async(&url)
                .await
                .map_err(|error| GatewayError::CannotConnect {
                    error: error.to_string(),
                })?;
        let (sink, mut stream) = ws_stream.split();
        let sink = Arc::new(Mutex::new(sink));
        let state = Arc::new(SessionState::new(self.last_sequence.clone()));
        let (kill_tx, heartbeat_kill_rx) = broadcast::channel(1);
        let mut read_kill_rx = kill_tx.subscribe();

        let heartbeat_handle = tokio::spawn(heartbeat_task(
            state.clone(),
            sink.clone(),
            kill_tx.clone(),
            heartbeat_kill_rx,
        ));

        let mut close_code: Option<u16> = None;
        let mut hello_seen = false;

        'read: loop {
            tokio::select! {
                _ = read_kill_rx.recv() => break 'read,
                message = stream.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            if let Err(error) = self
                                .handle_text_frame(&text, &state, &sink, &kill_tx, &mut hello_seen)
                                .await
                            {
                                log::warn!("failed to handle gateway frame: {error}");
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            close_code = frame.map(|f| u16::from(f.code));
                            break 'read;
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(error)) => {
                            log::warn!("gateway websocket error: {error}");
                            break 'read;
                        }
                        None => break 'read,
                    }
                }
            }
        }

        let _ = kill_tx.send(());
        heartbeat_handle.abort();

        if let Some(code) = close_code {
            if let Some(error) = GatewayError::from_close_code(code) {
                return Ok(AttemptOutcome::Fatal(error));
            }
        }
        Ok(AttemptOutcome::Reconnect)
    }

    async fn handle_text_frame(
        &self,
        text: &str,
        state: &Arc<SessionState>,
        sink: &Arc<Mutex<super::heartbeat::WsSink>>,
        kill_tx: &broadcast::Sender<()>,
        hello_seen: &mut bool,
    ) -> Result<(), GatewayError> {
        let incoming: IncomingPayload = serde_json::from_str(text).map_err(|error| GatewayError::Decode {
            error: error.to_string(),
        })?;

        match incoming.op {
            Opcode::Hello => {
                if *hello_seen {
                    return Ok(());
                }
                *hello_seen = true;
                let raw = incoming.d.ok_or_else(|| GatewayError::Decode {
                    error: "HELLO frame missing d".to_string(),
                })?;
                let hello: HelloData =
                    serde_json::from_str(raw.get()).map_err(|error| GatewayError::Decode {
                        error: error.to_string(),
                    })?;
                *state.heartbeat_interval.write().await = Some(Duration::from_millis(hello.heartbeat_interval));
                state.hello_received.notify_one();

                let session = self.session_id.read().await.clone();
                let sequence = *self.last_sequence.read().await;
                let mut sink = sink.lock().await;
                let frame = match (session, sequence) {
                    (Some(session_id), Some(seq)) => {
                        serde_json::to_string(&resume_payload(&self.options.token, &session_id, seq))
                    }
                    _ => serde_json::to_string(&identify_payload(&self.options.token)),
                }
                .map_err(|error| GatewayError::Decode {
                    error: error.to_string(),
                })?;
                sink.send(Message::Text(frame))
                    .await
                    .map_err(|error| GatewayError::CannotConnect {
                        error: error.to_string(),
                    })?;
            }
            Opcode::Dispatch => {
                if let Some(seq) = incoming.s {
                    *self.last_sequence.write().await = Some(seq);
                }
                if let Some(name) = incoming.t.as_deref() {
                    let payload: Value = match incoming.d {
                        Some(raw) => serde_json::from_str(raw.get()).unwrap_or(Value::Null),
                        None => Value::Null,
                    };
                    if name == "READY" {
                        if let Some(session_id) = payload.get("session_id").and_then(Value::as_str) {
                            *self.session_id.write().await = Some(session_id.to_string());
                        }
                    }
                    self.cache.update(name, &payload).await;
                    if let Some(event) = construct_event(name, &payload) {
                        if let Some(bot) = self.bot.upgrade() {
                            self.registry.dispatch(event, bot).await;
                        }
                    }
                }
            }
            Opcode::Heartbeat => {
                let sequence = *self.last_sequence.read().await;
                let frame = serde_json::to_string(&heartbeat_payload(sequence)).map_err(|error| {
                    GatewayError::Decode {
                        error: error.to_string(),
                    }
                })?;
                sink.lock()
                    .await
                    .send(Message::Text(frame))
                    .await
                    .map_err(|error| GatewayError::CannotConnect {
                        error: error.to_string(),
                    })?;
            }
            Opcode::HeartbeatAck => {
                state.last_ack_received.store(true, Ordering::SeqCst);
            }
            Opcode::Reconnect => {
                log::info!("gateway requested a reconnect, preserving session");
                let _ = kill_tx.send(());
            }
            Opcode::InvalidSession => {
                let resumable = incoming
                    .d
                    .and_then(|raw| serde_json::from_str::<bool>(raw.get()).ok())
                    .unwrap_or(false);
                if !resumable {
                    log::info!("session invalidated and not resumable, clearing session state");
                    *self.session_id.write().await = None;
                    *self.last_sequence.write().await = None;
                }
                let _ = kill_tx.send(());
            }
            Opcode::Identify | Opcode::Resume => {
                // Client-to-server-only opcodes; the server never sends these.
            }
        }
        Ok(())
    }
}

fn build_url(base: &str) -> String {
    if base.contains('?') {
        base.to_string()
    } else {
        format!("{base}?v={GATEWAY_VERSION}&encoding=json")
    }
}

fn jittered(duration: Duration) -> Duration {
    let millis = duration.as_millis() as u64;
    let jitter = rand::thread_rng().gen_range(0..=millis / 4 + 1);
    Duration::from_millis(millis + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_version_and_encoding_when_url_has_no_query() {
        assert_eq!(
            build_url("wss://gateway.example.com"),
            "wss://gateway.example.com?v=1&encoding=json"
        );
    }

    #[test]
    fn leaves_existing_query_string_untouched() {
        assert_eq!(
            build_url("wss://gateway.example.com?foo=bar"),
            "wss://gateway.example.com?foo=bar"
        );
    }
}
