// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! End-to-end scenarios for the gateway connection engine, driven against a
//! scripted mock WebSocket server and a mock REST endpoint for
//! `GET /gateway/bot`. Mirrors the six scenarios a reference implementation
//! of this protocol is expected to satisfy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use httptest::{matchers::*, responders::*, Expectation, Server};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Mutex};
use tokio_tungstenite::tungstenite::protocol::{frame::coding::CloseCode, CloseFrame};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use fluxcrystal::events::ReadyEvent;
use fluxcrystal::{Bot, FluxError};

async fn mock_gateway_rest(ws_url: String) -> Server {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/gateway/bot"))
            .respond_with(json_encoded(serde_json::json!({ "url": ws_url }))),
    );
    server
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.unwrap();
    tokio_tungstenite::accept_async(stream).await.unwrap()
}

fn init_logging() {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init();
}

#[tokio::test(flavor = "multi_thread")]
async fn hello_identify_ready() {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_url = format!("ws://{}", listener.local_addr().unwrap());
    let rest = mock_gateway_rest(ws_url).await;
    let bot = Bot::new("test-token", rest.url_str("")).unwrap();

    let (ready_tx, ready_rx) = oneshot::channel();
    let ready_tx = Arc::new(Mutex::new(Some(ready_tx)));
    bot.listen::<ReadyEvent, _, _>(move |event, bot| {
        let ready_tx = ready_tx.clone();
        async move {
            if let Some(tx) = ready_tx.lock().await.take() {
                let me = bot.cache.me().await;
                let _ = tx.send((event, me));
            }
        }
    })
    .await;

    let bot_task = bot.clone();
    tokio::spawn(async move {
        let _ = bot_task.start().await;
    });

    let mut ws = accept(&listener).await;
    ws.send(Message::Text(
        r#"{"op":10,"d":{"heartbeat_interval":41250}}"#.to_string(),
    ))
    .await
    .unwrap();

    // First client frame after HELLO must be IDENTIFY (op 2), not RESUME.
    let identify = ws.next().await.unwrap().unwrap();
    let identify: serde_json::Value = serde_json::from_str(identify.to_text().unwrap()).unwrap();
    assert_eq!(identify["op"], 2);
    assert_eq!(identify["d"]["token"], "test-token");

    ws.send(Message::Text(
        r#"{"op":0,"t":"READY","s":1,"d":{"user":{"id":"1","username":"a","discriminator":"0001"},"session_id":"S"}}"#
            .to_string(),
    ))
    .await
    .unwrap();

    let (ready_event, cached_me) = tokio::time::timeout(Duration::from_secs(5), ready_rx)
        .await
        .expect("READY handler did not fire in time")
        .unwrap();

    assert_eq!(ready_event.session_id, "S");
    assert_eq!(ready_event.user.id, "1");
    assert_eq!(cached_me.unwrap().id, "1");
    bot.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn zombie_heartbeat_triggers_reconnect() {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_url = format!("ws://{}", listener.local_addr().unwrap());
    let rest = mock_gateway_rest(ws_url).await;
    let bot = Bot::new("test-token", rest.url_str("")).unwrap();

    let bot_task = bot.clone();
    tokio::spawn(async move {
        let _ = bot_task.start().await;
    });

    let mut first = accept(&listener).await;
    first
        .send(Message::Text(
            r#"{"op":10,"d":{"heartbeat_interval":100}}"#.to_string(),
        ))
        .await
        .unwrap();
    // Drain the IDENTIFY, then never acknowledge any heartbeat.
    let _ = first.next().await;

    // A missed heartbeat-ack must cancel this attempt and trigger a fresh
    // connection attempt within the backoff window.
    let second = tokio::time::timeout(Duration::from_secs(6), accept(&listener)).await;
    assert!(
        second.is_ok(),
        "expected a reconnect attempt after a zombied heartbeat"
    );
    bot.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn non_resumable_invalid_session_clears_session_and_reidentifies() {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_url = format!("ws://{}", listener.local_addr().unwrap());
    let rest = mock_gateway_rest(ws_url).await;
    let bot = Bot::new("test-token", rest.url_str("")).unwrap();

    let bot_task = bot.clone();
    tokio::spawn(async move {
        let _ = bot_task.start().await;
    });

    let mut first = accept(&listener).await;
    first
        .send(Message::Text(
            r#"{"op":10,"d":{"heartbeat_interval":41250}}"#.to_string(),
        ))
        .await
        .unwrap();
    let _ = first.next().await; // IDENTIFY
    first
        .send(Message::Text(
            r#"{"op":0,"t":"READY","s":5,"d":{"user":{"id":"1","username":"a","discriminator":"0001"},"session_id":"S"}}"#
                .to_string(),
        ))
        .await
        .unwrap();
    // Non-resumable invalidation: d=false.
    first
        .send(Message::Text(r#"{"op":9,"d":false}"#.to_string()))
        .await
        .unwrap();

    let mut second = tokio::time::timeout(Duration::from_secs(6), accept(&listener))
        .await
        .expect("expected a reconnect after INVALID_SESSION");
    second
        .send(Message::Text(
            r#"{"op":10,"d":{"heartbeat_interval":41250}}"#.to_string(),
        ))
        .await
        .unwrap();
    let reidentify = second.next().await.unwrap().unwrap();
    let reidentify: serde_json::Value = serde_json::from_str(reidentify.to_text().unwrap()).unwrap();
    // A cleared session must IDENTIFY again, never RESUME.
    assert_eq!(reidentify["op"], 2);
    bot.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn fatal_close_code_surfaces_as_authentication_error_with_no_reconnect() {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_url = format!("ws://{}", listener.local_addr().unwrap());
    let rest = mock_gateway_rest(ws_url).await;
    let bot = Bot::new("test-token", rest.url_str("")).unwrap();

    let accepted = Arc::new(AtomicBool::new(false));
    let accepted_clone = accepted.clone();
    tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        accepted_clone.store(true, Ordering::SeqCst);
        ws.send(Message::Close(Some(CloseFrame {
            code: CloseCode::Library(4004),
            reason: "authentication failed".into(),
        })))
        .await
        .unwrap();
        // A fatal close code must end the reconnect loop outright: a
        // second connection attempt here would hang the accept forever,
        // which the test's own timeout below would catch.
        let _ = tokio::time::timeout(Duration::from_secs(2), listener.accept()).await;
    });

    let result = tokio::time::timeout(Duration::from_secs(5), bot.start())
        .await
        .expect("start() must return promptly on a fatal close code");
    assert!(accepted.load(Ordering::SeqCst));
    assert!(matches!(result, Err(FluxError::Gateway { .. })));
}
