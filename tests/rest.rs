// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! REST envelope scenarios: 429 retry-with-delay, retry exhaustion, and a
//! multipart upload round trip, all driven against a local `httptest`
//! server rather than a live Fluxer instance.

use std::time::{Duration, Instant};

use httptest::{matchers::*, responders::*, Expectation, Server};
use serde_json::json;

use fluxcrystal::error::FluxError;
use fluxcrystal::rest::{CreateMessage, RestClient};

fn message_body() -> serde_json::Value {
    json!({
        "id": "m1",
        "channel_id": "42",
        "author": {"id": "1", "username": "a", "discriminator": "0001"},
        "timestamp": "2024-01-01T00:00:00Z"
    })
}

fn init_logging() {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init();
}

#[tokio::test]
async fn retries_429_with_the_servers_retry_after_then_succeeds() {
    init_logging();
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("POST", "/channels/42/messages"))
            .times(2)
            .respond_with(
                status_code(429)
                    .append_header("content-type", "application/json")
                    .body(r#"{"retry_after":0.2}"#),
            ),
    );
    server.expect(
        Expectation::matching(request::method_path("POST", "/channels/42/messages"))
            .times(1)
            .respond_with(json_encoded(message_body())),
    );

    let client = RestClient::new(server.url_str(""), Some("token".to_string())).unwrap();
    let started = Instant::now();
    let message = client
        .create_message(
            "42",
            CreateMessage {
                content: Some("hi".to_string()),
                ..Default::default()
            },
            vec![],
        )
        .await
        .unwrap();

    assert_eq!(message.id, "m1");
    assert!(
        started.elapsed() >= Duration::from_millis(400),
        "expected two ~0.2s retry sleeps, elapsed was {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn exhausts_retries_and_fails_rate_limited() {
    init_logging();
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("POST", "/channels/42/messages"))
            .times(6)
            .respond_with(
                status_code(429)
                    .append_header("content-type", "application/json")
                    .body(r#"{"retry_after":0.01}"#),
            ),
    );

    let client = RestClient::new(server.url_str(""), Some("token".to_string())).unwrap();
    let result = client
        .create_message(
            "42",
            CreateMessage {
                content: Some("hi".to_string()),
                ..Default::default()
            },
            vec![],
        )
        .await;

    assert!(matches!(result, Err(FluxError::RateLimited { .. })));
}

#[tokio::test]
async fn error_envelope_maps_404_code_to_typed_unknown_channel() {
    init_logging();
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/channels/404"))
            .respond_with(
                status_code(404)
                    .append_header("content-type", "application/json")
                    .body(r#"{"code":"UNKNOWN_CHANNEL","message":"404: Not Found"}"#),
            ),
    );

    let client = RestClient::new(server.url_str(""), Some("token".to_string())).unwrap();
    let result = client.fetch_channel("404").await;
    assert!(matches!(result, Err(FluxError::UnknownChannel { .. })));
}

#[tokio::test]
async fn multipart_upload_round_trips_through_the_server() {
    init_logging();
    use fluxcrystal::model::AttachmentUpload;

    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("POST", "/channels/42/messages"))
            .respond_with(json_encoded(message_body())),
    );

    let client = RestClient::new(server.url_str(""), Some("token".to_string())).unwrap();
    let message = client
        .create_message(
            "42",
            CreateMessage {
                content: Some("hi".to_string()),
                ..Default::default()
            },
            vec![AttachmentUpload::new("a.png", b"x".to_vec()).with_content_type("image/png")],
        )
        .await
        .unwrap();

    assert_eq!(message.id, "m1");
}
