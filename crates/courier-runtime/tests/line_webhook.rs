//! A signed LINE webhook goes through the whole runtime and comes back as
//! one reply API call.

use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use courier_adapter_line::{SIGNATURE_HEADER, WEBHOOK_PATH, signature};
use courier_framework::{EchoHandler, PingHandler};
use courier_runtime::{CourierConfig, CourierRuntime};
use courier_transport::{HttpServer, ListenerHandle};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::time::timeout;

const SECRET: &str = "channel-secret";

async fn fake_line(calls: mpsc::UnboundedSender<(Option<String>, Value)>) -> ListenerHandle {
    let app = Router::new()
        .route(
            "/v2/bot/message/reply",
            post(
                |State(calls): State<mpsc::UnboundedSender<(Option<String>, Value)>>,
                 headers: HeaderMap,
                 Json(body): Json<Value>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    let _ = calls.send((auth, body));
                    Json(json!({}))
                },
            ),
        )
        .with_state(calls);
    HttpServer::serve("127.0.0.1:0", app).await.unwrap()
}

fn config(api_base: String) -> CourierConfig {
    let mut config = CourierConfig::default();
    config.server.host = "127.0.0.1".into();
    config.server.port = 0;
    config.providers.line.channel_secret = Some(SECRET.into());
    config.providers.line.channel_token = Some("channel-token".into());
    config.providers.line.api_base = api_base;
    config.executor.workers = 2;
    config
}

#[tokio::test]
async fn test_ping_and_echo_are_batched_into_one_reply() {
    let (calls_tx, mut calls) = mpsc::unbounded_channel();
    let line = fake_line(calls_tx).await;

    let runtime = CourierRuntime::builder()
        .config(config(format!("http://{}", line.local_addr())))
        .without_logging()
        .handler(PingHandler::new().unwrap())
        .handler(EchoHandler::new().unwrap())
        .build()
        .unwrap();
    let running = runtime.start().await.unwrap();
    let addr = running.local_addr().unwrap();

    let body = json!({
        "destination": "U0",
        "events": [
            { "type": "message", "replyToken": "R1", "message": { "type": "text", "text": "/echo hi" } },
            { "type": "follow", "replyToken": "R2" }
        ]
    })
    .to_string();
    let sig = signature::sign(body.as_bytes(), SECRET).unwrap();

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}{WEBHOOK_PATH}"))
        .header(SIGNATURE_HEADER, sig)
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let (auth, call) = timeout(Duration::from_secs(5), calls.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(auth.as_deref(), Some("Bearer channel-token"));
    assert_eq!(call["replyToken"], "R1");
    assert_eq!(call["messages"], json!([{ "type": "text", "text": "hi" }]));

    // a bad signature never reaches the handlers
    let resp = client
        .post(format!("http://{addr}{WEBHOOK_PATH}"))
        .header(SIGNATURE_HEADER, "AAAA")
        .body("{\"events\":[]}")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    running.shutdown().await;
    assert!(calls.try_recv().is_err());
    line.shutdown().await;
}
