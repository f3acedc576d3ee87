mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::{json, Value};
use teloxide::types::Update;
use teloxide::Bot;
use tokio::sync::{mpsc, oneshot};

use sentiment_demo::bot::{
    self, reply_for, BotError, ChatRouter, SentimentApiClient, ANALYSIS_FAILED, GREETING,
    NOT_RECOGNIZED,
};

async fn analysis_stub(app: Router) -> SentimentApiClient {
    let addr = common::spawn_app(app).await;
    SentimentApiClient::new(format!("http://{}/api/get_analysis", addr))
}

async fn echo(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let text = params.get("text").cloned().unwrap_or_default();
    Json(json!({ "result": format!("echo: {}", text) }))
}

#[tokio::test]
async fn test_result_is_forwarded_and_text_is_encoded() {
    let client = analysis_stub(Router::new().route("/api/get_analysis", get(echo))).await;
    let outcome = client.get_analysis("привет & мир? #1").await;
    assert_eq!(reply_for(&outcome), "echo: привет & мир? #1");
}

#[tokio::test]
async fn test_server_error_gets_fixed_apology() {
    let client = analysis_stub(Router::new().route(
        "/api/get_analysis",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model exploded") }),
    ))
    .await;

    let outcome = client.get_analysis("great movie").await;
    match &outcome {
        Err(BotError::Upstream { status, body }) => {
            assert_eq!(*status, 500);
            assert_eq!(body, "model exploded");
        }
        other => panic!("expected an upstream error, got {:?}", other),
    }
    assert_eq!(reply_for(&outcome), ANALYSIS_FAILED);
}

#[tokio::test]
async fn test_missing_result_is_not_recognized() {
    let client = analysis_stub(Router::new().route(
        "/api/get_analysis",
        get(|| async { Json(json!({ "detail": "nothing here" })) }),
    ))
    .await;
    let outcome = client.get_analysis("great movie").await;
    assert_eq!(reply_for(&outcome), NOT_RECOGNIZED);

    let client = analysis_stub(Router::new().route(
        "/api/get_analysis",
        get(|| async { Json(json!({ "result": 42 })) }),
    ))
    .await;
    let outcome = client.get_analysis("great movie").await;
    assert_eq!(reply_for(&outcome), NOT_RECOGNIZED);
}

#[tokio::test]
async fn test_invalid_json_is_transport_error() {
    let client = analysis_stub(
        Router::new().route("/api/get_analysis", get(|| async { "not json" })),
    )
    .await;
    let outcome = client.get_analysis("great movie").await;
    assert!(matches!(outcome, Err(BotError::Transport(_))));
    assert!(reply_for(&outcome).starts_with("Произошла ошибка: "));
}

#[tokio::test]
async fn test_non_200_success_status_gets_fixed_apology() {
    let client = analysis_stub(Router::new().route(
        "/api/get_analysis",
        get(|| async { StatusCode::NO_CONTENT }),
    ))
    .await;

    let outcome = client.get_analysis("great movie").await;
    assert!(matches!(outcome, Err(BotError::Upstream { status: 204, .. })));
    assert_eq!(reply_for(&outcome), ANALYSIS_FAILED);
}

#[tokio::test]
async fn test_connection_failure_reply_names_the_cause() {
    let addr = common::closed_addr().await;
    let client = SentimentApiClient::new(format!("http://{}/api/get_analysis", addr));

    let outcome = client.get_analysis("great movie").await;
    assert!(matches!(outcome, Err(BotError::Transport(_))));
    let reply = reply_for(&outcome);
    assert!(reply.starts_with("Произошла ошибка: "), "{}", reply);
    assert!(reply.contains("refused"), "{}", reply);
    assert!(!reply.contains("great"), "{}", reply);
}

#[tokio::test]
async fn test_start_command_does_not_call_the_api() {
    let addr = common::closed_addr().await;
    let client = SentimentApiClient::new(format!("http://{}/api/get_analysis", addr));
    assert_eq!(bot::respond(&client, "/start").await, GREETING);
    assert_eq!(bot::respond(&client, "/start@SentimentBot hello").await, GREETING);
}

#[derive(Clone)]
struct TelegramStub {
    delivered: Arc<AtomicBool>,
    sent: mpsc::UnboundedSender<Value>,
}

fn chat() -> Value {
    json!({ "id": 42, "type": "private", "first_name": "Ann" })
}

fn text_message(message_id: i32, text: &str) -> Value {
    json!({
        "message_id": message_id,
        "date": 0,
        "chat": chat(),
        "from": { "id": 42, "is_bot": false, "first_name": "Ann" },
        "text": text
    })
}

fn text_update(update_id: i32, message_id: i32, text: &str) -> Result<Update, serde_json::Error> {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": text_message(message_id, text)
    }))
}

/// Bot API stand-in. Method names are matched case-insensitively, as Telegram does.
async fn telegram_method(
    State(stub): State<TelegramStub>,
    Path(method): Path<String>,
    body: Bytes,
) -> Json<Value> {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    match method.to_ascii_lowercase().as_str() {
        "getupdates" => {
            if stub.delivered.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(50)).await;
                return Json(json!({ "ok": true, "result": [] }));
            }
            let photo = json!({
                "message_id": 2,
                "date": 0,
                "chat": chat(),
                "photo": [{ "file_id": "p", "file_unique_id": "u", "width": 90, "height": 90 }]
            });
            Json(json!({ "ok": true, "result": [
                { "update_id": 100, "message": text_message(1, "/start") },
                { "update_id": 101, "message": photo },
                { "update_id": 102, "message": text_message(3, "great movie") }
            ]}))
        }
        "sendmessage" => {
            let text = body["text"].as_str().unwrap_or_default().to_string();
            let _ = stub.sent.send(body);
            Json(json!({ "ok": true, "result": text_message(1000, &text) }))
        }
        other => Json(json!({
            "ok": false,
            "error_code": 404,
            "description": format!("Not Found: method {} is not stubbed", other)
        })),
    }
}

async fn telegram_stub() -> (Bot, mpsc::UnboundedReceiver<Value>) {
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    let stub = TelegramStub {
        delivered: Arc::new(AtomicBool::new(false)),
        sent: sent_tx,
    };
    let addr = common::spawn_app(
        Router::new()
            .route("/botTEST/:method", any(telegram_method))
            .with_state(stub),
    )
    .await;
    let api_url = format!("http://{}", addr)
        .parse()
        .expect("stub address is a valid URL");
    (Bot::new("TEST").set_api_url(api_url), sent_rx)
}

async fn next_reply(
    sent: &mut mpsc::UnboundedReceiver<Value>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let reply = tokio::time::timeout(Duration::from_secs(5), sent.recv()).await?;
    Ok(reply.ok_or("telegram stub closed")?)
}

#[tokio::test]
async fn test_poll_loop_replies_in_order_and_stops() -> Result<(), Box<dyn std::error::Error>> {
    common::init();
    let (telegram, mut sent_rx) = telegram_stub().await;
    let analysis = analysis_stub(Router::new().route("/api/get_analysis", get(echo))).await;

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(bot::run_until(telegram, analysis, async {
        let _ = stop_rx.await;
    }));

    let first = next_reply(&mut sent_rx).await?;
    let second = next_reply(&mut sent_rx).await?;

    assert_eq!(first["chat_id"], 42);
    assert_eq!(first["text"], GREETING);
    assert_eq!(first["reply_parameters"]["message_id"], 1);
    assert_eq!(second["text"], "echo: great movie");
    assert_eq!(second["reply_parameters"]["message_id"], 3);

    let _ = stop_tx.send(());
    tokio::time::timeout(Duration::from_secs(5), handle).await??;

    // The photo got no reply
    assert!(sent_rx.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn test_idle_chat_worker_exits_and_restarts() -> Result<(), Box<dyn std::error::Error>> {
    common::init();
    let (telegram, mut sent_rx) = telegram_stub().await;
    let analysis = analysis_stub(Router::new().route("/api/get_analysis", get(echo))).await;
    let mut router = ChatRouter::new(telegram, analysis, Duration::from_millis(100));

    router.dispatch(text_update(1, 1, "great movie")?);
    assert_eq!(router.active_chats(), 1);
    assert_eq!(next_reply(&mut sent_rx).await?["text"], "echo: great movie");

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(router.active_chats(), 0);

    router.dispatch(text_update(2, 2, "boring plot")?);
    let reply = next_reply(&mut sent_rx).await?;
    assert_eq!(reply["text"], "echo: boring plot");
    assert_eq!(reply["reply_parameters"]["message_id"], 2);
    Ok(())
}
