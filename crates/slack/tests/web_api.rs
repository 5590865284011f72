use std::sync::{Arc, Mutex};

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use orderwatch_slack::blocks::not_found_message;
use orderwatch_slack::web::{ReplyPoster, SlackApiError, SlackWebClient};
use serde_json::{json, Value};

#[derive(Clone)]
struct SlackApi {
    response: Value,
    seen: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

async fn post_message(
    State(api): State<SlackApi>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> Json<Value> {
    api.seen.lock().expect("seen lock").push((
        "chat.postMessage".to_owned(),
        bearer(&headers),
        request,
    ));
    Json(api.response.clone())
}

async fn connections_open(State(api): State<SlackApi>, headers: HeaderMap) -> Json<Value> {
    api.seen.lock().expect("seen lock").push((
        "apps.connections.open".to_owned(),
        bearer(&headers),
        Value::Null,
    ));
    Json(api.response.clone())
}

async fn serve(api: SlackApi) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr");
    let app = Router::new()
        .route("/api/chat.postMessage", post(post_message))
        .route("/api/apps.connections.open", post(connections_open))
        .with_state(api);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{address}/api/")
}

fn api(response: Value) -> SlackApi {
    SlackApi { response, seen: Arc::new(Mutex::new(Vec::new())) }
}

#[tokio::test]
async fn posts_threaded_reply_with_text_and_blocks() {
    let api = api(json!({ "ok": true, "ts": "1760600001.000200" }));
    let seen = api.seen.clone();
    let client = SlackWebClient::new(serve(api).await, "xoxb-test".to_owned().into());

    client
        .post_reply("C-ORDERS", "1760600000.000100", &not_found_message("#S1001"))
        .await
        .expect("post reply");

    let requests = seen.lock().expect("seen lock").clone();
    assert_eq!(requests.len(), 1);
    let (method, auth, body) = &requests[0];
    assert_eq!(method, "chat.postMessage");
    assert_eq!(auth.as_deref(), Some("Bearer xoxb-test"));
    assert_eq!(body["channel"], "C-ORDERS");
    assert_eq!(body["thread_ts"], "1760600000.000100");
    assert_eq!(body["text"], "Order #S1001 not found");
    assert_eq!(body["blocks"][0]["type"], "section");
}

#[tokio::test]
async fn ok_false_is_an_api_error() {
    let client = SlackWebClient::new(
        serve(api(json!({ "ok": false, "error": "channel_not_found" }))).await,
        "xoxb-test".to_owned().into(),
    );

    let result = client.post_reply("C-GONE", "1.2", &not_found_message("#S1001")).await;

    assert_eq!(result, Err(SlackApiError::Api("channel_not_found".to_owned())));
}

#[tokio::test]
async fn opens_socket_url_with_app_token() {
    let api = api(json!({ "ok": true, "url": "wss://wss-primary.slack.com/link/?ticket=abc" }));
    let seen = api.seen.clone();
    let client = SlackWebClient::new(serve(api).await, "xoxb-test".to_owned().into());

    let url = client.open_socket_url(&"xapp-test".to_owned().into()).await.expect("socket url");

    assert_eq!(url, "wss://wss-primary.slack.com/link/?ticket=abc");
    let requests = seen.lock().expect("seen lock").clone();
    assert_eq!(requests[0].1.as_deref(), Some("Bearer xapp-test"));
}
