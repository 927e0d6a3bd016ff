//! HTTP API over a real socket

mod common;

use common::{answering, app_context};
use faqrag::answer::THANKS_REPLY;
use faqrag::server::{serve_on, AskResponse};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_http_endpoints() {
    let temp = TempDir::new().unwrap();
    let (provider, _) = answering("Giá phần mềm kế toán từ 5 triệu đồng mỗi năm.");
    let ctx = Arc::new(app_context(temp.path(), vec![provider]));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve_on(listener, ctx.clone(), async move {
        let _ = stop_rx.await;
    }));

    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"ok": true}));

    let empty: Value = client
        .get(format!("{}/metrics", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(empty, json!({"counts": {}, "p95_latency": 0.0}));

    let thanks: AskResponse = client
        .post(format!("{}/ask", base))
        .json(&json!({"question": "cảm ơn"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(thanks.answer, THANKS_REPLY);
    assert!(thanks.sources.is_empty());

    let resp = client
        .post(format!("{}/ask", base))
        .json(&json!({"question": "Bảng giá phần mềm kế toán"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["answer"], "Giá phần mềm kế toán từ 5 triệu đồng mỗi năm.");
    let sources = body["sources"].as_array().unwrap();
    assert!(!sources.is_empty() && sources.len() <= 2);
    assert_eq!(sources[0], json!({"url": "https://mitek.vn/bang-gia", "title": "Bảng giá phần mềm"}));

    let blank = client
        .post(format!("{}/ask", base))
        .json(&json!({"question": "  "}))
        .send()
        .await
        .unwrap();
    assert_eq!(blank.status(), reqwest::StatusCode::BAD_REQUEST);
    let message: Value = blank.json().await.unwrap();
    assert!(message["message"].as_str().unwrap().contains("empty"));

    let missing_field = client
        .post(format!("{}/ask", base))
        .json(&json!({"q": "giá"}))
        .send()
        .await
        .unwrap();
    assert!(missing_field.status().is_client_error());

    let first: Value = client
        .get(format!("{}/metrics", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second: Value = client
        .get(format!("{}/metrics", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first["counts"], json!({"other": 1, "pricing": 1}));
    assert!(first["p95_latency"].as_f64().unwrap() >= 0.0);

    drop(client);
    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
