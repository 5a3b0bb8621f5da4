use serde_json::json;
use serde_json::Value;

use crate::helpers::spawn_app;
use crate::helpers::spawn_app_with;
use crate::helpers::FakeTransport;
use crate::helpers::CONTACT_TO;

async fn error_of(resp: reqwest::Response) -> String {
    let body: Value = resp.json().await.unwrap();
    body["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn contact_ok() {
    let transport = FakeTransport::working();
    let app = spawn_app_with(transport.clone()).await;

    let resp = app
        .post_contact(&json!({ "name": "Jo", "email": "jo@example.com", "message": "Hello" }))
        .await;

    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    // no previewUrl outside the sandbox
    assert_eq!(body, json!({ "ok": true }));

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, CONTACT_TO);
    assert_eq!(sent[0].reply_to, "jo@example.com");
    assert!(sent[0].subject.contains("Jo"));
    assert!(sent[0].text_body.contains("Hello"));
}

#[tokio::test]
async fn missing_name_is_anonymous() {
    let transport = FakeTransport::working();
    let app = spawn_app_with(transport.clone()).await;

    for body in [
        json!({ "email": "jo@example.com", "message": "Hello" }),
        json!({ "name": "   ", "email": "jo@example.com", "message": "Hello" }),
    ] {
        let resp = app.post_contact(&body).await;
        assert_eq!(resp.status().as_u16(), 200);
    }

    for email in transport.sent() {
        assert!(email.subject.ends_with("Anonymous"), "{}", email.subject);
    }
}

#[tokio::test]
async fn invalid_email() {
    let transport = FakeTransport::working();
    let app = spawn_app_with(transport.clone()).await;

    for (body, msg) in [
        (json!({ "name": "", "email": "bad-email", "message": "hi" }), "no at sign"),
        (json!({ "message": "hi" }), "missing email"),
        (json!({ "email": "", "message": "hi" }), "empty email"),
        (json!({ "email": "jo@localhost", "message": "hi" }), "no dot in domain"),
        (json!({ "email": "jo doe@example.com", "message": "hi" }), "whitespace"),
        (json!({ "email": 42, "message": "hi" }), "not a string"),
    ] {
        let resp = app.post_contact(&body).await;
        assert_eq!(resp.status().as_u16(), 400, "{msg}");
        assert_eq!(error_of(resp).await, "Invalid or missing sender email.", "{msg}");
    }

    // rejected before the transport is even touched
    assert_eq!(transport.verify_calls(), 0);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn blank_message() {
    let transport = FakeTransport::working();
    let app = spawn_app_with(transport.clone()).await;

    for (body, msg) in [
        (json!({ "name": "Jo", "email": "jo@example.com", "message": "  " }), "whitespace"),
        (json!({ "name": "Jo", "email": "jo@example.com", "message": "" }), "empty"),
        (json!({ "name": "Jo", "email": "jo@example.com" }), "missing"),
        (json!({ "name": "Jo", "email": "jo@example.com", "message": 42 }), "not a string"),
    ] {
        let resp = app.post_contact(&body).await;
        assert_eq!(resp.status().as_u16(), 400, "{msg}");
        assert_eq!(error_of(resp).await, "Message cannot be empty.", "{msg}");
    }

    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn malformed_body() {
    let app = spawn_app_with(FakeTransport::working()).await;

    let resp = app
        .api_client
        .post(format!("{}/api/contact", app.addr))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("execute request");

    assert_eq!(resp.status().as_u16(), 400);
    assert_eq!(error_of(resp).await, "Invalid request body.");
}

#[tokio::test]
async fn transport_unavailable() {
    let transport = FakeTransport::failing_verify();
    let app = spawn_app_with(transport.clone()).await;

    let resp = app
        .post_contact(&json!({ "name": "Jo", "email": "jo@example.com", "message": "Hello" }))
        .await;

    assert_eq!(resp.status().as_u16(), 502);
    assert_eq!(
        error_of(resp).await,
        "SMTP connection/credentials problem. Check server logs."
    );
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn delivery_failed_does_not_leak_provider_error() {
    let transport = FakeTransport::failing_send();
    let app = spawn_app_with(transport.clone()).await;

    let resp = app
        .post_contact(&json!({ "name": "Jo", "email": "jo@example.com", "message": "Hello" }))
        .await;

    assert_eq!(resp.status().as_u16(), 500);
    let error = error_of(resp).await;
    assert_eq!(error, "Server error while sending message. Check server logs.");
    assert!(!error.contains("535"));
    assert_eq!(transport.verify_calls(), 1);
}

#[tokio::test]
async fn concurrent_submissions() {
    let transport = FakeTransport::working();
    let app = spawn_app_with(transport.clone()).await;

    let first = json!({ "name": "A", "email": "a@example.com", "message": "one" });
    let second = json!({ "name": "B", "email": "b@example.com", "message": "two" });
    let (a, b) = tokio::join!(app.post_contact(&first), app.post_contact(&second));

    assert_eq!(a.status().as_u16(), 200);
    assert_eq!(b.status().as_u16(), 200);

    let mut reply_tos: Vec<_> = transport.sent().into_iter().map(|e| e.reply_to).collect();
    reply_tos.sort();
    assert_eq!(reply_tos, ["a@example.com", "b@example.com"]);
}

#[tokio::test]
async fn sandbox_returns_preview_url() {
    // no SMTP configuration at all
    let app = spawn_app().await;

    let resp = app
        .post_contact(&json!({ "name": "Jo", "email": "jo@example.com", "message": "Hello" }))
        .await;

    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert!(!body["previewUrl"].as_str().unwrap().is_empty());
}
