use serde_json::json;
use serde_json::Value;

use crate::helpers::spawn_app;
use crate::helpers::spawn_app_with;
use crate::helpers::FakeTransport;

#[tokio::test]
async fn preview_shows_sandbox_message() {
    let app = spawn_app().await;

    let resp = app
        .post_contact(&json!({
            "name": "Jo",
            "email": "jo@example.com",
            "message": "line one\n<b>line two</b>",
        }))
        .await;
    let body: Value = resp.json().await.unwrap();
    let url = body["previewUrl"].as_str().unwrap();

    // derived from the bound port, since no base_url is configured
    let prefix = format!("http://127.0.0.1:{}/api/preview/", app.port);
    assert!(url.starts_with(&prefix), "{url}");

    let resp = app.api_client.get(url).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert!(resp.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));

    let page = resp.text().await.unwrap();
    assert!(page.contains("New message from portfolio — Jo"));
    assert!(page.contains("line one<br>&lt;b&gt;line two&lt;/b&gt;"));
}

#[tokio::test]
async fn unknown_preview() {
    let app = spawn_app().await;

    for path in [
        "/api/preview/not-a-uuid",
        "/api/preview/00000000-0000-0000-0000-000000000000",
    ] {
        let resp = app.get(path).await;
        assert_eq!(resp.status().as_u16(), 404, "{path}");
    }
}

#[tokio::test]
async fn no_previews_without_sandbox() {
    let app = spawn_app_with(FakeTransport::working()).await;

    let resp = app
        .get("/api/preview/00000000-0000-0000-0000-000000000000")
        .await;
    assert_eq!(resp.status().as_u16(), 404);
}
