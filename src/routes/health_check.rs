use actix_web::HttpResponse;
use chrono::Utc;
use serde_json::json;

/// `GET /api/health`
///
/// Used by the frontend (and uptime checks) to see whether the API is up at
/// all; does not touch the mail transport.
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "ok": true, "ts": Utc::now().timestamp_millis() }))
}
