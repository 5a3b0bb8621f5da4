use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::delivery::ContactError;
use crate::delivery::ContactService;
use crate::domain::ContactEmail;
use crate::domain::ContactMessage;
use crate::domain::ContactName;
use crate::domain::ContactSubmission;
use crate::utils::json_error;

/// Raw JSON body of `POST /api/contact`. Fields are kept as arbitrary JSON at
/// this stage, so that a missing or non-string email gets the same answer as an
/// invalid one (and likewise for the message).
#[derive(Deserialize)]
pub struct ContactFormData {
    name: Option<Value>,
    email: Option<Value>,
    message: Option<Value>,
}

/// Only JSON strings count as text; anything else is treated as absent
fn text(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

// the client validates too, but nothing it sends is trusted: email is checked
// first, then message, and the first failure wins
impl TryFrom<ContactFormData> for ContactSubmission {
    type Error = ContactError;
    fn try_from(value: ContactFormData) -> Result<Self, Self::Error> {
        let email = text(value.email)
            .ok_or_else(|| "missing email".to_string())
            .and_then(ContactEmail::parse)
            .map_err(|_| ContactError::ValidationError("Invalid or missing sender email.".into()))?;
        let message = text(value.message)
            .ok_or_else(|| "missing message".to_string())
            .and_then(ContactMessage::parse)
            .map_err(|_| ContactError::ValidationError("Message cannot be empty.".into()))?;

        Ok(ContactSubmission {
            name: ContactName::parse(text(value.name)),
            email,
            message,
        })
    }
}

impl ResponseError for ContactError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::TransportUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::DeliveryFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // supersedes the default plain-text body
    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        json_error(self.status_code(), &self.to_string())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContactResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    preview_url: Option<String>,
}

/// `POST /api/contact`
///
/// Relays a contact form submission to the configured inbox.
///
/// # Request example
///
/// ```sh
///     curl -v -H 'Content-Type: application/json' \
///         --data '{"name":"Jo","email":"jo@example.com","message":"Hello"}' \
///         http://127.0.0.1:4000/api/contact
/// ```
///
/// # Responses
///
/// - 200 `{"ok":true}`, or `{"ok":true,"previewUrl":"..."}` in sandbox mode
/// - 400 `{"error":"Invalid or missing sender email."}`
/// - 400 `{"error":"Message cannot be empty."}`
/// - 502 when the mail transport cannot be verified
/// - 500 when the message could not be sent
#[tracing::instrument(
    name = "Relaying contact message",
    skip(body, service),
    fields(
        sender_email = ?body.email,
        sender_name = ?body.name,
    )
)]
pub async fn contact(
    body: web::Json<ContactFormData>,
    service: web::Data<ContactService>,
) -> Result<HttpResponse, ContactError> {
    let submission: ContactSubmission = body.0.try_into().map_err(|e| {
        tracing::warn!(error.message=%e, "rejected contact submission");
        e
    })?;

    let delivered = service.deliver(submission).await?;

    Ok(HttpResponse::Ok().json(ContactResponse {
        ok: true,
        preview_url: delivered.preview_url,
    }))
}
