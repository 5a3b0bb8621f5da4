//! Client side of the contact form: field state, local validation, the
//! submission request, and what the form should display afterwards.
//!
//! The status is a small state machine:
//!
//! ```text
//!     Idle --submit--> Sending --2xx--> Success
//!       ^                 |
//!       |                 +--error/network--> Error
//!       +---- new input (from Success or Error)
//! ```
//!
//! Local validation failures go straight to `Error` without a request.

use serde::Deserialize;
use serde::Serialize;

use crate::domain::is_valid_email;

const INVALID_EMAIL: &str = "Please enter a valid email address.";
const BLANK_MESSAGE: &str = "Message cannot be blank.";
const SEND_FAILED: &str = "Failed to send message.";
const NETWORK_ERROR: &str = "Network error. Try again later.";

/// Where the form currently is. Only `Error` carries text, so the form can
/// never show a success notice and an error at the same time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormStatus {
    #[default]
    Idle,
    Sending,
    Success,
    Error(String),
}

/// Things that happen to the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// Any field was changed
    Edited,
    /// Local validation failed
    Rejected(String),
    /// Request sent
    Submitted,
    /// Server accepted the message
    Succeeded,
    /// Server refused, or the request never completed
    Failed(String),
}

impl FormStatus {
    pub fn transition(
        self,
        event: FormEvent,
    ) -> Self {
        match (self, event) {
            // a request is in flight: only its result can move us on
            (Self::Sending, FormEvent::Succeeded) => Self::Success,
            (Self::Sending, FormEvent::Failed(msg)) => Self::Error(msg),
            (Self::Sending, _) => Self::Sending,

            (_, FormEvent::Edited) => Self::Idle,
            (_, FormEvent::Rejected(msg)) => Self::Error(msg),
            (_, FormEvent::Submitted) => Self::Sending,

            // a response without a request
            (status, FormEvent::Succeeded | FormEvent::Failed(_)) => status,
        }
    }

    /// The line shown under the form, if any
    pub fn notice(&self) -> Option<&str> {
        match self {
            Self::Error(msg) => Some(msg.as_str()),
            Self::Success => Some("Message sent - thanks!"),
            Self::Idle | Self::Sending => None,
        }
    }
}

/// The three inputs of the form; also the request body (after trimming)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactFields {
    fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }

    /// Same checks as the server, but with friendlier wording
    fn validate(&self) -> Result<(), &'static str> {
        if !is_valid_email(&self.email) {
            return Err(INVALID_EMAIL);
        }
        if self.message.trim().is_empty() {
            return Err(BLANK_MESSAGE);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Message,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub struct ContactForm {
    http_client: reqwest::Client,
    /// e.g. `http://localhost:4000`; `/api/contact` is appended
    base_url: String,
    fields: ContactFields,
    status: FormStatus,
}

impl ContactForm {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            fields: ContactFields::default(),
            status: FormStatus::Idle,
        }
    }

    pub fn fields(&self) -> &ContactFields { &self.fields }

    pub fn status(&self) -> &FormStatus { &self.status }

    pub fn set(
        &mut self,
        field: Field,
        value: impl Into<String>,
    ) {
        let value = value.into();
        match field {
            Field::Name => self.fields.name = value,
            Field::Email => self.fields.email = value,
            Field::Message => self.fields.message = value,
        }
        self.apply(FormEvent::Edited);
    }

    /// The submit button is disabled while a request is in flight
    pub fn can_submit(&self) -> bool { self.status != FormStatus::Sending }

    pub fn submit_label(&self) -> &'static str {
        match self.status {
            FormStatus::Sending => "Sending...",
            _ => "Send",
        }
    }

    fn apply(
        &mut self,
        event: FormEvent,
    ) {
        self.status = std::mem::take(&mut self.status).transition(event);
    }

    /// First half of a submission: validate locally and, if that passes, move
    /// to `Sending` and return the (trimmed) request body.
    ///
    /// Returns `None` if nothing should be sent, either because validation
    /// failed (the status says why) or because a request is already in flight.
    pub fn begin_submit(&mut self) -> Option<ContactFields> {
        if !self.can_submit() {
            return None;
        }
        if let Err(msg) = self.fields.validate() {
            self.apply(FormEvent::Rejected(msg.to_string()));
            return None;
        }
        self.apply(FormEvent::Submitted);
        Some(self.fields.trimmed())
    }

    /// Second half of a submission: record the result of the request. Fields
    /// are only cleared on success.
    pub fn finish_submit(
        &mut self,
        result: Result<(), String>,
    ) {
        match result {
            Ok(()) => {
                self.apply(FormEvent::Succeeded);
                self.fields = ContactFields::default();
            }
            Err(msg) => self.apply(FormEvent::Failed(msg)),
        }
    }

    /// Validate, send, and record the result; at most one request is made.
    pub async fn submit(&mut self) -> &FormStatus {
        if let Some(body) = self.begin_submit() {
            let result = self.post(&body).await;
            self.finish_submit(result);
        }
        &self.status
    }

    #[tracing::instrument(name = "Submitting contact form", skip_all)]
    async fn post(
        &self,
        body: &ContactFields,
    ) -> Result<(), String> {
        let resp = self
            .http_client
            .post(format!("{}/api/contact", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error.cause_chain=?e, "Contact submit error");
                NETWORK_ERROR.to_string()
            })?;

        if resp.status().is_success() {
            return Ok(());
        }

        // prefer the server's own explanation
        let server_error = resp.json::<ErrorBody>().await.ok().and_then(|b| b.error);
        Err(server_error.unwrap_or_else(|| SEND_FAILED.to_string()))
    }
}
