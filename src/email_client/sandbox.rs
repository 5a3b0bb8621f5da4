use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::MailTransport;
use super::OutboundEmail;
use super::SendError;
use super::SendReceipt;
use super::TransportError;

/// Oldest messages are dropped beyond this
const MAILBOX_CAPACITY: usize = 100;

/// A message "sent" through the sandbox
#[derive(Debug, Clone)]
pub struct StoredEmail {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
    pub email: OutboundEmail,
}

impl StoredEmail {
    /// Standalone HTML page showing the headers and the html part
    pub fn render_html(&self) -> String {
        let e = &self.email;
        format!(
            "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{subject}</title></head><body>\n\
             <p>Sandbox message - nothing was delivered.</p>\n\
             <table>\n\
             <tr><th>From</th><td>{from}</td></tr>\n\
             <tr><th>To</th><td>{to}</td></tr>\n\
             <tr><th>Reply-To</th><td>{reply_to}</td></tr>\n\
             <tr><th>Subject</th><td>{subject}</td></tr>\n\
             <tr><th>Received</th><td>{received}</td></tr>\n\
             </table>\n<hr>\n{body}\n</body></html>\n",
            from = htmlescape::encode_minimal(&e.from),
            to = htmlescape::encode_minimal(&e.to),
            reply_to = htmlescape::encode_minimal(&e.reply_to),
            subject = htmlescape::encode_minimal(&e.subject),
            received = self.received_at.to_rfc3339(),
            // already escaped when composed
            body = e.html_body,
        )
    }
}

/// Disposable transport for running the contact flow without SMTP
/// credentials. Nothing leaves the process: messages are kept in a small
/// in-memory mailbox, and each receipt carries a link to
/// `/api/preview/{id}` where the message can be inspected.
///
/// Clones share the same mailbox.
#[derive(Clone)]
pub struct SandboxTransport {
    base_url: String,
    mailbox: Arc<RwLock<VecDeque<StoredEmail>>>,
}

impl SandboxTransport {
    /// `base_url` is the public address of this server
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            mailbox: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    pub fn preview_url(
        &self,
        id: Uuid,
    ) -> String {
        format!("{}/api/preview/{id}", self.base_url)
    }

    pub async fn get(
        &self,
        id: Uuid,
    ) -> Option<StoredEmail> {
        self.mailbox
            .read()
            .await
            .iter()
            .find(|stored| stored.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize { self.mailbox.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.len().await == 0 }
}

#[async_trait]
impl MailTransport for SandboxTransport {
    async fn verify(&self) -> Result<(), TransportError> { Ok(()) }

    async fn send(
        &self,
        email: OutboundEmail,
    ) -> Result<SendReceipt, SendError> {
        let id = Uuid::new_v4();
        let stored = StoredEmail {
            id,
            received_at: Utc::now(),
            email,
        };

        let mut mailbox = self.mailbox.write().await;
        if mailbox.len() == MAILBOX_CAPACITY {
            mailbox.pop_front();
        }
        mailbox.push_back(stored);

        Ok(SendReceipt {
            message_id: format!("<{id}@sandbox.invalid>"),
            preview_url: Some(self.preview_url(id)),
        })
    }

    fn name(&self) -> &'static str { "sandbox" }
}
