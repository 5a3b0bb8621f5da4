use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use anyhow::Context;
use tokio::time::timeout;

use crate::domain::ContactSubmission;
use crate::email_client::MailTransport;
use crate::email_client::OutboundEmail;
use crate::utils::error_chain_fmt;

/// Display name used in the `From` header
const SENDER_NAME: &str = "Portfolio Contact";

/// A message that was accepted by the mail backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub message_id: String,
    /// Only set when the sandbox transport was used
    pub preview_url: Option<String>,
}

/// The strings displayed here are returned to the browser verbatim; anything
/// sensitive goes into the `#[source]` chain, which is only ever logged.
#[derive(thiserror::Error)]
pub enum ContactError {
    #[error("{0}")]
    ValidationError(String),
    #[error("SMTP connection/credentials problem. Check server logs.")]
    TransportUnavailable(#[source] anyhow::Error),
    #[error("Server error while sending message. Check server logs.")]
    DeliveryFailed(#[source] anyhow::Error),
}

impl Debug for ContactError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)?;
        Ok(())
    }
}

/// Exactly one of these per submission
pub type DeliveryOutcome = Result<Delivered, ContactError>;

/// Relays contact submissions to a fixed inbox. Built once at startup, from
/// captured configuration, and shared by all workers.
pub struct ContactService {
    transport: Arc<dyn MailTransport>,
    sender: String,
    recipient: String,
    timeout: Duration,
}

impl ContactService {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        sender: String,
        recipient: String,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            sender,
            recipient,
            timeout,
        }
    }

    /// Build the email for a submission. Pure; nothing is sent.
    pub fn compose(
        &self,
        submission: &ContactSubmission,
    ) -> OutboundEmail {
        let name = submission.name.as_ref();
        let email = submission.email.as_ref();
        let message = submission.message.as_ref();

        let html_message = htmlescape::encode_minimal(message)
            .replace("\r\n", "\n")
            .replace('\n', "<br>");

        OutboundEmail {
            from: format!(r#""{SENDER_NAME}" <{}>"#, self.sender),
            to: self.recipient.clone(),
            reply_to: email.to_string(),
            subject: format!(
                "New message from portfolio — {}",
                submission.name.or_anonymous()
            ),
            text_body: format!("Name: {name}\nEmail: {email}\n\nMessage:\n{message}"),
            html_body: format!(
                "<p><strong>Name:</strong> {}</p>\n\
                 <p><strong>Email:</strong> {}</p>\n\
                 <p><strong>Message:</strong></p><p>{html_message}</p>",
                htmlescape::encode_minimal(name),
                htmlescape::encode_minimal(email),
            ),
        }
    }

    /// Verify the transport, then send. Both steps are bounded by `timeout`;
    /// a verification timeout counts as the transport being unavailable, a
    /// send timeout as a failed delivery. Nothing is retried.
    #[tracing::instrument(
        name = "Delivering contact message",
        skip_all,
        fields(transport = self.transport.name())
    )]
    pub async fn deliver(
        &self,
        submission: ContactSubmission,
    ) -> DeliveryOutcome {
        self.verify().await.map_err(|e| {
            tracing::error!(
                error.cause_chain=?e,
                error.message=%e,
                "SMTP verify failed"
            );
            ContactError::TransportUnavailable(e)
        })?;
        tracing::info!("SMTP connection verified.");

        let email = self.compose(&submission);
        let delivered = self.send(email).await.map_err(|e| {
            tracing::error!(
                error.cause_chain=?e,
                error.message=%e,
                "sendMail failed"
            );
            ContactError::DeliveryFailed(e)
        })?;

        tracing::info!(message_id = %delivered.message_id, "Message sent");
        if let Some(preview_url) = &delivered.preview_url {
            tracing::info!(preview_url = %preview_url, "Preview URL");
        }
        Ok(delivered)
    }

    async fn verify(&self) -> Result<(), anyhow::Error> {
        timeout(self.timeout, self.transport.verify())
            .await
            .map_err(|_| anyhow!("verification timed out after {:?}", self.timeout))?
            .context("could not verify mail transport")
    }

    async fn send(
        &self,
        email: OutboundEmail,
    ) -> Result<Delivered, anyhow::Error> {
        let receipt = timeout(self.timeout, self.transport.send(email))
            .await
            .map_err(|_| anyhow!("send timed out after {:?}", self.timeout))?
            .context("could not send contact message")?;
        Ok(Delivered {
            message_id: receipt.message_id,
            preview_url: receipt.preview_url,
        })
    }
}
