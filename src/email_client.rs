//! Everything needed to hand a composed email to something that delivers it.
//!
//! `MailTransport` is the seam between the contact flow and the outside world:
//! `SmtpTransport` talks to a real mail server, `SandboxTransport` keeps
//! messages in memory so the flow can be exercised locally, and tests plug in
//! their own fakes.

mod sandbox;
mod smtp;

use async_trait::async_trait;
pub use sandbox::SandboxTransport;
pub use sandbox::StoredEmail;
pub use smtp::SmtpTransport;

/// A fully composed message. Addresses are kept as strings (`"Name" <a@b.c>`
/// or `a@b.c`); each transport parses them into whatever it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Proof that the backend accepted a message
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub message_id: String,
    /// Only set by transports that don't actually deliver anything
    pub preview_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("mail server did not accept the connection check")]
    Refused,
    #[error(transparent)]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("invalid mailbox {0:?}")]
    Address(String, #[source] lettre::address::AddressError),
    #[error("could not build message")]
    Build(#[from] lettre::error::Error),
    #[error(transparent)]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("mail server did not accept the message: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Connect (and authenticate, where applicable) without sending anything
    async fn verify(&self) -> Result<(), TransportError>;

    async fn send(
        &self,
        email: OutboundEmail,
    ) -> Result<SendReceipt, SendError>;

    /// Short label for log lines
    fn name(&self) -> &'static str;
}
