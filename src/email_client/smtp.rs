use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::Tls;
use lettre::transport::smtp::client::TlsParameters;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;
use secrecy::ExposeSecret;
use uuid::Uuid;

use super::MailTransport;
use super::OutboundEmail;
use super::SendError;
use super::SendReceipt;
use super::TransportError;
use crate::configuration::SmtpSettings;

/// Delivers through a real SMTP server.
///
/// Establishing a connection (TLS handshake + AUTH) is expensive, so a single
/// transport is built at startup and shared; lettre pools the connections
/// underneath.
pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl SmtpTransport {
    pub fn new(
        settings: &SmtpSettings,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let tls_parameters = TlsParameters::new(settings.host.clone())?;
        let tls = match settings.secure {
            true => Tls::Wrapper(tls_parameters),
            // like most mail clients, upgrade if the server offers STARTTLS, but don't
            // insist on it
            false => Tls::Opportunistic(tls_parameters),
        };

        // `builder_dangerous` only means "no TLS preset"; TLS is set explicitly above
        let inner = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            .port(settings.port)
            .tls(tls)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.expose_secret().clone(),
            ))
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            inner,
            host: settings.host.clone(),
        })
    }
}

fn mailbox(address: &str) -> Result<Mailbox, SendError> {
    address
        .parse()
        .map_err(|e| SendError::Address(address.to_string(), e))
}

/// Build the MIME message; this is where malformed addresses surface
fn build_message(email: OutboundEmail) -> Result<(Message, String), SendError> {
    let from = mailbox(&email.from)?;
    let message_id = format!("<{}@{}>", Uuid::new_v4(), from.email.domain());

    let message = Message::builder()
        .message_id(Some(message_id.clone()))
        .from(from)
        .to(mailbox(&email.to)?)
        .reply_to(mailbox(&email.reply_to)?)
        .subject(email.subject)
        .multipart(MultiPart::alternative_plain_html(
            email.text_body,
            email.html_body,
        ))?;

    Ok((message, message_id))
}

#[async_trait]
impl MailTransport for SmtpTransport {
    #[tracing::instrument(name = "Verifying SMTP connection", skip(self), fields(host = %self.host))]
    async fn verify(&self) -> Result<(), TransportError> {
        self.inner
            .test_connection()
            .await?
            .then_some(())
            .ok_or(TransportError::Refused)
    }

    #[tracing::instrument(name = "Sending over SMTP", skip_all, fields(host = %self.host))]
    async fn send(
        &self,
        email: OutboundEmail,
    ) -> Result<SendReceipt, SendError> {
        let (message, message_id) = build_message(email)?;
        let response = self.inner.send(message).await?;

        if !response.is_positive() {
            let text = response.message().collect::<Vec<_>>().join(" ");
            return Err(SendError::Rejected(format!("{} {text}", response.code())));
        }

        Ok(SendReceipt {
            message_id,
            preview_url: None,
        })
    }

    fn name(&self) -> &'static str { "smtp" }
}
