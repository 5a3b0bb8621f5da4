use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use portfolio_contact::configuration::get_configuration;
use portfolio_contact::configuration::Settings;
use portfolio_contact::email_client::MailTransport;
use portfolio_contact::email_client::OutboundEmail;
use portfolio_contact::email_client::SendError;
use portfolio_contact::email_client::SendReceipt;
use portfolio_contact::email_client::TransportError;
use portfolio_contact::startup::Application;
use portfolio_contact::telemetry::get_subscriber;
use portfolio_contact::telemetry::init_subscriber;

/// Init the tracing subscriber once only.
///
/// To opt in to verbose logging, use the env var `TEST_LOG`:
///
/// ```sh
///      TEST_LOG=true cargo test [test_name] | bunyan
/// ```
static TRACING: Lazy<()> = Lazy::new(|| {
    // the two sinks are different closure types, hence the duplicated arms
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::stdout);
            init_subscriber(subscriber);
        }
        Err(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::sink);
            init_subscriber(subscriber);
        }
    };
});

pub const CONTACT_TO: &str = "owner@example.com";

pub struct TestApp {
    pub addr: String,
    pub port: u16,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_contact(
        &self,
        body: &serde_json::Value,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/contact", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn get(
        &self,
        path: &str,
    ) -> reqwest::Response {
        self.api_client
            .get(format!("{}{path}", self.addr))
            .send()
            .await
            .expect("execute request")
    }
}

/// Records everything it is asked to send. Can be told to fail either step.
#[derive(Clone, Default)]
pub struct FakeTransport {
    fail_verify: bool,
    fail_send: bool,
    verified: Arc<AtomicUsize>,
    sent: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl FakeTransport {
    pub fn working() -> Self { Self::default() }

    pub fn failing_verify() -> Self {
        Self {
            fail_verify: true,
            ..Self::default()
        }
    }

    pub fn failing_send() -> Self {
        Self {
            fail_send: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> { self.sent.lock().unwrap().clone() }

    pub fn verify_calls(&self) -> usize { self.verified.load(Ordering::SeqCst) }
}

#[async_trait]
impl MailTransport for FakeTransport {
    async fn verify(&self) -> Result<(), TransportError> {
        self.verified.fetch_add(1, Ordering::SeqCst);
        match self.fail_verify {
            true => Err(TransportError::Refused),
            false => Ok(()),
        }
    }

    async fn send(
        &self,
        email: OutboundEmail,
    ) -> Result<SendReceipt, SendError> {
        if self.fail_send {
            return Err(SendError::Rejected(
                "535 5.7.8 authentication credentials invalid".to_string(),
            ));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(email);
        Ok(SendReceipt {
            message_id: format!("<{}@example.com>", sent.len()),
            preview_url: None,
        })
    }

    fn name(&self) -> &'static str { "fake" }
}

/// Default config, but on a random port, and with every SMTP setting cleared
/// regardless of what the environment says
fn test_configuration() -> Settings {
    let mut cfg = get_configuration().expect("load configuration");

    // port 0 is reserved by the OS; the server will be spawned on an address with a
    // random available port
    cfg.application.host = "127.0.0.1".to_string();
    cfg.application.port = 0;
    cfg.application.base_url = None;
    cfg.application.allowed_origin = None;

    cfg.email.host = None;
    cfg.email.username = None;
    cfg.email.password = None;
    cfg.email.contact_to = CONTACT_TO.to_string();
    cfg
}

async fn launch(app: Application) -> TestApp {
    let port = app.get_port();
    tokio::spawn(app.run_until_stopped());

    TestApp {
        addr: format!("http://127.0.0.1:{port}"),
        port,
        api_client: reqwest::Client::new(),
    }
}

/// Spawn the app exactly as `main` would with no SMTP credentials, i.e. with
/// the sandbox transport
pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);
    let app = Application::build(test_configuration()).await.unwrap();
    launch(app).await
}

/// Spawn the app with `transport` in place of SMTP
pub async fn spawn_app_with(transport: FakeTransport) -> TestApp {
    Lazy::force(&TRACING);
    let app = Application::build_with_transport(test_configuration(), Arc::new(transport))
        .await
        .unwrap();
    launch(app).await
}

/// Spawn the app with a working fake transport, restricting CORS to
/// `allowed_origin` (or allowing any origin if `None`)
pub async fn spawn_app_with_origin(allowed_origin: Option<&str>) -> TestApp {
    Lazy::force(&TRACING);
    let mut cfg = test_configuration();
    cfg.application.allowed_origin = allowed_origin.map(str::to_string);
    let app = Application::build_with_transport(cfg, Arc::new(FakeTransport::working()))
        .await
        .unwrap();
    launch(app).await
}
