use std::net::TcpListener;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::dev::ServerHandle;
use actix_web::error::InternalError;
use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use tracing_actix_web::TracingLogger;

use crate::configuration::EmailSettings;
use crate::configuration::Settings;
use crate::delivery::ContactService;
use crate::email_client::MailTransport;
use crate::email_client::SandboxTransport;
use crate::email_client::SmtpTransport;
use crate::routes::contact;
use crate::routes::health_check;
use crate::routes::preview;
use crate::utils::json_error;

/// How long in-flight requests get to finish after a shutdown signal
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Bind, pick a mail transport from `cfg.email`, and build the `Server`
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let listener = bind(&cfg)?;
        let port = listener.local_addr()?.port();

        let (transport, sandbox) =
            select_transport(&cfg.email, &cfg.application.public_url(port))?;

        Self::from_listener(cfg, listener, transport, Previews(sandbox))
    }

    /// Like `build`, but with a caller-provided transport (the configured SMTP
    /// settings are ignored). Preview links are not served.
    pub async fn build_with_transport(
        cfg: Settings,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, anyhow::Error> {
        let listener = bind(&cfg)?;
        Self::from_listener(cfg, listener, transport, Previews(None))
    }

    fn from_listener(
        cfg: Settings,
        listener: TcpListener,
        transport: Arc<dyn MailTransport>,
        previews: Previews,
    ) -> Result<Self, anyhow::Error> {
        // get the port assigned by OS (if the configured port was 0)
        let port = listener.local_addr()?.port();

        if cfg.email.uses_fallback_destination() {
            tracing::warn!(
                contact_to = %cfg.email.contact_to,
                "no destination configured (CONTACT_TO); using the fallback inbox"
            );
        }

        if cfg.application.allowed_origin.is_none() {
            tracing::warn!("no allowed_origin configured; CORS allows any origin");
        }

        let service = ContactService::new(
            transport,
            cfg.email.sender(),
            cfg.email.contact_to.clone(),
            cfg.email.timeout(),
        );

        let server = run(listener, service, previews, cfg.application.allowed_origin)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// For stopping the server from another task (see `main`)
    pub fn handle(&self) -> ServerHandle { self.server.handle() }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

fn bind(cfg: &Settings) -> Result<TcpListener, std::io::Error> {
    let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
    TcpListener::bind(addr)
}

/// Wrapper for the sandbox mailbox, if there is one (because a bare `Option`
/// passed around by `Data` says nothing about what it holds)
pub struct Previews(pub Option<SandboxTransport>);

/// SMTP if every credential is present, otherwise the in-process sandbox. The
/// sandbox is also returned separately so its mailbox can be served.
pub fn select_transport(
    cfg: &EmailSettings,
    public_url: &str,
) -> Result<(Arc<dyn MailTransport>, Option<SandboxTransport>), anyhow::Error> {
    match cfg.smtp() {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, secure = smtp.secure, "using SMTP transport");
            let transport = SmtpTransport::new(&smtp, cfg.timeout())?;
            Ok((Arc::new(transport), None))
        }
        None => {
            tracing::warn!(
                "SMTP env missing (SMTP_HOST/SMTP_USER/SMTP_PASS); using the sandbox transport, \
                 messages will NOT be delivered"
            );
            let sandbox = SandboxTransport::new(public_url);
            Ok((Arc::new(sandbox.clone()), Some(sandbox)))
        }
    }
}

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Declares all API endpoints. OS signals are not handled here; the caller
/// decides when to stop (see `Application::handle`).
pub fn run(
    listener: TcpListener,
    service: ContactService,
    previews: Previews,
    allowed_origin: Option<String>,
) -> Result<Server, anyhow::Error> {
    // `Data` is externally an `Arc` (for sharing/cloning), internally a `HashMap`
    // (for wrapping arbitrary types)
    let service = web::Data::new(service);
    let previews = web::Data::new(previews);

    // every worker runs its own copy of the `App` built by this closure, which is
    // why everything moved in has to be cloneable
    let server = HttpServer::new(move || {
        let cors = match &allowed_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allowed_methods(vec!["GET", "POST"])
                .allowed_header(header::CONTENT_TYPE)
                .max_age(3600),
            None => Cors::permissive(),
        };

        // malformed JSON gets the same `{"error": ...}` shape as everything else
        let json_cfg = web::JsonConfig::default().error_handler(|err, _req| {
            let resp = json_error(StatusCode::BAD_REQUEST, "Invalid request body.");
            InternalError::from_response(err, resp).into()
        });

        App::new()
            .wrap(cors)
            .wrap(TracingLogger::default())
            .route("/api/health", web::get().to(health_check))
            .route("/api/contact", web::post().to(contact))
            .route("/api/preview/{id}", web::get().to(preview))
            .app_data(json_cfg)
            .app_data(service.clone())
            .app_data(previews.clone())
    })
    .disable_signals()
    .shutdown_timeout(SHUTDOWN_TIMEOUT_SECS)
    .listen(listener)?
    .run();

    Ok(server)
}
