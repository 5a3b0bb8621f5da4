use std::fmt::Debug;
use std::fmt::Display;

use portfolio_contact::configuration::get_configuration;
use portfolio_contact::startup::Application;
use portfolio_contact::telemetry::get_subscriber;
use portfolio_contact::telemetry::init_subscriber;
use tokio::task::JoinError;

fn report_exit(
    name: &str,
    outcome: Result<Result<(), impl Debug + Display>, JoinError>,
) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{name} exited gracefully")
        }

        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain=?e,
                error.message=%e,
                "{name} failed (inner)"
            )
        }

        Err(e) => {
            tracing::error!(
                error.cause_chain=?e,
                error.message=%e,
                "{name} failed (outer)"
            )
        }
    }
}

/// Resolves on the first SIGINT (Ctrl+C) or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error.message=%e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error.message=%e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Load `.env`, initialise telemetry, load config, and serve until a shutdown
/// signal arrives
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // a missing .env is fine; real deployments set the environment directly
    dotenvy::dotenv().ok();

    let subscriber = get_subscriber("portfolio-contact", "info", std::io::stdout);
    init_subscriber(subscriber);

    let cfg = get_configuration()?;
    let host = cfg.application.host.clone();

    let app = Application::build(cfg).await?;
    tracing::info!("Server running: http://{host}:{}", app.get_port());

    // actix's own signal handling is disabled (see `startup::run`); SIGINT would
    // otherwise trigger a forced, rather than graceful, shutdown
    let handle = app.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutting down server; waiting for in-flight requests...");
        // stop accepting, let in-flight requests finish
        handle.stop(true).await;
    });

    let server_thread = tokio::spawn(app.run_until_stopped());
    report_exit("API", server_thread.await);

    Ok(())
}
