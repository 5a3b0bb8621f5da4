use std::fmt::Formatter;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;

/// Body of every non-2xx response: `{"error": "..."}`
#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

pub fn json_error(
    status: StatusCode,
    message: &str,
) -> HttpResponse {
    HttpResponse::build(status).json(ErrorBody { error: message })
}

/// `Debug` representation that walks the whole `source()` chain, one cause per
/// line. Errors that are shown to users with a generic `Display` message use
/// this so that the logs still contain everything.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
