use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use uuid::Uuid;

use crate::startup::Previews;
use crate::utils::json_error;

/// `GET /api/preview/{id}`
///
/// Shows a message that went through the sandbox transport; this is where
/// `previewUrl` points. With a real SMTP transport there is nothing to
/// preview, and every id is a 404.
#[tracing::instrument(name = "Showing sandbox preview", skip(previews))]
pub async fn preview(
    id: web::Path<String>,
    previews: web::Data<Previews>,
) -> HttpResponse {
    let not_found = || json_error(StatusCode::NOT_FOUND, "No such preview.");

    let Some(sandbox) = &previews.0 else {
        return not_found();
    };
    let Ok(id) = Uuid::parse_str(&id) else {
        return not_found();
    };

    match sandbox.get(id).await {
        Some(stored) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(stored.render_html()),
        None => not_found(),
    }
}
