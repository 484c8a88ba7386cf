use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use uuid::Uuid;

use crate::controllers::SESSION_COOKIE;
use crate::server::AppState;

const WIDGET_HTML: &str = include_str!("../../templates/widget-demo.html");

/// `GET /` — reset the caller's conversation to the system message only and
/// serve the chat widget. Issues the session cookie on first visit.
pub async fn home(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let session_id = req
        .cookie(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    state.sessions.reset(&session_id).await;
    info!("SESSION RESET | session {session_id}");

    // The widget is embedded on the allowed origin, so the cookie must be
    // sent on cross-site requests; SameSite=None requires Secure.
    let cookie = Cookie::build(SESSION_COOKIE, session_id)
        .path("/")
        .http_only(true)
        .same_site(SameSite::None)
        .secure(true)
        .finish();

    HttpResponse::Ok()
        .cookie(cookie)
        .content_type("text/html; charset=utf-8")
        .body(WIDGET_HTML)
}
