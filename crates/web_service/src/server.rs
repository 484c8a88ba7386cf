use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{web, App, HttpServer};
use log::info;

use chat_core::{RetryingInvoker, SessionStore};
use openai_client::OpenAiClient;

use crate::config::AppConfig;
use crate::controllers::{chat_controller, home_controller};
use crate::error::malformed_body_response;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};

pub struct AppState {
    pub sessions: SessionStore,
    pub invoker: RetryingInvoker,
}

/// Route table plus the JSON extractor override that turns malformed bodies
/// into the localized 400 response.
pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        actix_web::error::InternalError::from_response(err, malformed_body_response()).into()
    }))
    .service(web::resource("/").route(web::get().to(home_controller::home)))
    .service(web::resource("/chat").route(web::post().to(chat_controller::chat)));
}

pub async fn run(config: AppConfig) -> std::io::Result<()> {
    let client = OpenAiClient::new(config.api_key.clone())
        .with_base_url(config.base_url.clone())
        .with_model(config.model.clone());
    info!("OpenAI client initialized | model {}", client.model());

    let app_state = web::Data::new(AppState {
        sessions: SessionStore::new(config.system_prompt.clone()),
        invoker: RetryingInvoker::new(Arc::new(client)),
    });

    let limiter = RateLimiter::new(RateLimitConfig {
        per_minute: config.rate_limit_per_minute,
        per_day: config.rate_limit_per_day,
    });

    let allowed_origin = config.allowed_origin.clone();
    let bind_addr = format!("0.0.0.0:{}", config.port);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&allowed_origin)
            .allowed_methods(vec!["GET", "POST"])
            .allowed_header(header::CONTENT_TYPE);

        App::new()
            .app_data(app_state.clone())
            .wrap(limiter.clone())
            .wrap(cors)
            .configure(app_config)
    })
    .bind(&bind_addr)?
    .run();

    info!("Chat relay listening on http://{bind_addr}");
    server.await
}
