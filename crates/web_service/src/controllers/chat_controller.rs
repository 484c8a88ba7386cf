use actix_web::{web, HttpRequest, HttpResponse};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use chat_core::{Message, Role};

use crate::controllers::{DEFAULT_SESSION, SESSION_COOKIE};
use crate::error::{AppError, Result, EMPTY_MESSAGE_NOTICE};
use crate::middleware::client_addr;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Absent counts the same as blank: the benign notice, not a 400.
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub history: Vec<Message>,
}

fn session_id(req: &HttpRequest) -> String {
    req.cookie(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .unwrap_or_else(|| DEFAULT_SESSION.to_string())
}

/// `POST /chat` — append the user message, obtain a completion with
/// retries, and either append the reply or roll the user message back.
///
/// The session mutex is held across the whole append/invoke/resolve span so
/// one conversation's requests serialize; other sessions stay unaffected.
/// Message content never reaches the log.
pub async fn chat(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<ChatRequest>,
) -> Result<HttpResponse> {
    let client = client_addr(&req.connection_info());
    info!("REQUEST START | client {client}");

    let message = body.message.trim();
    if message.is_empty() {
        warn!("REQUEST REJECTED | client {client} | empty message");
        return Ok(HttpResponse::Ok().json(json!({ "response": EMPTY_MESSAGE_NOTICE })));
    }
    info!("USER MESSAGE RECEIVED | client {client}");

    let session_id = session_id(&req);
    let session = state.sessions.session(&session_id);
    let mut transcript = session.lock().await;

    transcript
        .append(Role::User, message)
        .map_err(|e| AppError::Internal(e.into()))?;

    let snapshot = transcript.snapshot();
    let completion = match state.invoker.invoke(&snapshot).await {
        Ok(completion) => completion,
        Err(err) => {
            // Restore the pre-request transcript: no orphaned user message
            // may survive a failed request.
            transcript.rollback_last();
            warn!("REQUEST FAILED | client {client} | {err}");
            return Err(err.into());
        }
    };

    if let Err(e) = transcript.append(Role::Assistant, completion.reply.as_str()) {
        transcript.rollback_last();
        warn!("REQUEST FAILED | client {client} | unusable completion: {e}");
        return Err(AppError::Internal(e.into()));
    }

    info!(
        "REQUEST SUCCESS | client {client} | tokens {}",
        completion
            .total_tokens
            .map(|t| t.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );

    Ok(HttpResponse::Ok().json(ChatResponse {
        response: completion.reply,
        history: transcript.snapshot(),
    }))
}
