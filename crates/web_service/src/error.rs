use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use chat_core::{CompletionError, InvokeError};

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// User-facing notices. Localized and deliberately free of any technical
/// detail; the operational log carries the specifics instead.
pub const EMPTY_MESSAGE_NOTICE: &str = "Wiadomość nie może być pusta.";
pub const MALFORMED_BODY_NOTICE: &str = "Błąd: Wymagany format JSON.";
pub const RATE_LIMIT_NOTICE: &str = "Przekroczyłeś limit zapytań. Spróbuj ponownie za chwilę.";
pub const UNEXPECTED_FAILURE_NOTICE: &str =
    "Przepraszam, wystąpił nieoczekiwany problem techniczny. (Błąd: Nieznany błąd API)";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("completion retries exhausted after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    #[error("completion failed: {0}")]
    Completion(#[source] CompletionError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<InvokeError> for AppError {
    fn from(err: InvokeError) -> Self {
        match err {
            InvokeError::RetryExhausted { attempts, .. } => AppError::RetryExhausted { attempts },
            InvokeError::Fatal(err) => AppError::Completion(err),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::RetryExhausted { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Completion(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::RetryExhausted { .. } => HttpResponse::TooManyRequests().json(json!({
                "error": "rate_limit",
                "response": RATE_LIMIT_NOTICE,
            })),
            AppError::Completion(_) | AppError::Internal(_) => {
                HttpResponse::InternalServerError().json(json!({
                    "response": UNEXPECTED_FAILURE_NOTICE,
                }))
            }
        }
    }
}

/// 400 body for requests that are not well-formed JSON. Wired into actix's
/// `JsonConfig` so the handler itself never sees malformed input.
pub fn malformed_body_response() -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "response": MALFORMED_BODY_NOTICE }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_exhausted_maps_to_429_with_rate_limit_body() {
        let err = AppError::from(InvokeError::RetryExhausted {
            attempts: 3,
            last: CompletionError::RateLimited,
        });
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn fatal_completion_error_maps_to_500() {
        let err = AppError::from(InvokeError::Fatal(CompletionError::Network(
            "connection refused".to_string(),
        )));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
