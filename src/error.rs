use actix_web::{HttpResponse, http::StatusCode};
use thiserror::Error;

/// Service-wide error taxonomy. Every handler returns this; the
/// `ResponseError` impl maps each variant onto its HTTP status.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    /// Storage failure. The message is logged, never sent to the client.
    #[error("storage failure: {0}")]
    Persistence(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Error::Conflict(msg.into())
    }

    /// Message shown to the caller. Persistence details stay server-side.
    fn public_message(&self) -> &str {
        match self {
            Error::Persistence(_) => "Internal Server Error",
            Error::Validation(m)
            | Error::NotFound(m)
            | Error::Conflict(m)
            | Error::Forbidden(m) => m,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Persistence(e.to_string())
    }
}

impl actix_web::ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Error::Persistence(detail) = self {
            tracing::error!(error = %detail, "request failed on storage");
        }
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "message": self.public_message()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            Error::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            Error::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::Persistence("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn persistence_message_is_opaque() {
        let err = Error::Persistence("connection refused at 10.0.0.3".into());
        assert_eq!(err.public_message(), "Internal Server Error");
    }
}
