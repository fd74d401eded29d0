use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("User already exists")]
    UserAlreadyExists,
    #[error("Invalid request")]
    InvalidRequest,
    #[error("Corrupt session")]
    CorruptSession,
    #[error("Password hashing failed")]
    PasswordHash,
    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[derive(Error, Debug)]
pub enum PollError {
    #[error("Question not found")]
    QuestionNotFound,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Outcomes of the cast-vote protocol. These never reach the wire directly;
/// the vote handler maps each variant to a redirect, a re-rendered detail
/// page, or a `PollError`.
#[derive(Error, Debug)]
pub enum VoteError {
    #[error("Question not found")]
    QuestionNotFound,
    #[error("Voting is closed for this question")]
    VotingClosed,
    #[error("Choice does not belong to this question")]
    InvalidChoice,
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password")
            }
            AuthError::UserAlreadyExists => (StatusCode::CONFLICT, "User already exists"),
            AuthError::InvalidRequest => (StatusCode::BAD_REQUEST, "Invalid request"),
            AuthError::CorruptSession => (StatusCode::BAD_REQUEST, "Corrupt session"),
            AuthError::PasswordHash => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Password hashing failed")
            }
            AuthError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.as_str()),
        };

        let body = Json(json!({
            "error": error_message,
            "details": self.to_string()
        }));

        (status, body).into_response()
    }
}

impl IntoResponse for PollError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            PollError::QuestionNotFound => (StatusCode::NOT_FOUND, "Question not found"),
            PollError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            PollError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.as_str()),
        };

        let body = Json(json!({
            "error": error_message,
            "details": self.to_string()
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(error: sqlx::Error) -> Self {
        AuthError::DatabaseError(error.to_string())
    }
}

impl From<sqlx::Error> for PollError {
    fn from(error: sqlx::Error) -> Self {
        PollError::DatabaseError(error.to_string())
    }
}

impl From<sqlx::Error> for VoteError {
    fn from(error: sqlx::Error) -> Self {
        VoteError::DatabaseError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_expected_statuses() {
        assert_eq!(
            AuthError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::UserAlreadyExists.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthError::InvalidRequest.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn poll_errors_map_to_expected_statuses() {
        assert_eq!(
            PollError::QuestionNotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PollError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            PollError::DatabaseError("boom".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
