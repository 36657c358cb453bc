use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::session::TagError;
use crate::spotify::auth::AuthError;

/// Errors that end a request early. Responses are bare text.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<TagError> for AppError {
    fn from(e: TagError) -> Self {
        AppError::BadRequest(format!("Could not tag the song: {e}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Auth(e) => {
                tracing::error!(error = %e, "login failed");
                (StatusCode::BAD_REQUEST, "Login with Spotify failed. Please try again.".to_string())
            }
        };
        (status, message).into_response()
    }
}
