//! Rendering of crate errors as API responses.

use axum::{extract::multipart::MultipartError, http::StatusCode, response::IntoResponse};
use tracing::error;

use super::response::ApiResponse;
use crate::auth::error::Error as AuthError;
use crate::error::Error;

impl Error {
    /// Status code and client facing message. Internal details never leave
    /// the server.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        let (status, message) = match self {
            Error::InvalidEmail
            | Error::WeakPassword(_)
            | Error::InvalidRequest(_)
            | Error::InvalidUpload(_) => return (StatusCode::BAD_REQUEST, self.to_string()),

            Error::WrongCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            Error::CtxMissing => (StatusCode::UNAUTHORIZED, "Missing credentials"),
            Error::Auth(err) => match err {
                AuthError::InvalidToken => {
                    (StatusCode::UNAUTHORIZED, "Invalid authentication token")
                }
                AuthError::TokenMissing => (StatusCode::UNAUTHORIZED, "Authentication required"),
                AuthError::TokenExpired => {
                    (StatusCode::UNAUTHORIZED, "Authentication token expired")
                }
                AuthError::TokenCreation(_) | AuthError::PasswordHash(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            },

            Error::EmailTaken => (StatusCode::CONFLICT, "Email already registered"),
            Error::JobNotFound => (StatusCode::NOT_FOUND, "Job not found"),

            Error::ProviderNotConfigured => {
                (StatusCode::INTERNAL_SERVER_ERROR, "FAL API key not configured")
            }
            Error::Provider { .. } | Error::Http(_) => {
                (StatusCode::BAD_GATEWAY, "Failed to submit job to AI service")
            }

            Error::IO(_)
            | Error::R2D2(_)
            | Error::Diesel(_)
            | Error::Migration(_)
            | Error::MissingEnv(_)
            | Error::InvalidEnv { .. }
            | Error::AuthTokenCreation
            | Error::UnknownApplication(_)
            | Error::TrackerStopped => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        (status, String::from(message))
    }
}

impl From<MultipartError> for Error {
    fn from(value: MultipartError) -> Self {
        Error::InvalidRequest(value.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!("Creating API error response for error: {:?}", self);
        }
        (status, ApiResponse::<()>::failure(message)).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validation_errors_keep_their_message() {
        let (status, message) =
            Error::InvalidUpload(String::from("Image too small (min 64x64 pixels)"))
                .status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Image too small (min 64x64 pixels)");

        let (status, message) = Error::WeakPassword(6).status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Password must be at least 6 characters long");
    }

    #[test]
    fn internal_details_are_hidden() {
        let (status, message) = Error::Provider {
            status: 500,
            body: String::from("secret upstream trace"),
        }
        .status_and_message();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!message.contains("secret"));

        let (status, message) = Error::Migration(String::from("relation exists"))
            .status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }

    #[test]
    fn auth_errors_are_unauthorized() {
        for err in [
            Error::WrongCredentials,
            Error::CtxMissing,
            Error::Auth(AuthError::TokenExpired),
            Error::Auth(AuthError::InvalidToken),
        ] {
            assert_eq!(err.status_and_message().0, StatusCode::UNAUTHORIZED);
        }
        assert_eq!(
            Error::EmailTaken.status_and_message().0,
            StatusCode::CONFLICT
        );
    }
}
