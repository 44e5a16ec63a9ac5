//! User-safe error responses
//!
//! Internal causes are logged where they happen; only the fixed messages
//! below ever reach the caller.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Relay API errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Missing or invalid request field (400)
    BadRequest(&'static str),
    /// Upload rejected by type (415)
    UnsupportedMedia(&'static str),
    /// Upload larger than allowed (413)
    PayloadTooLarge(&'static str),
    /// Malformed transport-level request, with its own status
    Transport(StatusCode, &'static str),
    /// Request budget spent (429)
    TooManyRequests(&'static str),
    /// Upstream model failure (500)
    Upstream(&'static str),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl ApiError {
    /// HTTP status for this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Transport(status, _) => *status,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn message(&self) -> &'static str {
        match self {
            Self::BadRequest(msg)
            | Self::UnsupportedMedia(msg)
            | Self::PayloadTooLarge(msg)
            | Self::Transport(_, msg)
            | Self::TooManyRequests(msg)
            | Self::Upstream(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody { error: self.message() })).into_response()
    }
}
