use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Failures reported by a [`crate::sheets::SheetsApi`] implementation.
///
/// The `Display` output of the upstream variants is the upstream message
/// itself, so handlers can surface it verbatim.
#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    /// Service-account email or private key is absent from configuration.
    #[error("service account credentials are not configured: missing {0}")]
    MissingCredentials(&'static str),

    /// The configured private key could not be parsed as an RSA PEM key.
    #[error("invalid service account private key: {0}")]
    InvalidPrivateKey(String),

    /// The OAuth token endpoint rejected the signed assertion.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// Transport-level failure (DNS, TLS, connection reset, ...).
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The Sheets API answered with a non-2xx status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("unexpected response from Sheets API: {0}")]
    InvalidResponse(String),
}

/// Error taxonomy of the HTTP endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    RemoteRead(String),

    #[error("{0}")]
    RemoteWrite(String),

    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::RemoteRead(_) | ApiError::RemoteWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// A local edit the dashboard refused to record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("no row with id '{0}'")]
    UnknownRow(String),

    #[error("field '{0}' is read-only")]
    ReadOnlyField(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// Row ids must be non-negative integers to map onto a sheet row.
    #[error("row id '{0}' does not address a sheet row")]
    UnaddressableRow(String),

    #[error("edit entry id '{found}' does not match row key '{expected}'")]
    MismatchedId { expected: String, found: String },
}

/// Failures surfaced by [`crate::dashboard::DashboardSession`].
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("failed to load rows: {0}")]
    RemoteRead(String),

    #[error("failed to save changes: {0}")]
    RemoteWrite(String),

    #[error("a save is already in progress")]
    SaveInProgress,

    #[error(transparent)]
    Edit(#[from] EditError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_status_codes() {
        assert_eq!(
            ApiError::RemoteRead("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::RemoteWrite("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn upstream_message_is_surfaced_verbatim() {
        let err = SheetsError::Api {
            status: 400,
            message: "Unable to parse range: Sheet9!A1".to_string(),
        };
        assert_eq!(err.to_string(), "Unable to parse range: Sheet9!A1");
    }
}
