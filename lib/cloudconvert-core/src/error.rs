//! Error types for cloudconvert.
//!
//! A failed API call is reported as exactly one [`Error`]. HTTP failures
//! carry an [`ApiError`] holding the HTTP status, the response headers, and
//! the parsed error body ([`Status`]). If the body could not be parsed, the
//! [`ApiError`] falls back to [`Status::default`] and keeps the
//! [`DeserializationError`] as a secondary detail.

use std::fmt;

use derive_more::{Display, Error};
use http::StatusCode;

use crate::{
    DEFAULT_DECODER, DeserializationError, FieldError, Headers, RawBody, Status, StatusDecoder,
};

// ============================================================================
// Error Kind
// ============================================================================

/// Which side caused an HTTP failure, derived from the status-code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// 4xx: the request itself was rejected.
    #[display("client")]
    Client,
    /// 5xx: the remote service failed.
    #[display("server")]
    Server,
    /// Any other status reported as a failure (1xx, 2xx, 3xx).
    #[display("unexpected")]
    Unexpected,
}

impl ErrorKind {
    /// Classify an HTTP status.
    #[must_use]
    pub fn of(status: StatusCode) -> Self {
        if status.is_client_error() {
            Self::Client
        } else if status.is_server_error() {
            Self::Server
        } else {
            Self::Unexpected
        }
    }
}

// ============================================================================
// API Error
// ============================================================================

/// A failed HTTP response, with its error body parsed.
///
/// Built once from `(status, headers, body)` and immutable afterwards.
///
/// # Example
///
/// ```
/// use cloudconvert_core::{ApiError, Headers, StatusCode};
///
/// let headers: Headers = [("Content-Type", "application/json")].into_iter().collect();
/// let body = r#"{"code":"INVALID_PARAMETER","message":"Bad input","errors":[{"field":"file","message":"required"}]}"#;
///
/// let error = ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, headers, body);
///
/// assert_eq!(error.code(), "INVALID_PARAMETER");
/// assert_eq!(error.field_errors()[0].field(), "file");
/// assert_eq!(error.summary(), "422 Unprocessable Entity: Bad input (INVALID_PARAMETER)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    headers: Headers,
    parsed: Status,
    deserialization_error: Option<DeserializationError>,
}

impl ApiError {
    /// Build an error using the shared default JSON decoder.
    #[must_use]
    pub fn new(status: StatusCode, headers: Headers, body: impl Into<RawBody>) -> Self {
        Self::from_response(status, headers, body, &DEFAULT_DECODER)
    }

    /// Build an error, parsing `body` with `decoder`.
    ///
    /// The body is consumed. This never fails: if decoding fails the parsed
    /// status is [`Status::default`] and the failure is kept in
    /// [`ApiError::deserialization_error`].
    #[must_use]
    pub fn from_response(
        status: StatusCode,
        headers: Headers,
        body: impl Into<RawBody>,
        decoder: &dyn StatusDecoder,
    ) -> Self {
        let (parsed, deserialization_error) = match decoder.decode(body.into()) {
            Ok(parsed) => (parsed, None),
            Err(err) => (Status::default(), Some(err)),
        };

        Self {
            status,
            headers,
            parsed,
            deserialization_error,
        }
    }

    /// Build an error from an already parsed status.
    #[must_use]
    pub fn from_parts(status: StatusCode, headers: Headers, parsed: Status) -> Self {
        Self {
            status,
            headers,
            parsed,
            deserialization_error: None,
        }
    }

    /// HTTP status of the failed response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Status-code category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::of(self.status)
    }

    /// Response headers, as received.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Parsed error body (or the default when parsing failed).
    #[must_use]
    pub const fn parsed(&self) -> &Status {
        &self.parsed
    }

    /// Error code from the body.
    #[must_use]
    pub fn code(&self) -> &str {
        self.parsed.code()
    }

    /// Error message from the body.
    #[must_use]
    pub fn message(&self) -> &str {
        self.parsed.message()
    }

    /// Field-level errors from the body.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        self.parsed.errors()
    }

    /// Why the body could not be parsed, if it could not.
    #[must_use]
    pub const fn deserialization_error(&self) -> Option<&DeserializationError> {
        self.deserialization_error.as_ref()
    }

    /// One-line description combining HTTP status and parsed message.
    #[must_use]
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status.as_u16())?;
        if let Some(reason) = self.status.canonical_reason() {
            write!(f, " {reason}")?;
        }
        if !self.message().is_empty() {
            write!(f, ": {}", self.message())?;
        }
        if !self.code().is_empty() {
            write!(f, " ({})", self.code())?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.deserialization_error
            .as_ref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for cloudconvert operations.
#[derive(Debug, Display, Error)]
pub enum Error {
    /// The API rejected the request (4xx).
    #[display("client error: {_0}")]
    Client(ApiError),

    /// The API failed to serve the request (5xx).
    #[display("server error: {_0}")]
    Server(ApiError),

    /// A status outside 4xx/5xx was reported as a failure.
    #[display("unexpected status: {_0}")]
    UnexpectedStatus(ApiError),

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    Timeout,

    /// JSON deserialization error with path context, for successful bodies.
    #[display("JSON deserialization error at '{path}': {message}")]
    JsonDeserialization {
        /// JSON path to the error (e.g., "data.tasks[0].id").
        path: String,
        /// Error message.
        message: String,
    },
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Wraps the error in the variant matching its status range.
impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        match err.kind() {
            ErrorKind::Client => Self::Client(err),
            ErrorKind::Server => Self::Server(err),
            ErrorKind::Unexpected => Self::UnexpectedStatus(err),
        }
    }
}

impl Error {
    /// Map a failed HTTP response to its typed error, parsing the body with `decoder`.
    #[must_use]
    pub fn from_response(
        status: StatusCode,
        headers: Headers,
        body: impl Into<RawBody>,
        decoder: &dyn StatusDecoder,
    ) -> Self {
        ApiError::from_response(status, headers, body, decoder).into()
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The HTTP failure details, if this error came from an HTTP response.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Client(err) | Self::Server(err) | Self::UnexpectedStatus(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the HTTP status if this error came from an HTTP response.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.api_error().map(ApiError::status)
    }

    /// Response headers, if this error came from an HTTP response.
    #[must_use]
    pub fn headers(&self) -> Option<&Headers> {
        self.api_error().map(ApiError::headers)
    }

    /// Field-level errors; empty for errors without a parsed body.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        self.api_error().map_or(&[][..], ApiError::field_errors)
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Client(_))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Server(_))
    }

    /// Returns `true` if this is a 404 Not Found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if no HTTP response was received at all.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Tls(_) | Self::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use assert2::{check, let_assert};

    use super::*;

    const INVALID_PARAMETER: &str = r#"{"code":"INVALID_PARAMETER","message":"Bad input","errors":[{"field":"file","message":"required"}]}"#;

    fn json_headers() -> Headers {
        [("Content-Type", "application/json")].into_iter().collect()
    }

    #[test]
    fn client_error_with_field_errors() {
        let err = Error::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            json_headers(),
            INVALID_PARAMETER,
            &DEFAULT_DECODER,
        );

        let_assert!(Error::Client(api) = &err);
        check!(api.status() == StatusCode::UNPROCESSABLE_ENTITY);
        check!(api.code() == "INVALID_PARAMETER");
        check!(api.message() == "Bad input");
        check!(api.field_errors() == [FieldError::new("file", "required")]);
        check!(api.headers().get("content-type") == Some("application/json"));
        check!(api.deserialization_error().is_none());
        check!(err.is_client_error());
        check!(!err.is_server_error());
    }

    #[test]
    fn server_error_with_empty_body() {
        let err = Error::from_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            Headers::new(),
            "",
            &DEFAULT_DECODER,
        );

        let_assert!(Error::Server(api) = &err);
        check!(api.status().as_u16() == 500);
        check!(api.parsed() == &Status::default());
        check!(api.field_errors().is_empty());
        check!(api.deserialization_error() == Some(&DeserializationError::EmptyBody));
        check!(err.is_server_error());
    }

    #[test]
    fn malformed_body_keeps_http_failure() {
        let headers: Headers = [("Content-Type", "text/html")].into_iter().collect();
        let api = ApiError::new(StatusCode::BAD_GATEWAY, headers.clone(), "<html>oops</html>");

        check!(api.status() == StatusCode::BAD_GATEWAY);
        check!(api.headers() == &headers);
        check!(api.parsed().is_empty());
        let_assert!(Some(DeserializationError::Json { .. }) = api.deserialization_error());
    }

    #[test]
    fn parse_failure_is_the_source() {
        let api = ApiError::new(StatusCode::SERVICE_UNAVAILABLE, Headers::new(), "{");
        let source = api.source().expect("parse failure recorded");
        check!(source.to_string().starts_with("malformed error body"));

        let ok = ApiError::new(StatusCode::NOT_FOUND, Headers::new(), "{}");
        check!(ok.source().is_none());
    }

    #[test]
    fn identical_inputs_build_equal_errors() {
        let build = || {
            ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                json_headers(),
                INVALID_PARAMETER,
            )
        };
        check!(build() == build());

        let broken = || ApiError::new(StatusCode::BAD_REQUEST, Headers::new(), "not json");
        check!(broken() == broken());
    }

    #[test]
    fn kind_follows_status_range() {
        check!(ErrorKind::of(StatusCode::BAD_REQUEST) == ErrorKind::Client);
        check!(ErrorKind::of(StatusCode::TOO_MANY_REQUESTS) == ErrorKind::Client);
        check!(ErrorKind::of(StatusCode::GATEWAY_TIMEOUT) == ErrorKind::Server);
        check!(ErrorKind::of(StatusCode::FOUND) == ErrorKind::Unexpected);
        check!(ErrorKind::of(StatusCode::OK) == ErrorKind::Unexpected);
    }

    #[test]
    fn unexpected_status_variant() {
        let err = Error::from(ApiError::new(StatusCode::NOT_MODIFIED, Headers::new(), ""));
        let_assert!(Error::UnexpectedStatus(api) = &err);
        check!(api.kind() == ErrorKind::Unexpected);
        check!(!err.is_client_error());
        check!(!err.is_server_error());
    }

    #[test]
    fn summary_messages() {
        let api = ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            json_headers(),
            INVALID_PARAMETER,
        );
        insta::assert_snapshot!(api.summary(), @"422 Unprocessable Entity: Bad input (INVALID_PARAMETER)");

        let api = ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, Headers::new(), "");
        insta::assert_snapshot!(api.summary(), @"500 Internal Server Error");

        let api = ApiError::new(StatusCode::NOT_FOUND, Headers::new(), r#"{"code":"NOT_FOUND"}"#);
        insta::assert_snapshot!(api.summary(), @"404 Not Found (NOT_FOUND)");
    }

    #[test]
    fn error_display() {
        let body = r#"{"message":"Unauthenticated."}"#;
        let err = Error::from(ApiError::new(StatusCode::UNAUTHORIZED, Headers::new(), body));
        check!(err.to_string() == "client error: 401 Unauthorized: Unauthenticated.");

        check!(Error::Timeout.to_string() == "request timeout");
        check!(
            Error::connection("failed to connect").to_string()
                == "connection error: failed to connect"
        );
        check!(
            Error::json_deserialization("data.id", "missing field `id`").to_string()
                == "JSON deserialization error at 'data.id': missing field `id`"
        );
    }

    #[test]
    fn error_accessors() {
        let err = Error::from(ApiError::new(StatusCode::NOT_FOUND, json_headers(), "{}"));
        check!(err.status() == Some(StatusCode::NOT_FOUND));
        check!(err.is_not_found());
        check!(err.headers().is_some_and(|h| h.content_type() == Some("application/json")));
        check!(!err.is_transport());

        check!(Error::Timeout.status().is_none());
        check!(Error::Timeout.headers().is_none());
        check!(Error::Timeout.field_errors().is_empty());
        check!(Error::Timeout.is_timeout());
        check!(Error::Timeout.is_transport());
        check!(Error::tls("bad certificate").is_transport());
        check!(Error::connection("refused").is_connection());
        check!(!Error::json_deserialization("id", "missing field").is_transport());
    }

    #[test]
    fn from_parts_has_no_parse_failure() {
        let status = Status::new("RATE_LIMITED", "Slow down", vec![]);
        let api =
            ApiError::from_parts(StatusCode::TOO_MANY_REQUESTS, Headers::new(), status.clone());
        check!(api.parsed() == &status);
        check!(api.deserialization_error().is_none());
        check!(api.kind() == ErrorKind::Client);
    }
}
