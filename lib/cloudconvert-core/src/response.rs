//! HTTP response handling.
//!
//! [`Response`] provides access to status, headers, and body. A failed
//! response is turned into a typed [`Error`] with
//! [`Response::error_for_status`].
//!
//! # Example
//!
//! ```ignore
//! let job: Job = response.error_for_status(&DEFAULT_DECODER)?.json()?;
//! ```

use bytes::Bytes;
use http::StatusCode;

use crate::{Error, Headers, StatusDecoder};

/// HTTP response with status, headers, and body.
#[derive(Debug, Clone)]
pub struct Response<B = Bytes> {
    status: StatusCode,
    headers: Headers,
    body: B,
}

impl<B> Response<B> {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: StatusCode, headers: Headers, body: B) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Single header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> B {
        self.body
    }

    /// Consume into (status, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, Headers, B) {
        (self.status, self.headers, self.body)
    }

    /// Status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Status is 3xx.
    #[must_use]
    pub fn is_redirection(&self) -> bool {
        self.status.is_redirection()
    }

    /// Status is 4xx.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Status is 5xx.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Transform the body with a function.
    pub fn map_body<F, B2>(self, f: F) -> Response<B2>
    where
        F: FnOnce(B) -> B2,
    {
        Response {
            status: self.status,
            headers: self.headers,
            body: f(self.body),
        }
    }
}

impl Response<Bytes> {
    /// Deserialize the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(self) -> crate::Result<T> {
        crate::from_json(&self.body)
    }

    /// Get the response body as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// Consume the response into its typed error, whatever its status.
    #[must_use]
    pub fn into_error(self, decoder: &dyn StatusDecoder) -> Error {
        Error::from_response(self.status, self.headers, self.body, decoder)
    }

    /// Pass 2xx responses through; map anything else to a typed error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Client`] for 4xx, [`Error::Server`] for 5xx and
    /// [`Error::UnexpectedStatus`] for other non-2xx statuses.
    pub fn error_for_status(self, decoder: &dyn StatusDecoder) -> crate::Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error(decoder))
        }
    }
}
