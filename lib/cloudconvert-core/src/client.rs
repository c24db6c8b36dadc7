//! HTTP client trait.
//!
//! [`HttpClient`] is the seam between the transport and everything built on
//! top of it. Implementations return `Ok` only for successful responses;
//! failed responses come back as the typed [`Error`](crate::Error) produced
//! by [`Response::error_for_status`].

use std::future::Future;

use bytes::Bytes;

use crate::{Response, Result};

/// Core HTTP client trait.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - 4xx / 5xx responses ([`Error::Client`](crate::Error::Client),
    ///   [`Error::Server`](crate::Error::Server))
    /// - Network errors, TLS errors, timeouts
    fn execute(
        &self,
        request: http::Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}
