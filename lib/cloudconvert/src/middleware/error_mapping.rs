//! Response classification middleware.
//!
//! Turns every non-2xx response into the matching typed [`Error`]
//! (client, server, or unexpected status), parsing the body with a shared
//! [`StatusDecoder`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use cloudconvert_core::{JsonStatusDecoder, StatusDecoder};
use tower::{Layer, Service};
use tracing::debug;

use crate::{Error, Response, Result};

/// Layer that maps failed responses to typed errors.
///
/// # Example
///
/// ```ignore
/// use cloudconvert::middleware::ErrorMappingLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(ErrorMappingLayer::new())
///     .service(transport);
/// ```
#[derive(Clone)]
pub struct ErrorMappingLayer {
    decoder: Arc<dyn StatusDecoder>,
}

impl fmt::Debug for ErrorMappingLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorMappingLayer").finish_non_exhaustive()
    }
}

impl Default for ErrorMappingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorMappingLayer {
    /// Create a layer using the default JSON decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::with_decoder(Arc::new(JsonStatusDecoder::new()))
    }

    /// Create a layer using the given decoder.
    ///
    /// The decoder is shared by every service this layer produces.
    #[must_use]
    pub fn with_decoder(decoder: Arc<dyn StatusDecoder>) -> Self {
        Self { decoder }
    }
}

impl<S> Layer<S> for ErrorMappingLayer {
    type Service = ErrorMapping<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorMapping {
            inner,
            decoder: Arc::clone(&self.decoder),
        }
    }
}

/// Service that maps failed responses to typed errors.
#[derive(Clone)]
pub struct ErrorMapping<S> {
    inner: S,
    decoder: Arc<dyn StatusDecoder>,
}

impl<S: fmt::Debug> fmt::Debug for ErrorMapping<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorMapping")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S> Service<http::Request<Bytes>> for ErrorMapping<S>
where
    S: Service<http::Request<Bytes>, Response = Response<Bytes>, Error = Error>,
    S::Future: Send + 'static,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: http::Request<Bytes>) -> Self::Future {
        let future = self.inner.call(request);
        let decoder = Arc::clone(&self.decoder);

        Box::pin(async move {
            let response = future.await?;
            map_response(response, decoder.as_ref())
        })
    }
}

/// Pass 2xx through, classify everything else.
pub(crate) fn map_response(
    response: Response<Bytes>,
    decoder: &dyn StatusDecoder,
) -> Result<Response<Bytes>> {
    let err = match response.error_for_status(decoder) {
        Ok(response) => return Ok(response),
        Err(err) => err,
    };

    if let Some(api) = err.api_error()
        && let Some(reason) = api.deserialization_error()
    {
        debug!(
            status = api.status().as_u16(),
            error = %reason,
            "error body not parsed, using default status"
        );
    }

    Err(err)
}
