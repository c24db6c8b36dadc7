//! Request/response logging middleware.
//!
//! Logs HTTP requests and their outcome using the `tracing` crate. Typed API
//! errors are logged with their parsed fields so failures can be searched by
//! error code.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, info, span, warn};

use crate::{Error, Response, Result};

/// Layer that adds request/response logging.
///
/// # Example
///
/// ```ignore
/// use cloudconvert::middleware::LoggingLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(LoggingLayer::new())
///     .service(client);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// Log level for the logging middleware.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogLevel {
    /// Log at debug level (request/response details).
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

impl LoggingLayer {
    /// Create a new logging layer with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging layer that logs at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service that logs requests and responses.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Logging<S> {
    /// Create a new logging service wrapping the given service.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            level: LogLevel::Info,
        }
    }
}

impl<S> Service<http::Request<Bytes>> for Logging<S>
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
        let method = request.method().clone();
        let url = request.uri().to_string();
        let span = span!(Level::INFO, "http_request", %method, %url);

        match self.level {
            LogLevel::Debug => {
                span.in_scope(|| {
                    debug!(
                        method = %method,
                        url = %url,
                        headers = ?request.headers(),
                        "sending request"
                    );
                });
            }
            LogLevel::Info => {
                span.in_scope(|| info!(method = %method, url = %url, "sending request"));
            }
        }

        let start = Instant::now();
        let future = self.inner.call(request);

        Box::pin(
            async move {
                let result = future.await;

                // Saturating conversion to u64 (truncates after ~584 million years)
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) => {
                        info!(status = response.status().as_u16(), elapsed_ms, "request completed");
                    }
                    Err(err) => log_failure(err, elapsed_ms),
                }

                result
            }
            .instrument(span),
        )
    }
}

fn log_failure(err: &Error, elapsed_ms: u64) {
    if let Some(api) = err.api_error() {
        warn!(
            status = api.status().as_u16(),
            kind = %api.kind(),
            code = api.code(),
            message = api.message(),
            field_errors = api.field_errors().len(),
            body_parsed = api.deserialization_error().is_none(),
            elapsed_ms,
            "request failed with API error"
        );
    } else {
        warn!(
            error = %err,
            transport = err.is_transport(),
            elapsed_ms,
            "request failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use cloudconvert_core::{ApiError, Headers, StatusCode};
    use tower::{ServiceExt, service_fn};

    use super::*;

    #[test]
    fn logging_layer_default() {
        let layer = LoggingLayer::new();
        check!(matches!(layer.level, LogLevel::Info));
    }

    #[test]
    fn logging_layer_debug() {
        let layer = LoggingLayer::debug();
        check!(matches!(layer.level, LogLevel::Debug));
    }

    #[tokio::test]
    async fn typed_errors_pass_through_unchanged() {
        let transport = service_fn(|_request: http::Request<Bytes>| async {
            Err::<Response<Bytes>, _>(Error::from(ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                Headers::new(),
                r#"{"code":"INVALID_PARAMETER"}"#,
            )))
        });
        let service = LoggingLayer::debug().layer(transport);

        let result = service.oneshot(http::Request::new(Bytes::new())).await;
        let_assert!(Err(Error::Client(api)) = result);
        check!(api.code() == "INVALID_PARAMETER");
    }

    #[tokio::test]
    async fn responses_pass_through_unchanged() {
        let transport = service_fn(|_request: http::Request<Bytes>| async {
            Ok::<_, Error>(Response::new(StatusCode::OK, Headers::new(), Bytes::from("ok")))
        });
        let service = Logging::new(transport);

        let response = service
            .oneshot(http::Request::new(Bytes::new()))
            .await
            .expect("response");
        check!(response.body().as_ref() == b"ok");
    }
}
