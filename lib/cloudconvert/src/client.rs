//! hyper-util transport with typed error mapping.

use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use cloudconvert_core::{Headers, StatusDecoder};
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::util::BoxCloneSyncService;
use tower::{Layer, ServiceExt};
use tower_service::Service;
use tracing::trace;

use crate::{
    Error, Response, Result,
    config::ClientConfig,
    connector::https_connector,
    middleware::{ErrorMappingLayer, LoggingLayer},
};

/// Type-erased service stack behind a [`HyperClient`].
pub type BoxedService = BoxCloneSyncService<http::Request<Bytes>, Response<Bytes>, Error>;

/// Future returned by the [`HyperClient`] tower service.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

// ============================================================================
// Transport
// ============================================================================

/// Sends a request and buffers the response, whatever its status.
///
/// Status classification happens in [`ErrorMappingLayer`].
#[derive(Clone)]
struct Transport {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: ClientConfig,
}

impl Transport {
    fn new(config: ClientConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(https_connector(&config));

        Self { client, config }
    }

    async fn send(self, request: http::Request<Bytes>) -> Result<Response<Bytes>> {
        let received = self.client.request(request.map(Full::new));
        let response = tokio::time::timeout(self.config.timeout, received)
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|err| transport_error(&err))?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|err| Error::connection(err.to_string()))?
            .to_bytes();

        trace!(status = parts.status.as_u16(), body_len = body.len(), "response buffered");
        Ok(Response::new(parts.status, Headers::from(&parts.headers), body))
    }
}

impl Service<http::Request<Bytes>> for Transport {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<Bytes>) -> Self::Future {
        Box::pin(self.clone().send(request))
    }
}

fn transport_error(err: &hyper_util::client::legacy::Error) -> Error {
    match tls_failure(err) {
        Some(tls) => Error::tls(tls.to_string()),
        None => Error::connection(err.to_string()),
    }
}

/// First `rustls::Error` in the source chain, looking inside `io::Error` wrappers.
fn tls_failure<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a rustls::Error> {
    let mut source = Some(err);
    while let Some(current) = source {
        if let Some(tls) = current.downcast_ref::<rustls::Error>() {
            return Some(tls);
        }
        if let Some(tls) = current
            .downcast_ref::<io::Error>()
            .and_then(io::Error::get_ref)
            .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        {
            return Some(tls);
        }
        source = current.source();
    }
    None
}

// ============================================================================
// Public Client
// ============================================================================

/// HTTP client using hyper-util with connection pooling, TLS, and middleware support.
///
/// Every client maps failed responses to typed errors: a 4xx comes back as
/// [`Error::Client`], a 5xx as [`Error::Server`].
///
/// # Example
///
/// ```ignore
/// use cloudconvert::HyperClient;
///
/// let client = HyperClient::builder().with_logging().build();
///
/// if let Err(err) = client.execute(request).await {
///     for field_error in err.field_errors() {
///         eprintln!("{field_error}");
///     }
/// }
/// ```
#[derive(Clone)]
pub struct HyperClient {
    service: BoxedService,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Create a client with the default configuration and no extra middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a client with a custom configuration and no extra middleware.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// Get the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute a request; non-2xx responses come back as typed errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Client`] / [`Error::Server`] for failed responses and
    /// a transport variant when no response was received.
    pub async fn execute(&self, request: http::Request<Bytes>) -> Result<Response<Bytes>> {
        self.service.clone().oneshot(request).await
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl cloudconvert_core::HttpClient for HyperClient {
    async fn execute(&self, request: http::Request<Bytes>) -> Result<Response<Bytes>> {
        Self::execute(self, request).await
    }
}

impl Service<http::Request<Bytes>> for HyperClient {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: http::Request<Bytes>) -> Self::Future {
        Box::pin(self.service.call(request))
    }
}

type LayerFn = Box<dyn FnOnce(BoxedService) -> BoxedService + Send>;

/// Builder for [`HyperClient`].
///
/// # Example
///
/// ```ignore
/// use cloudconvert::{ClientConfig, HyperClient};
/// use std::time::Duration;
///
/// let client = HyperClient::builder()
///     .config(ClientConfig::builder().timeout(Duration::from_secs(30)).build())
///     .with_logging()
///     .build();
/// ```
#[derive(Default)]
pub struct HyperClientBuilder {
    config: ClientConfig,
    decoder: Option<Arc<dyn StatusDecoder>>,
    layers: Vec<LayerFn>,
}

impl std::fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClientBuilder")
            .field("config", &self.config)
            .field("custom_decoder", &self.decoder.is_some())
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperClientBuilder {
    /// Use this configuration (timeouts, pool, error body limit).
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Parse error bodies with a custom decoder instead of the JSON default.
    ///
    /// The decoder instance is shared by all clones of the built client, and
    /// [`ClientConfig::max_error_body_bytes`] no longer applies.
    #[must_use]
    pub fn error_decoder(mut self, decoder: impl StatusDecoder) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    /// Add a Tower layer around the error-mapping service, so it sees typed
    /// errors. The last layer added is the outermost.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + 'static,
        L::Service: Service<http::Request<Bytes>, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<http::Request<Bytes>>>::Future: Send + 'static,
    {
        self.layers
            .push(Box::new(move |service| BoxCloneSyncService::new(layer.layer(service))));
        self
    }

    /// Add request/response logging.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Add debug-level logging (includes request headers).
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> HyperClient {
        let decoder: Arc<dyn StatusDecoder> = match self.decoder {
            Some(decoder) => decoder,
            None => Arc::new(self.config.status_decoder()),
        };

        let transport = Transport::new(self.config.clone());
        let service = self.layers.into_iter().fold(
            BoxCloneSyncService::new(ErrorMappingLayer::with_decoder(decoder).layer(transport)),
            |service, layer| layer(service),
        );

        HyperClient {
            service,
            config: self.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert2::check;
    use cloudconvert_core::JsonStatusDecoder;

    use super::*;

    #[test]
    fn client_default() {
        let client = HyperClient::new();
        check!(client.config().timeout == Duration::from_secs(30));
    }

    #[test]
    fn client_with_config() {
        let config = ClientConfig::builder()
            .timeout(Duration::from_secs(60))
            .max_error_body_bytes(2048)
            .build();
        let client = HyperClient::with_config(config);

        check!(client.config().timeout == Duration::from_secs(60));
        check!(client.config().max_error_body_bytes == 2048);
    }

    #[test]
    fn client_is_send_sync_clone() {
        fn assert_client<T: Clone + Send + Sync + 'static>() {}
        assert_client::<HyperClient>();
    }

    #[test]
    fn builder_is_debug() {
        let builder = HyperClient::builder()
            .error_decoder(JsonStatusDecoder::new())
            .with_logging();
        let debug = format!("{builder:?}");
        check!(debug.contains("custom_decoder: true"));
        check!(debug.contains("layers_count: 1"));
    }

    #[test]
    fn rustls_failure_is_found_in_source_chain() {
        let err = io::Error::new(
            io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer),
        );
        check!(
            tls_failure(&err)
                == Some(&rustls::Error::InvalidCertificate(
                    rustls::CertificateError::UnknownIssuer
                ))
        );

        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        check!(tls_failure(&refused).is_none());
    }
}
