//! Tower middleware layers for the cloudconvert HTTP client.
//!
//! Layers wrap a service of `http::Request<Bytes>` returning
//! [`Response`](crate::Response) or [`Error`](crate::Error).
//!
//! - [`ErrorMappingLayer`] - Turns non-2xx responses into typed errors
//!   (always installed by [`HyperClientBuilder`](crate::HyperClientBuilder))
//! - [`LoggingLayer`] - Logs requests and typed failures using `tracing`
//!
//! # Example
//!
//! ```ignore
//! use cloudconvert::HyperClient;
//!
//! let client = HyperClient::builder()
//!     .with_logging()
//!     .build();
//! ```

mod error_mapping;
mod logging;

pub use error_mapping::{ErrorMapping, ErrorMappingLayer};
pub use logging::{LogLevel, Logging, LoggingLayer};

// Re-export tower utilities for power users
pub use tower::ServiceBuilder;
