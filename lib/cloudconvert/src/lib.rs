//! CloudConvert API client transport with typed error mapping.
//!
//! Every failed call comes back as one [`Error`]: a 4xx as
//! [`Error::Client`], a 5xx as [`Error::Server`], each carrying an
//! [`ApiError`] with the HTTP status, the response headers and the parsed
//! `{ code, message, errors }` body.
//!
//! # Example
//!
//! ```ignore
//! use cloudconvert::prelude::*;
//!
//! let client = HyperClient::builder().with_logging().build();
//!
//! match client.execute(request).await {
//!     Ok(response) => println!("{}", response.status()),
//!     Err(Error::Client(err)) => {
//!         eprintln!("{}", err.summary());
//!         for field_error in err.field_errors() {
//!             eprintln!("  {field_error}");
//!         }
//!     }
//!     Err(err) => return Err(err),
//! }
//! ```

mod client;
mod config;
mod connector;
pub mod middleware;
pub mod prelude;

// Re-export client types
pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use cloudconvert_core::{
    ApiError, DEFAULT_DECODER, DeserializationError, Error, ErrorKind, FieldError, Headers,
    HttpClient, JsonStatusDecoder, RawBody, Response, Result, Status, StatusDecoder, from_json,
};

// Re-export http types for status codes and headers
pub use cloudconvert_core::{StatusCode, header};
