//! Typed error mapping for the CloudConvert API.
//!
//! This crate turns a failed HTTP response (status, headers, raw body) into
//! a structured error:
//! - [`Status`] and [`FieldError`] - Parsed `{ code, message, errors }` error body
//! - [`StatusDecoder`] and [`JsonStatusDecoder`] - Response deserializer
//! - [`ApiError`] - HTTP status, headers, and parsed body of one failed response
//! - [`Error`] and [`Result`] - Client (4xx), server (5xx) and transport failures
//! - [`Headers`] - Case-insensitive response headers
//! - [`RawBody`] - Single-use response body stream
//! - [`Response`] - Buffered HTTP response
//! - [`HttpClient`] - Transport seam returning typed errors
//! - [`StatusCode`] - HTTP status codes (re-exported from `http` crate)

mod body;
mod client;
mod decoder;
mod error;
mod headers;
pub mod prelude;
mod response;
mod status;

pub use body::{RawBody, from_json};
pub use client::HttpClient;
pub use decoder::{DEFAULT_DECODER, DeserializationError, JsonStatusDecoder, StatusDecoder};
pub use error::{ApiError, Error, ErrorKind, Result};
pub use headers::Headers;
pub use response::Response;
pub use status::{FieldError, Status};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
