//! Prelude module for convenient imports.
//!
//! ```ignore
//! use cloudconvert_core::prelude::*;
//! ```

pub use crate::{
    ApiError, DEFAULT_DECODER, DeserializationError, Error, ErrorKind, FieldError, Headers,
    HttpClient, JsonStatusDecoder, RawBody, Response, Result, Status, StatusCode, StatusDecoder,
};
