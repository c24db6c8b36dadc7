//! Prelude module for convenient imports.
//!
//! ```ignore
//! use cloudconvert::prelude::*;
//! ```

pub use crate::{
    ApiError, ClientConfig, Error, ErrorKind, FieldError, Headers, HttpClient, HyperClient,
    Response, Result, Status, StatusCode, StatusDecoder,
};
