//! Response deserializer: turns a raw error body into a [`Status`].

use derive_more::{Display, Error};

use crate::{RawBody, Status};

/// Why an error body could not be turned into a [`Status`].
///
/// This is always a secondary detail: an [`ApiError`](crate::ApiError) keeps
/// it next to the HTTP status rather than replacing the HTTP failure.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum DeserializationError {
    /// The body was empty or contained only whitespace.
    #[display("empty response body")]
    EmptyBody,

    /// Reading the body stream failed.
    #[display("failed to read response body: {message}")]
    Io {
        /// I/O error description.
        message: String,
    },

    /// The body is not JSON, or not shaped like an error payload.
    #[display("malformed error body at '{path}': {message}")]
    Json {
        /// JSON path to the failure (`.` for the document root).
        path: String,
        /// Parser message.
        message: String,
    },
}

/// Decodes error bodies into [`Status`] values.
///
/// Decoders are stateless and shared: one instance may serve any number of
/// concurrent constructions. The body is taken by value, so it is consumed
/// exactly once and released before `decode` returns.
///
/// # Example
///
/// ```
/// use cloudconvert_core::{DeserializationError, RawBody, Status, StatusDecoder};
///
/// /// Treats every body as a plain-text message.
/// struct PlainTextDecoder;
///
/// impl StatusDecoder for PlainTextDecoder {
///     fn decode(&self, body: RawBody) -> Result<Status, DeserializationError> {
///         let bytes = body.read_to_end().map_err(|e| DeserializationError::Io {
///             message: e.to_string(),
///         })?;
///         let message = String::from_utf8_lossy(&bytes).trim().to_string();
///         Ok(Status::new("", message, vec![]))
///     }
/// }
///
/// let status = PlainTextDecoder.decode(RawBody::from("Bad Gateway")).expect("decode");
/// assert_eq!(status.message(), "Bad Gateway");
/// ```
pub trait StatusDecoder: Send + Sync + 'static {
    /// Consume `body` and parse it.
    ///
    /// # Errors
    ///
    /// Returns a [`DeserializationError`] when the body cannot be parsed.
    fn decode(&self, body: RawBody) -> Result<Status, DeserializationError>;
}

/// Default JSON decoder for the `{ code, message, errors }` wire shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonStatusDecoder {
    max_body_bytes: Option<u64>,
}

/// Shared default decoder.
pub static DEFAULT_DECODER: JsonStatusDecoder = JsonStatusDecoder::new();

impl JsonStatusDecoder {
    /// Create a decoder that reads the whole body.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_body_bytes: None,
        }
    }

    /// Create a decoder that reads at most `limit` bytes of the body.
    ///
    /// A body cut by the limit is usually no longer valid JSON and decodes to
    /// [`DeserializationError::Json`].
    #[must_use]
    pub const fn with_max_body_bytes(limit: u64) -> Self {
        Self {
            max_body_bytes: Some(limit),
        }
    }

    /// Configured read limit, if any.
    #[must_use]
    pub const fn max_body_bytes(&self) -> Option<u64> {
        self.max_body_bytes
    }

    /// Parse an already buffered body.
    ///
    /// # Errors
    ///
    /// See [`StatusDecoder::decode`].
    pub fn decode_slice(&self, bytes: &[u8]) -> Result<Status, DeserializationError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(DeserializationError::EmptyBody);
        }

        let mut deserializer = serde_json::Deserializer::from_slice(bytes);
        let status: Status = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|e| DeserializationError::Json {
                path: e.path().to_string(),
                message: e.inner().to_string(),
            })?;
        deserializer
            .end()
            .map_err(|e| DeserializationError::Json {
                path: ".".to_string(),
                message: e.to_string(),
            })?;

        Ok(status)
    }
}

impl StatusDecoder for JsonStatusDecoder {
    fn decode(&self, body: RawBody) -> Result<Status, DeserializationError> {
        let body = match self.max_body_bytes {
            Some(limit) => body.take(limit),
            None => body,
        };
        let bytes = body
            .read_to_end()
            .map_err(|e| DeserializationError::Io {
                message: e.to_string(),
            })?;

        self.decode_slice(&bytes)
    }
}
