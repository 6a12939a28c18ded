//! Error types for RESP encoding and parsing.

use thiserror::Error;

/// Main error type for RESP operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RespError {
	/// A request part could not be turned into bytes
	#[error("Encode error: {0}")]
	Encode(#[from] EncodeError),

	/// Malformed input from the wire
	#[error("Protocol error: {0}")]
	Parse(#[from] ParseError),

	/// Input exceeded one of the configured parser limits
	#[error("Resource exhausted: {0}")]
	ResourceExhausted(#[from] LimitError),
}

impl RespError {
	/// Whether this is a wire format violation.
	pub fn is_protocol(&self) -> bool {
		matches!(self, RespError::Parse(_))
	}

	/// Whether a configured bound was exceeded.
	pub fn is_resource_exhausted(&self) -> bool {
		matches!(self, RespError::ResourceExhausted(_))
	}
}

/// Errors that can occur while encoding a command.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
	/// A text argument was not valid UTF-8
	#[error("Argument {index} is not valid UTF-8")]
	InvalidUtf8 { index: usize },
}

/// Errors that can occur during RESP parsing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
	/// Invalid type marker encountered
	#[error("Invalid type marker: {0:#04x}")]
	InvalidTypeMarker(u8),

	/// Integer, length or count line is not a decimal number
	#[error("Invalid integer: {0:?}")]
	InvalidInteger(String),

	/// Invalid bulk string length
	#[error("Invalid bulk string length: {0}")]
	InvalidBulkStringLength(i64),

	/// Invalid array length
	#[error("Invalid array length: {0}")]
	InvalidArrayLength(i64),

	/// Bulk payload was not followed by CRLF
	#[error("Missing CRLF after bulk string")]
	MissingBulkTerminator,
}

/// A configured parser bound was exceeded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LimitError {
	#[error("Nesting too deep: more than {max} levels of arrays")]
	NestingTooDeep { max: usize },

	#[error("Line exceeds maximum length of {max} bytes")]
	LineTooLong { max: usize },

	#[error("Bulk string too long: {len} bytes exceeds {max} byte limit")]
	BulkStringTooLong { len: usize, max: usize },

	#[error("Array too large: {len} elements exceeds {max} element limit")]
	TooManyElements { len: usize, max: usize },

	#[error("Input buffer exceeds maximum of {max} bytes")]
	BufferFull { max: usize },
}

/// An `Error` reply returned by the server, as produced by
/// [`Reply::into_result`](crate::Reply::into_result).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ServerError {
	pub message: String,
}

impl ServerError {
	/// The leading word of the message, e.g. `ERR` or `WRONGTYPE`.
	pub fn kind(&self) -> &str {
		self.message.split(' ').next().unwrap_or_default()
	}
}
