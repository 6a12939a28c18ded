//! Decoded reply values.

use bytes::Bytes;

use crate::error::ServerError;

/// A reply decoded from a Redis-compatible server.
///
/// Covers the five RESP2 reply types. The null bulk string (`$-1\r\n`) and
/// the null array (`*-1\r\n`) are kept apart from their empty counterparts
/// as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reply {
	/// Simple string: `+OK\r\n`
	SimpleString(Bytes),

	/// Error: `-ERR message\r\n`
	Error(Bytes),

	/// Integer: `:1000\r\n`
	Integer(i64),

	/// Bulk string: `$6\r\nfoobar\r\n`, or `$-1\r\n` as `None`
	BulkString(Option<Bytes>),

	/// Array: `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`, or `*-1\r\n` as `None`
	Array(Option<Vec<Reply>>),
}

impl Reply {
	/// Check if the value is an error
	pub fn is_error(&self) -> bool {
		matches!(self, Reply::Error(_))
	}

	/// Check if the value is a null bulk string or a null array
	pub fn is_nil(&self) -> bool {
		matches!(self, Reply::BulkString(None) | Reply::Array(None))
	}

	/// Try to convert to bytes
	pub fn as_bytes(&self) -> Option<&Bytes> {
		match self {
			Reply::SimpleString(b) | Reply::BulkString(Some(b)) => Some(b),
			_ => None,
		}
	}

	/// Try to convert to a string slice
	pub fn as_str(&self) -> Option<&str> {
		self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
	}

	/// Try to convert to integer
	pub fn as_integer(&self) -> Option<i64> {
		match self {
			Reply::Integer(i) => Some(*i),
			_ => None,
		}
	}

	/// Try to convert to array
	pub fn as_array(&self) -> Option<&[Reply]> {
		match self {
			Reply::Array(Some(a)) => Some(a),
			_ => None,
		}
	}

	/// Try to consume and convert to Vec<Reply>
	pub fn into_array(self) -> Option<Vec<Reply>> {
		match self {
			Reply::Array(a) => a,
			_ => None,
		}
	}

	/// Convert to String with lossy UTF-8 conversion
	pub fn to_string_lossy(&self) -> Option<String> {
		self.as_bytes()
			.map(|b| String::from_utf8_lossy(b).into_owned())
	}

	/// Split off server errors so callers can use `?` on replies.
	///
	/// Only a top-level `Error` is converted; errors nested inside an array
	/// (as returned by `EXEC`) are left in place.
	pub fn into_result(self) -> Result<Reply, ServerError> {
		match self {
			Reply::Error(message) => Err(ServerError {
				message: String::from_utf8_lossy(&message).into_owned(),
			}),
			other => Ok(other),
		}
	}

	// Convenience constructors

	/// Status line. The text must not contain `\r\n`, which RESP cannot
	/// carry in a line reply; encoding such a value panics in debug builds.
	pub fn simple_string(s: impl Into<Bytes>) -> Self {
		Reply::SimpleString(s.into())
	}

	/// Error line, under the same no-CRLF rule as [`simple_string`](Self::simple_string).
	pub fn error(e: impl Into<Bytes>) -> Self {
		Reply::Error(e.into())
	}

	pub fn integer(i: i64) -> Self {
		Reply::Integer(i)
	}

	pub fn bulk_string(s: impl Into<Bytes>) -> Self {
		Reply::BulkString(Some(s.into()))
	}

	pub fn nil_bulk() -> Self {
		Reply::BulkString(None)
	}

	/// Create an array value from an iterator
	pub fn array(items: impl IntoIterator<Item = Reply>) -> Self {
		Reply::Array(Some(items.into_iter().collect()))
	}

	pub fn nil_array() -> Self {
		Reply::Array(None)
	}
}

impl From<i64> for Reply {
	fn from(i: i64) -> Self {
		Reply::Integer(i)
	}
}

impl From<Vec<Reply>> for Reply {
	fn from(v: Vec<Reply>) -> Self {
		Reply::Array(Some(v))
	}
}
