//! Limits applied by the reply parser.

use serde::Deserialize;
use serde::Serialize;

/// Default maximum nesting depth of arrays.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default maximum length of a `\r\n`-terminated line (64KB).
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

/// Default maximum bulk string length, matching the server's
/// `proto-max-bulk-len` default (512MB).
pub const DEFAULT_MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Default maximum declared element count of a single array.
pub const DEFAULT_MAX_ARRAY_LEN: usize = u32::MAX as usize;

/// Default maximum number of bytes buffered awaiting a complete reply (1GB).
pub const DEFAULT_MAX_BUFFER_LEN: usize = 1024 * 1024 * 1024;

/// Parser limits.
///
/// Every field has a default, so a partial table deserializes cleanly:
///
/// ```
/// let config: akane_resp::ParserConfig = serde_json::from_str(r#"{"max_depth": 8}"#).unwrap();
/// assert_eq!(config.max_depth, 8);
/// assert_eq!(config.max_line_len, akane_resp::DEFAULT_MAX_LINE_LEN);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
	/// Maximum nesting depth of arrays.
	pub max_depth: usize,
	/// Maximum length of a simple string, error, integer, length or count line.
	pub max_line_len: usize,
	/// Maximum declared length of a bulk string.
	pub max_bulk_len: usize,
	/// Maximum declared element count of an array.
	pub max_array_len: usize,
	/// Maximum number of bytes held while waiting for more input.
	pub max_buffer_len: usize,
}

impl Default for ParserConfig {
	fn default() -> Self {
		Self::new()
	}
}

impl ParserConfig {
	pub const fn new() -> Self {
		Self {
			max_depth: DEFAULT_MAX_DEPTH,
			max_line_len: DEFAULT_MAX_LINE_LEN,
			max_bulk_len: DEFAULT_MAX_BULK_LEN,
			max_array_len: DEFAULT_MAX_ARRAY_LEN,
			max_buffer_len: DEFAULT_MAX_BUFFER_LEN,
		}
	}

	pub const fn max_depth(mut self, depth: usize) -> Self {
		self.max_depth = depth;
		self
	}

	pub const fn max_line_len(mut self, len: usize) -> Self {
		self.max_line_len = len;
		self
	}

	pub const fn max_bulk_len(mut self, len: usize) -> Self {
		self.max_bulk_len = len;
		self
	}

	pub const fn max_array_len(mut self, len: usize) -> Self {
		self.max_array_len = len;
		self
	}

	pub const fn max_buffer_len(mut self, len: usize) -> Self {
		self.max_buffer_len = len;
		self
	}
}
