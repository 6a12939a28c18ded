//! Wire constants and line helpers shared by the encoder and the parser.

use memchr::memmem;

use crate::error::ParseError;

/// CRLF line ending
pub const CRLF: &[u8] = b"\r\n";

/// Type markers
pub const SIMPLE_STRING: u8 = b'+';
pub const ERROR: u8 = b'-';
pub const INTEGER: u8 = b':';
pub const BULK_STRING: u8 = b'$';
pub const ARRAY: u8 = b'*';

/// Find the position of CRLF in a byte slice
#[inline]
pub fn find_crlf(buf: &[u8]) -> Option<usize> {
	memmem::find(buf, CRLF)
}

/// Find CRLF in `buf`, skipping the first `from` bytes which are known not to
/// contain the start of a terminator.
#[inline]
pub fn find_crlf_from(buf: &[u8], from: usize) -> Option<usize> {
	let from = from.min(buf.len());
	find_crlf(&buf[from..]).map(|pos| from + pos)
}

/// Parse a signed decimal integer line.
///
/// Accepts an optional leading `-` followed by at least one ASCII digit.
/// Anything else (empty input, `+` sign, whitespace, overflow) is rejected.
pub fn parse_integer(buf: &[u8]) -> Result<i64, ParseError> {
	let invalid = || ParseError::InvalidInteger(String::from_utf8_lossy(buf).into_owned());

	let (negative, digits) = match buf.split_first() {
		Some((b'-', rest)) => (true, rest),
		_ => (false, buf),
	};
	if digits.is_empty() {
		return Err(invalid());
	}

	let mut value: i64 = 0;
	for &b in digits {
		if !b.is_ascii_digit() {
			return Err(invalid());
		}
		let digit = i64::from(b - b'0');
		// Accumulate towards the sign so that i64::MIN is representable.
		value = value.checked_mul(10).ok_or_else(invalid)?;
		value = if negative {
			value.checked_sub(digit)
		} else {
			value.checked_add(digit)
		}
		.ok_or_else(invalid)?;
	}
	Ok(value)
}
