//! Incremental reply parser.
//!
//! Bytes are pushed in whatever chunks the transport delivers. The parser
//! keeps unconsumed input plus an explicit stack of open arrays, so a reply can
//! be suspended at any point (mid line, mid payload, at any nesting depth) and
//! picked up again when more bytes arrive.

use bytes::Buf;
use bytes::Bytes;
use bytes::BytesMut;
use log::debug;
use log::trace;
use log::warn;

use crate::config::ParserConfig;
use crate::error::LimitError;
use crate::error::ParseError;
use crate::error::RespError;
use crate::types::Reply;
use crate::utils::*;

/// Upper bound on slots reserved up front for an array, whatever it declares.
const MAX_PREALLOC_ELEMENTS: usize = 1024;

/// A stateful RESP reply parser, one per connection.
///
/// ```
/// use akane_resp::Reply;
/// use akane_resp::ReplyParser;
///
/// let mut parser = ReplyParser::new();
/// assert!(parser.feed(b"$5\r\nhel").unwrap().is_empty());
/// assert_eq!(parser.feed(b"lo\r\n+OK\r\n").unwrap(), vec![
/// 	Reply::bulk_string("hello"),
/// 	Reply::simple_string("OK"),
/// ]);
/// ```
#[derive(Debug)]
pub struct ReplyParser {
	config: ParserConfig,
	buf: BytesMut,
	frames: Vec<Frame>,
	pending: Pending,
	/// Bytes at the front of `buf` already searched for a line terminator.
	scanned: usize,
	failed: Option<RespError>,
}

#[derive(Debug)]
enum Frame {
	Root,
	Array {
		expected: usize,
		elements: Vec<Reply>,
	},
}

/// Progress inside the unit at the front of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
	/// Expecting a type marker.
	Marker,
	/// The `$<len>` line is consumed; waiting on payload and CRLF.
	BulkPayload { len: usize },
}

enum ParsedItem {
	Value(Reply),
	FramePushed,
}

impl Default for ReplyParser {
	fn default() -> Self {
		Self::new()
	}
}

impl ReplyParser {
	pub fn new() -> Self {
		Self::with_config(ParserConfig::default())
	}

	pub fn with_config(config: ParserConfig) -> Self {
		Self {
			config,
			buf: BytesMut::new(),
			frames: Vec::new(),
			pending: Pending::Marker,
			scanned: 0,
			failed: None,
		}
	}

	pub fn config(&self) -> &ParserConfig {
		&self.config
	}

	/// Append `chunk` and decode every reply it completes, in arrival order.
	///
	/// # Errors
	///
	/// Returns the first protocol or limit violation found in the pending
	/// input. The parser is then failed for good, and replies completed earlier
	/// in the same call are dropped along with it. Use
	/// [`push_bytes`](Self::push_bytes) with [`next_reply`](Self::next_reply)
	/// to receive each reply that precedes the violation.
	pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Reply>, RespError> {
		self.push_bytes(chunk)?;
		let mut replies = Vec::new();
		while let Some(reply) = self.next_reply()? {
			replies.push(reply);
		}
		Ok(replies)
	}

	/// Append `chunk` to the pending input without decoding anything.
	pub fn push_bytes(&mut self, chunk: &[u8]) -> Result<(), RespError> {
		self.check_failed()?;
		let max = self.config.max_buffer_len;
		if self.buf.len().saturating_add(chunk.len()) > max {
			return Err(self.fail(LimitError::BufferFull { max }.into()));
		}
		self.buf.extend_from_slice(chunk);
		Ok(())
	}

	/// Decode the next complete reply, or `Ok(None)` if more input is needed.
	pub fn next_reply(&mut self) -> Result<Option<Reply>, RespError> {
		self.check_failed()?;
		match self.decode() {
			Ok(reply) => Ok(reply),
			Err(e) => Err(self.fail(e)),
		}
	}

	/// Bytes received but not yet consumed by a completed unit.
	///
	/// Elements already folded into an open array are not counted.
	pub fn buffered_len(&self) -> usize {
		self.buf.len()
	}

	/// Number of arrays currently open.
	pub fn depth(&self) -> usize {
		self.frames
			.iter()
			.filter(|f| matches!(f, Frame::Array { .. }))
			.count()
	}

	/// True when no input is buffered and no reply is partially decoded.
	pub fn is_idle(&self) -> bool {
		self.buf.is_empty() && self.depth() == 0 && self.pending == Pending::Marker
	}

	pub fn is_failed(&self) -> bool {
		self.failed.is_some()
	}

	fn check_failed(&self) -> Result<(), RespError> {
		match &self.failed {
			Some(e) => Err(e.clone()),
			None => Ok(()),
		}
	}

	fn fail(&mut self, e: RespError) -> RespError {
		warn!("reply parser failed: {}", e);
		self.failed = Some(e.clone());
		e
	}

	fn decode(&mut self) -> Result<Option<Reply>, RespError> {
		if self.frames.is_empty() {
			self.frames.push(Frame::Root);
		}

		loop {
			match self.parse_step()? {
				Some(ParsedItem::FramePushed) => continue,
				Some(ParsedItem::Value(value)) => {
					if let Some(reply) = self.fold_value(value) {
						return Ok(Some(reply));
					}
				}
				None => {
					trace!(
						"reply incomplete: {} bytes buffered, depth {}",
						self.buf.len(),
						self.depth()
					);
					return Ok(None);
				}
			}
		}
	}

	/// Add a finished value to the innermost open container, closing every
	/// container it completes. Returns the reply once the root is reached.
	fn fold_value(&mut self, mut value: Reply) -> Option<Reply> {
		loop {
			match self.frames.last_mut() {
				Some(Frame::Array { expected, elements }) => {
					elements.push(value);
					if elements.len() < *expected {
						return None;
					}
					let done = std::mem::take(elements);
					self.frames.pop();
					value = Reply::Array(Some(done));
				}
				Some(Frame::Root) => {
					self.frames.pop();
					return Some(value);
				}
				None => return Some(value),
			}
		}
	}

	/// Tries to decode the next grammar unit.
	/// A leaf value yields `Value`, an array header pushes a frame and yields
	/// `FramePushed`, and missing input yields `None`.
	fn parse_step(&mut self) -> Result<Option<ParsedItem>, RespError> {
		if let Pending::BulkPayload { len } = self.pending {
			return self.parse_bulk_payload(len);
		}

		let Some(&marker) = self.buf.first() else {
			return Ok(None);
		};
		if !matches!(
			marker,
			SIMPLE_STRING | ERROR | INTEGER | BULK_STRING | ARRAY
		) {
			return Err(ParseError::InvalidTypeMarker(marker).into());
		}

		let Some(line) = self.take_line()? else {
			return Ok(None);
		};

		match marker {
			SIMPLE_STRING => Ok(Some(ParsedItem::Value(Reply::SimpleString(line)))),
			ERROR => Ok(Some(ParsedItem::Value(Reply::Error(line)))),
			INTEGER => {
				let n = parse_integer(&line)?;
				Ok(Some(ParsedItem::Value(Reply::Integer(n))))
			}
			BULK_STRING => self.start_bulk_string(&line),
			_ => self.start_array(&line),
		}
	}

	/// Remove `<marker><line>\r\n` from the front of the buffer and return
	/// `<line>`, or `None` if the terminator has not arrived.
	fn take_line(&mut self) -> Result<Option<Bytes>, RespError> {
		let max = self.config.max_line_len;
		// A '\r' at the end of the last scan may pair with a '\n' just received.
		let from = self.scanned.saturating_sub(1).max(1);

		match find_crlf_from(&self.buf, from) {
			Some(pos) => {
				if pos - 1 > max {
					return Err(LimitError::LineTooLong { max }.into());
				}
				let mut line = self.buf.split_to(pos + CRLF.len());
				line.truncate(pos);
				line.advance(1);
				self.scanned = 0;
				Ok(Some(line.freeze()))
			}
			None => {
				// Marker, at most `max` bytes of content and a trailing '\r'.
				if self.buf.len() > max.saturating_add(2) {
					return Err(LimitError::LineTooLong { max }.into());
				}
				self.scanned = self.buf.len();
				Ok(None)
			}
		}
	}

	fn start_bulk_string(&mut self, line: &[u8]) -> Result<Option<ParsedItem>, RespError> {
		let length = parse_integer(line)?;
		if length == -1 {
			return Ok(Some(ParsedItem::Value(Reply::BulkString(None))));
		}
		if length < -1 {
			return Err(ParseError::InvalidBulkStringLength(length).into());
		}

		let max = self.config.max_bulk_len;
		if length as u64 > max as u64 {
			return Err(LimitError::BulkStringTooLong {
				len: usize::try_from(length).unwrap_or(usize::MAX),
				max,
			}
			.into());
		}

		let len = length as usize;
		self.pending = Pending::BulkPayload { len };
		self.parse_bulk_payload(len)
	}

	fn parse_bulk_payload(&mut self, len: usize) -> Result<Option<ParsedItem>, RespError> {
		let total_needed = len + CRLF.len();
		if self.buf.len() < total_needed {
			// Reject a bad terminator as soon as its first byte is visible.
			if self.buf.len() == len + 1 && self.buf[len] != b'\r' {
				return Err(ParseError::MissingBulkTerminator.into());
			}
			return Ok(None);
		}
		if &self.buf[len..total_needed] != CRLF {
			return Err(ParseError::MissingBulkTerminator.into());
		}

		let data = self.buf.split_to(len).freeze();
		self.buf.advance(CRLF.len());
		self.pending = Pending::Marker;
		Ok(Some(ParsedItem::Value(Reply::BulkString(Some(data)))))
	}

	fn start_array(&mut self, line: &[u8]) -> Result<Option<ParsedItem>, RespError> {
		let length = parse_integer(line)?;
		if length == -1 {
			return Ok(Some(ParsedItem::Value(Reply::Array(None))));
		}
		if length < -1 {
			return Err(ParseError::InvalidArrayLength(length).into());
		}
		if length == 0 {
			return Ok(Some(ParsedItem::Value(Reply::Array(Some(Vec::new())))));
		}

		let max = self.config.max_array_len;
		if length as u64 > max as u64 {
			return Err(LimitError::TooManyElements {
				len: usize::try_from(length).unwrap_or(usize::MAX),
				max,
			}
			.into());
		}

		let depth = self.depth();
		if depth >= self.config.max_depth {
			return Err(LimitError::NestingTooDeep {
				max: self.config.max_depth,
			}
			.into());
		}

		let length = length as usize;
		debug!("opening array of {} elements at depth {}", length, depth + 1);
		self.frames.push(Frame::Array {
			expected: length,
			elements: Vec::with_capacity(length.min(MAX_PREALLOC_ELEMENTS)),
		});
		Ok(Some(ParsedItem::FramePushed))
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	fn feed_all(input: &[u8]) -> Result<Vec<Reply>, RespError> {
		ReplyParser::new().feed(input)
	}

	#[rstest]
	#[case(b"+OK\r\n", Reply::simple_string("OK"))]
	#[case(b"+\r\n", Reply::simple_string(""))]
	#[case(b"-ERR unknown command\r\n", Reply::error("ERR unknown command"))]
	#[case(b":1000\r\n", Reply::integer(1000))]
	#[case(b":-42\r\n", Reply::integer(-42))]
	#[case(b"$6\r\nfoobar\r\n", Reply::bulk_string("foobar"))]
	#[case(b"$0\r\n\r\n", Reply::bulk_string(""))]
	#[case(b"$-1\r\n", Reply::nil_bulk())]
	#[case(b"*0\r\n", Reply::array(vec![]))]
	#[case(b"*-1\r\n", Reply::nil_array())]
	#[case(b"$4\r\na\r\nb\r\n", Reply::bulk_string("a\r\nb"))]
	fn test_parse_single(#[case] input: &[u8], #[case] expected: Reply) {
		assert_eq!(feed_all(input).unwrap(), vec![expected]);
	}

	#[test]
	fn test_parse_nested_array() {
		let replies = feed_all(b"*2\r\n$1\r\na\r\n*1\r\n:7\r\n").unwrap();
		assert_eq!(
			replies,
			vec![Reply::array(vec![
				Reply::bulk_string("a"),
				Reply::array(vec![Reply::integer(7)]),
			])]
		);
	}

	#[test]
	fn test_parse_array_with_nil_elements() {
		let replies = feed_all(b"*3\r\n$-1\r\n*-1\r\n*0\r\n").unwrap();
		assert_eq!(
			replies,
			vec![Reply::array(vec![
				Reply::nil_bulk(),
				Reply::nil_array(),
				Reply::array(vec![]),
			])]
		);
	}

	#[test]
	fn test_pipelined_replies() {
		let replies = feed_all(b"+OK\r\n:5\r\n").unwrap();
		assert_eq!(replies, vec![Reply::simple_string("OK"), Reply::integer(5)]);
	}

	#[test]
	fn test_bulk_suspends_without_rereading_length() {
		let mut parser = ReplyParser::new();
		assert!(parser.feed(b"$5\r\nhel").unwrap().is_empty());
		// Only the payload prefix is left; the length line was consumed.
		assert_eq!(parser.buffered_len(), 3);
		assert!(!parser.is_idle());
		assert_eq!(
			parser.feed(b"lo\r\n").unwrap(),
			vec![Reply::bulk_string("hello")]
		);
		assert!(parser.is_idle());
	}

	#[test]
	fn test_array_suspends_mid_nesting() {
		let mut parser = ReplyParser::new();
		assert!(parser.feed(b"*2\r\n*2\r\n:1\r\n").unwrap().is_empty());
		assert_eq!(parser.depth(), 2);
		assert_eq!(parser.buffered_len(), 0);
		assert!(parser.feed(b":2\r\n").unwrap().is_empty());
		assert_eq!(parser.depth(), 1);
		assert_eq!(
			parser.feed(b"+x\r\n").unwrap(),
			vec![Reply::array(vec![
				Reply::array(vec![Reply::integer(1), Reply::integer(2)]),
				Reply::simple_string("x"),
			])]
		);
		assert_eq!(parser.depth(), 0);
	}

	#[test]
	fn test_line_split_across_crlf() {
		let mut parser = ReplyParser::new();
		assert!(parser.feed(b"+OK\r").unwrap().is_empty());
		assert_eq!(
			parser.feed(b"\n").unwrap(),
			vec![Reply::simple_string("OK")]
		);
	}

	#[test]
	fn test_next_reply_one_at_a_time() {
		let mut parser = ReplyParser::new();
		parser.push_bytes(b":1\r\n:2\r\n:").unwrap();
		assert_eq!(parser.next_reply().unwrap(), Some(Reply::integer(1)));
		assert_eq!(parser.next_reply().unwrap(), Some(Reply::integer(2)));
		assert_eq!(parser.next_reply().unwrap(), None);
		assert_eq!(parser.buffered_len(), 1);
	}

	#[rstest]
	#[case(b"?\r\n")]
	#[case(b"x")]
	#[case(b":\r\n")]
	#[case(b":12a\r\n")]
	#[case(b":+5\r\n")]
	#[case(b"$-2\r\n")]
	#[case(b"*-5\r\n")]
	#[case(b"$abc\r\n")]
	#[case(b"$3\r\nfooXY")]
	#[case(b"$3\r\nfoo\rX")]
	#[case(b"*1\r\n!\r\n")]
	fn test_protocol_errors(#[case] input: &[u8]) {
		let mut parser = ReplyParser::new();
		let err = parser.feed(input).unwrap_err();
		assert!(err.is_protocol(), "unexpected error {:?}", err);
		assert!(parser.is_failed());
	}

	#[test]
	fn test_failed_parser_stays_failed() {
		let mut parser = ReplyParser::new();
		let first = parser.feed(b"?\r\n").unwrap_err();
		assert_eq!(first, RespError::from(ParseError::InvalidTypeMarker(b'?')));

		// Valid input is not parsed once failed.
		assert_eq!(parser.feed(b"+OK\r\n").unwrap_err(), first);
		assert_eq!(parser.next_reply().unwrap_err(), first);
		assert_eq!(parser.push_bytes(b"").unwrap_err(), first);
	}

	#[test]
	fn test_nesting_limit() {
		let config = ParserConfig::new().max_depth(2);
		let mut parser = ReplyParser::with_config(config);
		assert_eq!(
			parser.feed(b"*1\r\n*1\r\n:1\r\n").unwrap(),
			vec![Reply::array(vec![Reply::array(vec![Reply::integer(1)])])]
		);

		let err = parser.feed(b"*1\r\n*1\r\n*1\r\n:1\r\n").unwrap_err();
		assert_eq!(err, RespError::from(LimitError::NestingTooDeep { max: 2 }));
		assert!(err.is_resource_exhausted());
	}

	#[test]
	fn test_default_nesting_limit() {
		let mut input = Vec::new();
		for _ in 0..33 {
			input.extend_from_slice(b"*1\r\n");
		}
		input.extend_from_slice(b":1\r\n");
		let err = feed_all(&input).unwrap_err();
		assert_eq!(err, RespError::from(LimitError::NestingTooDeep { max: 32 }));

		// 32 levels are accepted.
		assert_eq!(feed_all(&input[4..]).unwrap().len(), 1);
	}

	#[test]
	fn test_line_too_long() {
		let config = ParserConfig::new().max_line_len(4);
		assert_eq!(
			ReplyParser::with_config(config).feed(b"+abcd\r\n").unwrap(),
			vec![Reply::simple_string("abcd")]
		);

		let err = ReplyParser::with_config(config)
			.feed(b"+abcde\r\n")
			.unwrap_err();
		assert_eq!(err, RespError::from(LimitError::LineTooLong { max: 4 }));

		// Detected before any terminator arrives.
		let err = ReplyParser::with_config(config)
			.feed(b"+abcdefgh")
			.unwrap_err();
		assert_eq!(err, RespError::from(LimitError::LineTooLong { max: 4 }));
	}

	#[test]
	fn test_bulk_and_array_limits() {
		let config = ParserConfig::new().max_bulk_len(3).max_array_len(2);
		let err = ReplyParser::with_config(config)
			.feed(b"$4\r\n")
			.unwrap_err();
		assert_eq!(err, RespError::from(LimitError::BulkStringTooLong { len: 4, max: 3 }));

		let err = ReplyParser::with_config(config)
			.feed(b"*3\r\n")
			.unwrap_err();
		assert_eq!(err, RespError::from(LimitError::TooManyElements { len: 3, max: 2 }));
	}

	#[test]
	fn test_buffer_limit() {
		let config = ParserConfig::new().max_buffer_len(8);
		let mut parser = ReplyParser::with_config(config);
		assert!(parser.feed(b"$10\r\n").unwrap().is_empty());
		let err = parser.feed(b"0123456789").unwrap_err();
		assert_eq!(err, RespError::from(LimitError::BufferFull { max: 8 }));
		assert!(parser.is_failed());
	}

	#[test]
	fn test_huge_declared_array_does_not_preallocate() {
		let mut parser = ReplyParser::new();
		assert!(parser.feed(b"*4000000000\r\n").unwrap().is_empty());
		assert_eq!(parser.depth(), 1);
	}
}
