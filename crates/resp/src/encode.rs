//! Request encoding.
//!
//! A command is written as an array of bulk strings:
//! `*<n>\r\n` followed by `$<len>\r\n<bytes>\r\n` for each part.

use std::ffi::OsStr;
use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;

use bytes::Bytes;

use crate::buffer::ByteBuffer;
use crate::buffer::decimal_len;
use crate::error::EncodeError;
use crate::types::Reply;
use crate::utils::*;

/// One command part, borrowed from the value it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg<'a> {
	Bytes(&'a [u8]),
	/// Sent as its decimal rendering.
	Integer(i64),
}

impl Arg<'_> {
	/// Byte length of the part on the wire, excluding framing.
	#[inline]
	fn payload_len(&self) -> usize {
		match self {
			Arg::Bytes(b) => b.len(),
			Arg::Integer(i) => decimal_len(*i),
		}
	}

	#[inline]
	fn write_bulk(&self, buf: &mut ByteBuffer) {
		buf.append_header(BULK_STRING, self.payload_len() as i64);
		match self {
			Arg::Bytes(b) => buf.append(b),
			Arg::Integer(i) => buf.append_decimal(*i),
		}
		buf.append_crlf();
	}
}

/// Values that can be sent as a command part.
pub trait ToArg {
	fn to_arg(&self) -> Result<Arg<'_>, EncodeError>;
}

impl<T: ToArg + ?Sized> ToArg for &T {
	fn to_arg(&self) -> Result<Arg<'_>, EncodeError> {
		(**self).to_arg()
	}
}

impl ToArg for str {
	fn to_arg(&self) -> Result<Arg<'_>, EncodeError> {
		Ok(Arg::Bytes(self.as_bytes()))
	}
}

impl ToArg for String {
	fn to_arg(&self) -> Result<Arg<'_>, EncodeError> {
		Ok(Arg::Bytes(self.as_bytes()))
	}
}

impl ToArg for [u8] {
	fn to_arg(&self) -> Result<Arg<'_>, EncodeError> {
		Ok(Arg::Bytes(self))
	}
}

impl<const N: usize> ToArg for [u8; N] {
	fn to_arg(&self) -> Result<Arg<'_>, EncodeError> {
		Ok(Arg::Bytes(self))
	}
}

impl ToArg for Vec<u8> {
	fn to_arg(&self) -> Result<Arg<'_>, EncodeError> {
		Ok(Arg::Bytes(self))
	}
}

impl ToArg for Bytes {
	fn to_arg(&self) -> Result<Arg<'_>, EncodeError> {
		Ok(Arg::Bytes(self))
	}
}

impl ToArg for i64 {
	fn to_arg(&self) -> Result<Arg<'_>, EncodeError> {
		Ok(Arg::Integer(*self))
	}
}

macro_rules! impl_to_arg_widening {
	($($ty:ty),*) => {
		$(
			impl ToArg for $ty {
				fn to_arg(&self) -> Result<Arg<'_>, EncodeError> {
					Ok(Arg::Integer(i64::from(*self)))
				}
			}
		)*
	};
}

impl_to_arg_widening!(i32, u32, u16);

// Text that is only UTF-8 by convention. The index is patched in by the
// caller, which knows the part's position.
impl ToArg for OsStr {
	fn to_arg(&self) -> Result<Arg<'_>, EncodeError> {
		self.to_str()
			.map(|s| Arg::Bytes(s.as_bytes()))
			.ok_or(EncodeError::InvalidUtf8 { index: 0 })
	}
}

impl ToArg for OsString {
	fn to_arg(&self) -> Result<Arg<'_>, EncodeError> {
		self.as_os_str().to_arg()
	}
}

impl ToArg for Path {
	fn to_arg(&self) -> Result<Arg<'_>, EncodeError> {
		self.as_os_str().to_arg()
	}
}

impl ToArg for PathBuf {
	fn to_arg(&self) -> Result<Arg<'_>, EncodeError> {
		self.as_os_str().to_arg()
	}
}

fn arg_at<A: ToArg + ?Sized>(part: &A, index: usize) -> Result<Arg<'_>, EncodeError> {
	part.to_arg().map_err(|e| match e {
		EncodeError::InvalidUtf8 { .. } => EncodeError::InvalidUtf8 { index },
	})
}

/// Encode a command into its wire form.
///
/// ```
/// let wire = akane_resp::encode(&["SET", "key", "val"]).unwrap();
/// assert_eq!(&wire[..], b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$3\r\nval\r\n");
/// ```
///
/// Mixed part types go through `&dyn ToArg`:
///
/// ```
/// use akane_resp::ToArg;
///
/// let parts: [&dyn ToArg; 3] = [&"EXPIRE", &"key", &10i64];
/// let wire = akane_resp::encode(&parts).unwrap();
/// assert_eq!(&wire[..], b"*3\r\n$6\r\nEXPIRE\r\n$3\r\nkey\r\n$2\r\n10\r\n");
/// ```
pub fn encode<A: ToArg>(parts: &[A]) -> Result<Bytes, EncodeError> {
	let mut buf = ByteBuffer::with_capacity(encoded_len(parts)?);
	write_command(&mut buf, parts)?;
	Ok(buf.finalize())
}

/// Append the wire form of a command to `buf`.
///
/// Every part is converted and measured before anything is written, so on
/// error `buf` is left untouched. Nothing is allocated besides the growth of
/// `buf`, which is reserved once up front.
pub fn encode_to<A: ToArg>(buf: &mut ByteBuffer, parts: &[A]) -> Result<(), EncodeError> {
	let len = encoded_len(parts)?;
	buf.reserve(len);
	write_command(buf, parts)
}

/// Exact number of bytes [`encode`] produces for `parts`.
pub fn encoded_len<A: ToArg>(parts: &[A]) -> Result<usize, EncodeError> {
	let mut total = array_header_len(parts.len());
	for (i, part) in parts.iter().enumerate() {
		total += bulk_len(arg_at(part, i)?.payload_len());
	}
	Ok(total)
}

fn write_command<A: ToArg>(buf: &mut ByteBuffer, parts: &[A]) -> Result<(), EncodeError> {
	buf.append_header(ARRAY, parts.len() as i64);
	for (i, part) in parts.iter().enumerate() {
		arg_at(part, i)?.write_bulk(buf);
	}
	Ok(())
}

#[inline]
fn array_header_len(count: usize) -> usize {
	1 + decimal_len(count as i64) + CRLF.len()
}

#[inline]
fn bulk_len(payload_len: usize) -> usize {
	1 + decimal_len(payload_len as i64) + CRLF.len() + payload_len + CRLF.len()
}

/// An immutable command: an ordered list of byte-string parts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
	parts: Vec<Bytes>,
}

impl Command {
	/// Build a command from parts of a single type.
	pub fn new<A: ToArg>(parts: &[A]) -> Result<Self, EncodeError> {
		let parts = parts
			.iter()
			.enumerate()
			.map(|(i, part)| arg_at(part, i).map(|arg| arg_to_bytes(&arg)))
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Self { parts })
	}

	/// Start a command with the given name.
	///
	/// ```
	/// use akane_resp::Command;
	/// use akane_resp::RespEncoder;
	///
	/// let cmd = Command::builder("EXPIRE").arg("key").arg(10i64).build().unwrap();
	/// assert_eq!(cmd.len(), 3);
	/// assert_eq!(cmd.encoded_len(), cmd.encode().unwrap().len());
	/// ```
	pub fn builder(name: impl ToArg) -> CommandBuilder {
		CommandBuilder::default().arg(name)
	}

	pub fn parts(&self) -> &[Bytes] {
		&self.parts
	}

	pub fn len(&self) -> usize {
		self.parts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.parts.is_empty()
	}

	/// Exact number of bytes this command occupies on the wire.
	pub fn encoded_len(&self) -> usize {
		self.parts
			.iter()
			.fold(array_header_len(self.parts.len()), |acc, part| {
				acc + bulk_len(part.len())
			})
	}
}

impl From<Command> for Vec<Bytes> {
	fn from(cmd: Command) -> Self {
		cmd.parts
	}
}

fn arg_to_bytes(arg: &Arg<'_>) -> Bytes {
	match arg {
		Arg::Bytes(b) => Bytes::copy_from_slice(b),
		Arg::Integer(i) => {
			let mut digits = itoa::Buffer::new();
			Bytes::copy_from_slice(digits.format(*i).as_bytes())
		}
	}
}

/// Collects parts for a [`Command`]; the first conversion error is reported by
/// [`build`](CommandBuilder::build).
#[derive(Debug, Default)]
pub struct CommandBuilder {
	parts: Vec<Bytes>,
	error: Option<EncodeError>,
}

impl CommandBuilder {
	pub fn arg(mut self, part: impl ToArg) -> Self {
		if self.error.is_none() {
			match arg_at(&part, self.parts.len()) {
				Ok(arg) => self.parts.push(arg_to_bytes(&arg)),
				Err(e) => self.error = Some(e),
			}
		}
		self
	}

	pub fn build(self) -> Result<Command, EncodeError> {
		match self.error {
			Some(e) => Err(e),
			None => Ok(Command { parts: self.parts }),
		}
	}
}

/// Encode several commands back to back for pipelining.
pub fn encode_pipeline(commands: &[Command]) -> Bytes {
	let total = commands.iter().map(Command::encoded_len).sum();
	let mut buf = ByteBuffer::with_capacity(total);
	for cmd in commands {
		cmd.write_to(&mut buf);
	}
	buf.finalize()
}

impl Command {
	fn write_to(&self, buf: &mut ByteBuffer) {
		buf.append_header(ARRAY, self.parts.len() as i64);
		for part in &self.parts {
			Arg::Bytes(&part[..]).write_bulk(buf);
		}
	}
}

/// Trait for writing values in RESP wire form.
pub trait RespEncoder {
	fn encode_to(&self, buf: &mut ByteBuffer) -> Result<(), EncodeError>;

	fn encode(&self) -> Result<Bytes, EncodeError> {
		let mut buf = ByteBuffer::new();
		self.encode_to(&mut buf)?;
		Ok(buf.finalize())
	}
}

impl RespEncoder for Command {
	fn encode_to(&self, buf: &mut ByteBuffer) -> Result<(), EncodeError> {
		self.write_to(buf);
		Ok(())
	}

	fn encode(&self) -> Result<Bytes, EncodeError> {
		let mut buf = ByteBuffer::with_capacity(self.encoded_len());
		self.write_to(&mut buf);
		Ok(buf.finalize())
	}
}

/// Replies are encoded the way a server writes them, which is what tests and
/// mock servers need.
impl RespEncoder for Reply {
	fn encode_to(&self, buf: &mut ByteBuffer) -> Result<(), EncodeError> {
		// Explicit stack so deeply nested arrays don't recurse.
		let mut pending: Vec<&Reply> = vec![self];
		while let Some(reply) = pending.pop() {
			match reply {
				Reply::SimpleString(s) => encode_line(buf, SIMPLE_STRING, s),
				Reply::Error(e) => encode_line(buf, ERROR, e),
				Reply::Integer(i) => buf.append_header(INTEGER, *i),
				Reply::BulkString(None) => buf.append_header(BULK_STRING, -1),
				Reply::BulkString(Some(s)) => Arg::Bytes(&s[..]).write_bulk(buf),
				Reply::Array(None) => buf.append_header(ARRAY, -1),
				Reply::Array(Some(items)) => {
					buf.append_header(ARRAY, items.len() as i64);
					pending.extend(items.iter().rev());
				}
			}
		}
		Ok(())
	}
}

#[inline]
fn encode_line(buf: &mut ByteBuffer, marker: u8, line: &[u8]) {
	debug_assert!(
		find_crlf(line).is_none(),
		"status and error lines must not contain CRLF"
	);
	buf.append_byte(marker);
	buf.append(line);
	buf.append_crlf();
}
