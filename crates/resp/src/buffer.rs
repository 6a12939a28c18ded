//! Append-only byte builder used for everything the crate writes.

use bytes::BufMut;
use bytes::Bytes;
use bytes::BytesMut;

use crate::utils::CRLF;

/// Capacity of a buffer created with [`ByteBuffer::new`].
pub const INITIAL_CAPACITY: usize = 64;

/// A growable, append-only byte sequence.
///
/// Capacity at least doubles whenever an append does not fit, so a build of
/// `n` bytes costs amortized O(1) per append. The buffer never shrinks while
/// building and is consumed by [`finalize`](ByteBuffer::finalize).
#[derive(Debug, Default)]
pub struct ByteBuffer {
	inner: BytesMut,
}

impl ByteBuffer {
	pub fn new() -> Self {
		Self::with_capacity(INITIAL_CAPACITY)
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			inner: BytesMut::with_capacity(capacity),
		}
	}

	/// Number of bytes written so far.
	#[inline]
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	#[inline]
	pub fn capacity(&self) -> usize {
		self.inner.capacity()
	}

	#[inline]
	pub fn as_slice(&self) -> &[u8] {
		&self.inner
	}

	/// Copy `bytes` to the end of the buffer.
	#[inline]
	pub fn append(&mut self, bytes: &[u8]) {
		self.grow_for(bytes.len());
		self.inner.put_slice(bytes);
	}

	#[inline]
	pub fn append_byte(&mut self, b: u8) {
		self.grow_for(1);
		self.inner.put_u8(b);
	}

	/// Write the decimal rendering of `n` without allocating.
	#[inline]
	pub fn append_decimal(&mut self, n: i64) {
		let mut digits = itoa::Buffer::new();
		let rendered = digits.format(n);
		debug_assert_eq!(rendered.len(), decimal_len(n));
		self.append(rendered.as_bytes());
	}

	#[inline]
	pub(crate) fn append_crlf(&mut self) {
		self.append(CRLF);
	}

	/// Write `<marker><n>\r\n`, the header shared by every RESP line type.
	#[inline]
	pub(crate) fn append_header(&mut self, marker: u8, n: i64) {
		self.append_byte(marker);
		self.append_decimal(n);
		self.append_crlf();
	}

	/// Make room for at least `additional` more bytes.
	#[inline]
	pub fn reserve(&mut self, additional: usize) {
		self.grow_for(additional);
	}

	/// Hand the accumulated bytes to the caller.
	pub fn finalize(self) -> Bytes {
		self.inner.freeze()
	}

	fn grow_for(&mut self, additional: usize) {
		let len = self.inner.len();
		let needed = len + additional;
		let capacity = self.inner.capacity();
		if needed <= capacity {
			return;
		}
		let target = needed.max(capacity.saturating_mul(2)).max(INITIAL_CAPACITY);
		self.inner.reserve(target - len);
	}
}

/// Number of bytes `append_decimal(n)` writes.
pub(crate) fn decimal_len(n: i64) -> usize {
	let sign = usize::from(n < 0);
	let mut magnitude = n.unsigned_abs();
	let mut digits = 1;
	while magnitude >= 10 {
		magnitude /= 10;
		digits += 1;
	}
	sign + digits
}
