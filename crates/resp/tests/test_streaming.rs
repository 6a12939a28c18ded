use akane_resp::ParseError;
use akane_resp::Reply;
use akane_resp::ReplyParser;
use akane_resp::RespEncoder;
use akane_resp::RespError;

/// Feed `chunks` in order and collect everything decoded.
fn feed_chunks<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Result<Vec<Reply>, RespError> {
	let mut parser = ReplyParser::new();
	let mut replies = Vec::new();
	for chunk in chunks {
		replies.extend(parser.feed(chunk)?);
	}
	assert!(parser.is_idle(), "parser left with partial input");
	Ok(replies)
}

fn fixtures() -> Vec<&'static [u8]> {
	vec![
		&b"+OK\r\n"[..],
		&b"-ERR wrong number of arguments\r\n"[..],
		&b":-9223372036854775808\r\n"[..],
		&b"$5\r\nhello\r\n"[..],
		&b"$0\r\n\r\n"[..],
		&b"$-1\r\n"[..],
		&b"*-1\r\n"[..],
		&b"*0\r\n"[..],
		&b"*2\r\n$1\r\na\r\n*1\r\n:7\r\n"[..],
		&b"*3\r\n*2\r\n+x\r\n$-1\r\n*0\r\n*1\r\n*1\r\n$2\r\n\r\n\r\n"[..],
		&b"+OK\r\n:5\r\n$3\r\nfoo\r\n*1\r\n-E\r\n"[..],
	]
}

#[test]
fn test_pipelined_feed() {
	let replies = feed_chunks([&b"+OK\r\n:5\r\n"[..]]).unwrap();
	assert_eq!(replies, vec![Reply::simple_string("OK"), Reply::integer(5)]);
}

#[test]
fn test_partial_bulk_suspension() {
	let mut parser = ReplyParser::new();
	assert!(parser.feed(b"$5\r\nhel").unwrap().is_empty());
	assert_eq!(
		parser.feed(b"lo\r\n").unwrap(),
		vec![Reply::bulk_string("hello")]
	);
}

#[test]
fn test_byte_at_a_time() {
	for fixture in fixtures() {
		let whole = feed_chunks([fixture]).unwrap();
		let bytewise = feed_chunks(fixture.chunks(1)).unwrap();
		assert_eq!(bytewise, whole, "fixture {:?}", String::from_utf8_lossy(fixture));
	}
}

#[test]
fn test_every_three_way_split() {
	for fixture in fixtures() {
		let whole = feed_chunks([fixture]).unwrap();
		for i in 1..fixture.len() {
			for j in i..fixture.len() {
				let parts = [&fixture[..i], &fixture[i..j], &fixture[j..]];
				let split = feed_chunks(parts.into_iter().filter(|p| !p.is_empty())).unwrap();
				assert_eq!(
					split,
					whole,
					"fixture {:?} split at {} and {}",
					String::from_utf8_lossy(fixture),
					i,
					j
				);
			}
		}
	}
}

#[test]
fn test_all_fixtures_concatenated() {
	let mut stream = Vec::new();
	let mut expected = Vec::new();
	for fixture in fixtures() {
		stream.extend_from_slice(fixture);
		expected.extend(feed_chunks([fixture]).unwrap());
	}
	for size in [1, 2, 3, 7, 64, stream.len()] {
		assert_eq!(feed_chunks(stream.chunks(size)).unwrap(), expected);
	}
}

#[test]
fn test_deeply_nested_reply_in_chunks() {
	let mut reply = Reply::bulk_string("leaf");
	for _ in 0..32 {
		reply = Reply::array(vec![reply, Reply::integer(1)]);
	}
	let encoded = reply.encode().unwrap();
	assert_eq!(feed_chunks(encoded.chunks(5)).unwrap(), vec![reply]);
}

#[test]
fn test_error_reported_in_later_chunk() {
	let mut parser = ReplyParser::new();
	assert_eq!(
		parser.feed(b"*2\r\n:1\r\n").unwrap(),
		Vec::<Reply>::new()
	);
	let err = parser.feed(b"%1\r\n").unwrap_err();
	assert_eq!(err, RespError::from(ParseError::InvalidTypeMarker(b'%')));
	assert!(parser.feed(b":2\r\n").is_err());
}

#[test]
fn test_feed_drops_replies_before_error() {
	let mut parser = ReplyParser::new();
	let err = parser.feed(b"+OK\r\n?\r\n").unwrap_err();
	assert_eq!(err, RespError::from(ParseError::InvalidTypeMarker(b'?')));
	assert!(parser.is_failed());
	assert_eq!(parser.next_reply().unwrap_err(), err);
}

#[test]
fn test_pull_api_keeps_replies_before_error() {
	let mut parser = ReplyParser::new();
	parser.push_bytes(b"+OK\r\n?\r\n").unwrap();
	assert_eq!(parser.next_reply().unwrap(), Some(Reply::simple_string("OK")));
	assert!(parser.next_reply().unwrap_err().is_protocol());
}
