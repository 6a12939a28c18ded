use akane_resp::Command;
use akane_resp::ReplyParser;
use akane_resp::RespEncoder;

fn main() {
	println!("--- RESP Client Codec Example ---");

	let commands = vec![
		Command::new(&["SET", "greeting", "hello"]).unwrap(),
		Command::new(&["GET", "greeting"]).unwrap(),
		Command::builder("INCRBY").arg("counter").arg(1000i64).build().unwrap(),
		Command::new(&["LRANGE", "list", "0", "-1"]).unwrap(),
	];
	for cmd in &commands {
		let wire = cmd.encode().unwrap();
		println!("[Encode] {:?}", String::from_utf8_lossy(&wire));
	}

	// Simulate the server's replies arriving in arbitrary fragments:
	// +OK, $5 hello, :1000 and a nested array.
	let data_chunks = vec![
		b"+O".as_slice(),
		b"K\r\n$5\r\nhe".as_slice(),
		b"llo\r\n:1".as_slice(),
		b"000\r\n*2\r\n$1\r\na".as_slice(),
		b"\r\n*1\r\n:7\r".as_slice(),
		b"\n".as_slice(),
	];

	let mut parser = ReplyParser::new();
	for (i, chunk) in data_chunks.iter().enumerate() {
		println!(
			"\n[Stream] Received Chunk {}: {:?}",
			i,
			String::from_utf8_lossy(chunk)
		);

		match parser.feed(chunk) {
			Ok(replies) if replies.is_empty() => {
				println!(
					"[Parser] Incomplete, {} bytes buffered, waiting for more data...",
					parser.buffered_len()
				);
			}
			Ok(replies) => {
				for reply in replies {
					println!("[Parser] Complete: {:?}", reply);
				}
			}
			Err(e) => {
				eprintln!("[Parser] Error: {}", e);
				break;
			}
		}
	}
}
