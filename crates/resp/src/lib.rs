//! # akane-resp - Redis Serialization Protocol client codec
//!
//! Encodes commands into the wire form a Redis-compatible server expects and
//! incrementally decodes the replies it sends back.
//!
//! ## Features
//!
//! - **Streaming decode**: replies may arrive split at any byte, several per chunk
//! - **Nested arrays**: decoded with an explicit frame stack, bounded by a depth limit
//! - **Zero-copy payloads**: decoded strings are `Bytes` slices of the input buffer
//! - **Allocation-free integers**: lengths and counts are rendered without heap allocation
//!
//! ## Example
//!
//! ```rust
//! use akane_resp::Reply;
//! use akane_resp::ReplyParser;
//!
//! // Encode a command
//! let wire = akane_resp::encode(&["SET", "key", "value"]).unwrap();
//! assert_eq!(&wire[..], b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n");
//!
//! // Decode replies as they arrive
//! let mut parser = ReplyParser::new();
//! assert!(parser.feed(b"+O").unwrap().is_empty());
//! assert_eq!(parser.feed(b"K\r\n:5\r\n").unwrap(), vec![
//! 	Reply::simple_string("OK"),
//! 	Reply::integer(5),
//! ]);
//! ```

mod buffer;
mod config;
mod encode;
mod error;
mod parser;
mod types;
mod utils;

pub use buffer::ByteBuffer;
pub use config::DEFAULT_MAX_ARRAY_LEN;
pub use config::DEFAULT_MAX_BUFFER_LEN;
pub use config::DEFAULT_MAX_BULK_LEN;
pub use config::DEFAULT_MAX_DEPTH;
pub use config::DEFAULT_MAX_LINE_LEN;
pub use config::ParserConfig;
pub use encode::Arg;
pub use encode::Command;
pub use encode::CommandBuilder;
pub use encode::RespEncoder;
pub use encode::ToArg;
pub use encode::encode;
pub use encode::encode_pipeline;
pub use encode::encode_to;
pub use encode::encoded_len;
pub use error::EncodeError;
pub use error::LimitError;
pub use error::ParseError;
pub use error::RespError;
pub use error::ServerError;
pub use parser::ReplyParser;
pub use types::Reply;
