use fsi_protocol::{DocumentId, EvalResponse, Hello, Inbound, ResponseMeta, SessionId};
use tokio::io::{AsyncWriteExt, BufReader, duplex};

use super::*;

#[tokio::test]
async fn frames_are_newline_terminated() {
	let (mut client, server) = duplex(1024);
	write_frame(&mut client, &Hello { session: SessionId(12) }).await.unwrap();
	drop(client);

	let mut reader = BufReader::new(server);
	let mut line = String::new();
	let hello: Hello = read_frame(&mut reader, &mut line).await.unwrap().unwrap();
	assert_eq!(hello.session, SessionId(12));
	assert_eq!(line, "{\"session\":12}\n");
}

#[tokio::test]
async fn blank_lines_are_skipped() {
	let (mut client, server) = duplex(1024);
	client
		.write_all(b"\r\n\n{\"origin\":1,\"tag\":\"success\",\"meta\":{\"start\":3,\"end\":5}}\r\n")
		.await
		.unwrap();
	drop(client);

	let mut reader = BufReader::new(server);
	let mut line = String::new();
	let inbound: Inbound = read_frame(&mut reader, &mut line).await.unwrap().unwrap();
	assert_eq!(inbound.origin, DocumentId(1));
	assert_eq!(inbound.response, EvalResponse::Success { meta: ResponseMeta::new(3, 5) });
	assert!(read_frame::<_, Inbound>(&mut reader, &mut line).await.unwrap().is_none());
}

#[tokio::test]
async fn malformed_line_does_not_poison_stream() {
	let (mut client, server) = duplex(1024);
	client.write_all(b"not json\n{\"session\":4}\n").await.unwrap();
	drop(client);

	let mut reader = BufReader::new(server);
	let mut line = String::new();
	let err = read_frame::<_, Hello>(&mut reader, &mut line).await.unwrap_err();
	assert!(matches!(err, Error::ProtocolError(_)));

	let hello: Hello = read_frame(&mut reader, &mut line).await.unwrap().unwrap();
	assert_eq!(hello.session, SessionId(4));
}

#[test]
fn truncate_respects_char_boundaries() {
	assert_eq!(truncate("ééé", 2), "éé");
	assert_eq!(truncate("ab", 5), "ab");
}
