//! Newline-delimited JSON framing for the control channel.
//!
//! One record per line, UTF-8, `\n` terminated. Blank lines are skipped so a
//! bridge that writes `\r\n` or stray newlines does not desynchronise.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Writes one record and flushes.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<()>
where
	W: AsyncWrite + Unpin,
	T: Serialize,
{
	let mut line = serde_json::to_vec(value)?;
	line.push(b'\n');
	writer.write_all(&line).await?;
	writer.flush().await?;
	Ok(())
}

/// Reads the next record. `Ok(None)` means EOF.
///
/// A line that is not a valid `T` yields [`Error::ProtocolError`]; the reader
/// is left positioned on the following line so callers may keep going.
pub async fn read_frame<R, T>(reader: &mut R, line: &mut String) -> Result<Option<T>>
where
	R: AsyncBufRead + Unpin,
	T: DeserializeOwned,
{
	loop {
		line.clear();
		if reader.read_line(line).await? == 0 {
			return Ok(None);
		}
		let trimmed = line.trim();
		if trimmed.is_empty() {
			continue;
		}
		return serde_json::from_str(trimmed)
			.map(Some)
			.map_err(|e| Error::ProtocolError(format!("{e}: {}", truncate(trimmed, 200))));
	}
}

fn truncate(s: &str, max: usize) -> &str {
	match s.char_indices().nth(max) {
		Some((idx, _)) => &s[..idx],
		None => s,
	}
}

#[cfg(test)]
mod tests;
