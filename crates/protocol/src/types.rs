//! Identifiers and positional metadata shared by requests and responses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one interpreter session.
///
/// Passed to the bridge script on its command line and echoed back in the
/// [`Hello`](crate::Hello) greeting so the host can pair the TCP connection
/// with the process it spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Identifies the editor document an evaluation originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "doc-{}", self.0)
	}
}

/// Identifies a watch placed on a document range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchId(pub String);

impl WatchId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for WatchId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Caret position, zero-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
	pub line: u32,
	#[serde(default)]
	pub ch: u32,
}

impl Cursor {
	pub fn new(line: u32, ch: u32) -> Self {
		Self { line, ch }
	}
}

/// Inclusive line span of a selection or watched block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
	pub start: u32,
	pub end: u32,
}

impl LineRange {
	pub fn new(start: u32, end: u32) -> Self {
		Self { start, end }
	}

	pub fn contains(&self, line: u32) -> bool {
		line >= self.start && line <= self.end
	}
}

/// Metadata echoed back by the bridge on every anchored response.
///
/// The bridge copies whatever metadata the wrapped code handed it, so `id`
/// is only present for responses produced by a registered watch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
	pub start: u32,
	pub end: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<WatchId>,
}

impl ResponseMeta {
	pub fn new(start: u32, end: u32) -> Self {
		Self { start, end, id: None }
	}

	pub fn range(&self) -> LineRange {
		LineRange::new(self.start, self.end)
	}
}

impl From<LineRange> for ResponseMeta {
	fn from(range: LineRange) -> Self {
		Self::new(range.start, range.end)
	}
}
