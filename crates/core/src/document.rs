//! In-memory document with watches.

use std::path::{Path, PathBuf};

use fsi_protocol::{Cursor, DocumentId, LineRange, WatchId};
use tracing::debug;

use crate::interfaces::Document;
use crate::watch::WatchMeta;

/// A watched block of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watch {
	pub id: WatchId,
	pub range: LineRange,
}

/// Plain text buffer implementing [`Document`].
#[derive(Debug, Clone)]
pub struct TextDocument {
	id: DocumentId,
	path: Option<PathBuf>,
	lines: Vec<String>,
	cursor: Cursor,
	selection: Option<LineRange>,
	watches: Vec<Watch>,
	next_watch: u32,
}

impl TextDocument {
	pub fn new(id: DocumentId, text: &str) -> Self {
		Self {
			id,
			path: None,
			lines: text.lines().map(str::to_owned).collect(),
			cursor: Cursor::default(),
			selection: None,
			watches: Vec::new(),
			next_watch: 0,
		}
	}

	/// Reads `path` from disk.
	pub fn open(id: DocumentId, path: impl Into<PathBuf>) -> std::io::Result<Self> {
		let path = path.into();
		let text = std::fs::read_to_string(&path)?;
		Ok(Self::new(id, &text).with_path(path))
	}

	pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.path = Some(path.into());
		self
	}

	pub fn line_count(&self) -> u32 {
		self.lines.len() as u32
	}

	pub fn set_cursor(&mut self, cursor: Cursor) {
		self.cursor = cursor;
		self.selection = None;
	}

	/// Selects whole lines; the caret moves to the end of the range.
	pub fn select(&mut self, range: LineRange) {
		self.cursor = Cursor::new(range.end, 0);
		self.selection = Some(range);
	}

	/// Adds a watch over `range`. Overlapping an existing watch is refused.
	pub fn add_watch(&mut self, range: LineRange) -> Option<WatchId> {
		let overlaps = self
			.watches
			.iter()
			.any(|w| w.range.start <= range.end && range.start <= w.range.end);
		if overlaps || range.start > range.end {
			debug!(target = "fsi", start = range.start, end = range.end, "watch rejected");
			return None;
		}

		self.next_watch += 1;
		let id = WatchId::new(format!("{}-w{}", self.id.0, self.next_watch));
		self.watches.push(Watch { id: id.clone(), range });
		self.watches.sort_by_key(|w| w.range.start);
		Some(id)
	}

	pub fn watches(&self) -> &[Watch] {
		&self.watches
	}

	fn line_span(&self, range: LineRange) -> String {
		let end = (range.end as usize + 1).min(self.lines.len());
		let start = (range.start as usize).min(end);
		self.lines[start..end].join("\n")
	}
}

impl Document for TextDocument {
	fn id(&self) -> DocumentId {
		self.id
	}

	fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	fn cursor_position(&self) -> Cursor {
		self.cursor
	}

	fn has_selection(&self) -> bool {
		self.selection.is_some()
	}

	fn selection_text(&self) -> String {
		self.selection.map(|range| self.line_span(range)).unwrap_or_default()
	}

	fn selection_range(&self) -> Option<LineRange> {
		self.selection
	}

	fn watched_range(
		&self,
		start: Option<u32>,
		end: Option<u32>,
		wrap: &dyn Fn(&WatchMeta, &str) -> String,
	) -> String {
		let last = self.line_count().saturating_sub(1);
		let span = LineRange::new(start.unwrap_or(0), end.unwrap_or(last).min(last));
		if self.lines.is_empty() || span.start > span.end {
			return String::new();
		}

		let mut out = Vec::new();
		let mut line = span.start;
		let mut watches = self
			.watches
			.iter()
			.filter(|w| w.range.start >= span.start && w.range.end <= span.end)
			.peekable();

		while line <= span.end {
			match watches.peek() {
				Some(watch) if watch.range.start == line => {
					let meta = WatchMeta::new(watch.id.clone(), self.id, watch.range);
					out.push(wrap(&meta, &self.line_span(watch.range)));
					line = watch.range.end + 1;
					watches.next();
				}
				_ => {
					out.push(self.lines[line as usize].clone());
					line += 1;
				}
			}
		}
		out.join("\n")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::watch::wrap;

	const SOURCE: &str = "let a = 1\nlet b = 2\na + b\nprintfn \"%d\" a";

	fn doc() -> TextDocument {
		TextDocument::new(DocumentId(1), SOURCE)
	}

	fn tag(meta: &WatchMeta, src: &str) -> String {
		format!("<{}:{}-{}>{src}", meta.id, meta.start, meta.end)
	}

	#[test]
	fn unwatched_range_is_plain_text() {
		assert_eq!(doc().watched_range(None, None, &wrap), SOURCE);
	}

	#[test]
	fn watches_are_wrapped_in_place() {
		let mut doc = doc();
		let id = doc.add_watch(LineRange::new(2, 2)).unwrap();
		let text = doc.watched_range(None, None, &tag);
		assert_eq!(
			text,
			format!("let a = 1\nlet b = 2\n<{id}:2-2>a + b\nprintfn \"%d\" a")
		);
	}

	#[test]
	fn multi_line_watch_keeps_line_count() {
		let mut doc = doc();
		doc.add_watch(LineRange::new(0, 1)).unwrap();
		let text = doc.watched_range(None, None, &wrap);
		assert_eq!(text.lines().count(), 4);
		assert!(text.starts_with("LtTools.watch (let a = 1\nlet b = 2)"));
	}

	#[test]
	fn watches_outside_span_are_left_alone() {
		let mut doc = doc();
		doc.add_watch(LineRange::new(0, 0)).unwrap();
		let text = doc.watched_range(Some(1), Some(2), &tag);
		assert_eq!(text, "let b = 2\na + b");
	}

	#[test]
	fn overlapping_watches_are_rejected() {
		let mut doc = doc();
		assert!(doc.add_watch(LineRange::new(1, 2)).is_some());
		assert!(doc.add_watch(LineRange::new(2, 3)).is_none());
		assert!(doc.add_watch(LineRange::new(3, 3)).is_some());
		assert_eq!(doc.watches().len(), 2);
	}

	#[test]
	fn selection_text_covers_whole_lines() {
		let mut doc = doc();
		doc.select(LineRange::new(1, 2));
		assert!(doc.has_selection());
		assert_eq!(doc.selection_text(), "let b = 2\na + b");
		assert_eq!(doc.cursor_position(), Cursor::new(2, 0));
	}

	#[test]
	fn name_comes_from_path() {
		let doc = doc().with_path("/work/proj/script.fsx");
		assert_eq!(doc.name().as_deref(), Some("script.fsx"));
		assert_eq!(TextDocument::new(DocumentId(2), "").name(), None);
	}
}
