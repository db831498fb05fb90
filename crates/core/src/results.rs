//! Inline result bookkeeping for editors.
//!
//! Responses carry no request id, so two evaluations of the same block race
//! on the same anchor. The board keeps whichever response arrived last.

use std::collections::BTreeMap;

use fsi_protocol::{DocumentId, WatchId};

use crate::interfaces::{Anchor, InlineResult};

/// Latest inline result per document line, plus watch values.
#[derive(Debug, Clone, Default)]
pub struct ResultBoard {
	inline: BTreeMap<(DocumentId, u32), (Anchor, InlineResult)>,
	watches: BTreeMap<(DocumentId, String), String>,
}

impl ResultBoard {
	pub fn new() -> Self {
		Self::default()
	}

	/// Places `result`, returning the one it replaced at the same line.
	pub fn place(&mut self, doc: DocumentId, anchor: Anchor, result: InlineResult) -> Option<InlineResult> {
		self.inline
			.insert((doc, anchor.line), (anchor, result))
			.map(|(_, previous)| previous)
	}

	pub fn set_watch(&mut self, doc: DocumentId, watch: &WatchId, value: &str) -> Option<String> {
		self.watches
			.insert((doc, watch.as_str().to_owned()), value.to_owned())
	}

	pub fn get(&self, doc: DocumentId, line: u32) -> Option<&(Anchor, InlineResult)> {
		self.inline.get(&(doc, line))
	}

	pub fn watch(&self, doc: DocumentId, watch: &WatchId) -> Option<&str> {
		self.watches
			.get(&(doc, watch.as_str().to_owned()))
			.map(String::as_str)
	}

	/// Results for `doc` in line order.
	pub fn for_document(&self, doc: DocumentId) -> impl Iterator<Item = &(Anchor, InlineResult)> {
		self.inline
			.range((doc, 0)..=(doc, u32::MAX))
			.map(|(_, entry)| entry)
	}

	/// Watch values for `doc`, ordered by watch id.
	pub fn watches_for(&self, doc: DocumentId) -> impl Iterator<Item = (&str, &str)> {
		self.watches
			.iter()
			.filter(move |((d, _), _)| *d == doc)
			.map(|((_, id), value)| (id.as_str(), value.as_str()))
	}

	pub fn clear(&mut self, doc: DocumentId) {
		self.inline.retain(|(d, _), _| *d != doc);
		self.watches.retain(|(d, _), _| *d != doc);
	}

	pub fn is_empty(&self) -> bool {
		self.inline.is_empty() && self.watches.is_empty()
	}
}
