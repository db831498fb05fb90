//! Watch wrapping.
//!
//! The bridge has no side channel for correlating results with requests, so
//! the metadata travels inside the evaluated code: each watched block is
//! rewritten into a call to the bridge's watch entry point carrying the block
//! and a JSON description of where it came from. The bridge echoes that JSON
//! back as the response `meta`.

use fsi_protocol::{DocumentId, LineRange, WatchId};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Entry point defined by the bridge script.
pub const WATCH_ENTRY: &str = "LtTools.watch";

/// Identity and location of one watched block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchMeta {
	pub id: WatchId,
	pub origin: DocumentId,
	pub start: u32,
	pub end: u32,
}

impl WatchMeta {
	pub fn new(id: WatchId, origin: DocumentId, range: LineRange) -> Self {
		Self {
			id,
			origin,
			start: range.start,
			end: range.end,
		}
	}

	pub fn range(&self) -> LineRange {
		LineRange::new(self.start, self.end)
	}

	/// Compact JSON form handed to the bridge.
	pub fn to_json(&self) -> String {
		json!({
			"id": self.id.as_str(),
			"origin": self.origin.0,
			"start": self.start,
			"end": self.end,
		})
		.to_string()
	}
}

/// Rewrites `source` so the bridge reports its value tagged with `meta`.
///
/// Produces `LtTools.watch (<source>) "<meta json>"`. The metadata is passed
/// as a JSON-escaped string literal, which F# reads with the same escapes.
/// Newlines inside `source` are kept so line numbers do not shift.
pub fn wrap(meta: &WatchMeta, source: &str) -> String {
	let literal = serde_json::Value::String(meta.to_json()).to_string();
	format!("{WATCH_ENTRY} ({source}) {literal}")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn meta() -> WatchMeta {
		WatchMeta::new(WatchId::new("w1"), DocumentId(3), LineRange::new(4, 6))
	}

	#[test]
	fn wraps_source_in_watch_call() {
		let wrapped = wrap(&meta(), "x + 1");
		assert!(wrapped.starts_with("LtTools.watch (x + 1) \"{"));
		assert!(wrapped.contains(r#"\"id\":\"w1\""#));
		assert!(wrapped.contains(r#"\"start\":4"#));
	}

	#[test]
	fn embedded_meta_round_trips() {
		let wrapped = wrap(&meta(), "let y =\n  2\ny");
		let literal = &wrapped[wrapped.rfind(") ").unwrap() + 2..];
		let json: String = serde_json::from_str(literal).unwrap();
		let decoded: WatchMeta = serde_json::from_str(&json).unwrap();
		assert_eq!(decoded, meta());
	}

	#[test]
	fn line_count_is_preserved() {
		let source = "let y =\n  2\ny";
		assert_eq!(wrap(&meta(), source).lines().count(), source.lines().count());
	}

	#[test]
	fn quotes_in_ids_stay_escaped() {
		let meta = WatchMeta::new(WatchId::new("a\"b"), DocumentId(1), LineRange::new(0, 0));
		let wrapped = wrap(&meta, "1");
		assert!(!wrapped.contains("\"\"\""));
		assert!(wrapped.ends_with('"'));
	}
}
