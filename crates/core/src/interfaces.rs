//! What the session host needs from the surrounding editor.
//!
//! These are deliberately narrow. The host never touches document text
//! directly beyond [`Document`], and never draws anything itself.

use std::path::{Path, PathBuf};

use fsi_protocol::{Cursor, DocumentId, LineRange, WatchId};

use crate::watch::WatchMeta;

/// Read access to the document an evaluation starts from.
pub trait Document {
	fn id(&self) -> DocumentId;

	/// On-disk location, `None` for an unsaved buffer.
	fn path(&self) -> Option<&Path>;

	/// Display name sent with requests.
	fn name(&self) -> Option<String> {
		self.path()
			.and_then(Path::file_name)
			.map(|name| name.to_string_lossy().into_owned())
	}

	fn cursor_position(&self) -> Cursor;

	fn has_selection(&self) -> bool;

	fn selection_text(&self) -> String;

	/// Lines covered by the selection, `None` without one.
	fn selection_range(&self) -> Option<LineRange>;

	/// Text of lines `start..=end` (whole document when both are `None`) with
	/// every active watch inside the span replaced by `wrap(meta, source)`.
	fn watched_range(
		&self,
		start: Option<u32>,
		end: Option<u32>,
		wrap: &dyn Fn(&WatchMeta, &str) -> String,
	) -> String;
}

/// Where an inline result is drawn: `line` is the primary anchor, `start_line`
/// the first line of the evaluated block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Anchor {
	pub line: u32,
	pub start_line: u32,
}

impl Anchor {
	pub fn new(start_line: u32, line: u32) -> Self {
		Self { line, start_line }
	}
}

/// Something rendered inline at an [`Anchor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineResult {
	Text(String),
	Exception(String),
	/// Decoded PNG bytes.
	Image(Vec<u8>),
}

/// Rendering and file operations on open documents.
pub trait Editor: Send {
	/// Draws `result` at `anchor`, replacing whatever is already there.
	fn show_result(&mut self, doc: DocumentId, anchor: Anchor, result: InlineResult);

	/// Replaces the displayed value of a registered watch.
	fn update_watch(&mut self, doc: DocumentId, watch: &WatchId, result: &str);

	/// Saves the document, returning its path if it now lives on disk.
	fn save(&mut self, doc: DocumentId) -> Option<PathBuf>;
}

/// What a popup button does when chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupAction {
	OpenUrl(String),
	/// Save the document and try connecting once more.
	SaveAndRetry(DocumentId),
	Dismiss,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
	pub label: String,
	pub action: PopupAction,
}

impl Button {
	pub fn new(label: impl Into<String>, action: PopupAction) -> Self {
		Self {
			label: label.into(),
			action,
		}
	}
}

/// Modal notification. `detail` is shown preformatted under `body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
	pub header: String,
	pub body: String,
	pub detail: Option<String>,
	pub buttons: Vec<Button>,
}

/// Status and popup surface.
pub trait Notifier: Send {
	fn begin_working(&mut self, label: &str);

	fn end_working(&mut self);

	/// Shows a popup. The choice comes back as
	/// [`HostCommand::Popup`](crate::HostCommand::Popup).
	fn popup(&mut self, popup: Popup);

	fn open_url(&mut self, url: &str) {
		tracing::info!(target = "fsi", url, "open in browser");
	}
}

/// One console line tied to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedLog {
	pub file: String,
	pub line: String,
	pub content: String,
}

/// Shared console sink.
pub trait Console: Send {
	fn log_at_location(&mut self, entry: LocatedLog);
}

/// Prompts for a directory.
pub trait DirectoryPicker {
	fn pick_directory(&mut self) -> Option<PathBuf>;
}
