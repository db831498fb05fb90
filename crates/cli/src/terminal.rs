//! Terminal implementations of the editor-side interfaces.
//!
//! Results are collected on a [`ResultBoard`] and printed when the command
//! finishes; popups and working labels go to stderr as they happen.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use fsi::protocol::{DocumentId, WatchId};
use fsi::{
	Anchor, Console, DirectoryPicker, Editor, HostParts, InlineResult, LocatedLog, Notifier, Popup,
	ResultBoard,
};
use parking_lot::Mutex;
use tracing::debug;

/// What the host has reported so far.
#[derive(Debug, Default)]
pub struct TerminalState {
	pub board: ResultBoard,
	pub popups: Vec<Popup>,
	pub printed: Vec<LocatedLog>,
	/// Inline results and watch updates received.
	pub responses: usize,
	pub working: bool,
}

/// Cloneable front-end handed to the host as editor, notifier and console.
#[derive(Debug, Clone)]
pub struct Terminal {
	state: Arc<Mutex<TerminalState>>,
	echo_prints: bool,
	color: bool,
}

impl Terminal {
	/// `echo_prints` streams script output to stdout as it arrives.
	pub fn new(echo_prints: bool) -> Self {
		Self {
			state: Arc::default(),
			echo_prints,
			color: colored::control::SHOULD_COLORIZE.should_colorize(),
		}
	}

	pub fn parts(&self) -> HostParts {
		HostParts {
			editor: Box::new(self.clone()),
			notifier: Box::new(self.clone()),
			console: Box::new(self.clone()),
		}
	}

	pub fn with_state<R>(&self, f: impl FnOnce(&TerminalState) -> R) -> R {
		f(&self.state.lock())
	}

	pub fn responses(&self) -> usize {
		self.state.lock().responses
	}

	/// Header of the first popup shown, if any.
	pub fn first_popup(&self) -> Option<String> {
		self.state.lock().popups.first().map(|p| p.header.clone())
	}
}

impl Editor for Terminal {
	fn show_result(&mut self, doc: DocumentId, anchor: Anchor, result: InlineResult) {
		let mut state = self.state.lock();
		state.responses += 1;
		if state.board.place(doc, anchor, result).is_some() {
			debug!(target = "fsi", %doc, line = anchor.line, "result replaced");
		}
	}

	fn update_watch(&mut self, doc: DocumentId, watch: &WatchId, result: &str) {
		let mut state = self.state.lock();
		state.responses += 1;
		state.board.set_watch(doc, watch, result);
	}

	fn save(&mut self, doc: DocumentId) -> Option<PathBuf> {
		// Documents come from files, so there is nothing to save.
		debug!(target = "fsi", %doc, "save requested");
		None
	}
}

impl Notifier for Terminal {
	fn begin_working(&mut self, label: &str) {
		self.state.lock().working = true;
		if !label.is_empty() {
			let line = if self.color { label.dimmed().to_string() } else { label.to_string() };
			eprintln!("{line}");
		}
	}

	fn end_working(&mut self) {
		self.state.lock().working = false;
	}

	fn popup(&mut self, popup: Popup) {
		let mut stderr = io::stderr().lock();
		let _ = write_popup(&mut stderr, &popup, self.color);
		self.state.lock().popups.push(popup);
	}

	fn open_url(&mut self, url: &str) {
		eprintln!("see {url}");
	}
}

impl Console for Terminal {
	fn log_at_location(&mut self, entry: LocatedLog) {
		if self.echo_prints {
			println!("{}", entry.content);
		}
		self.state.lock().printed.push(entry);
	}
}

/// Renders a popup the way a dialog would lay it out.
pub fn write_popup(out: &mut impl Write, popup: &Popup, color: bool) -> io::Result<()> {
	if color {
		writeln!(out, "{}", popup.header.yellow().bold())?;
	} else {
		writeln!(out, "{}", popup.header)?;
	}
	writeln!(out, "{}", popup.body)?;
	if let Some(detail) = &popup.detail {
		for line in detail.lines() {
			writeln!(out, "    {line}")?;
		}
	}
	let buttons: Vec<String> = popup.buttons.iter().map(|b| format!("[{}]", b.label)).collect();
	if !buttons.is_empty() {
		writeln!(out, "{}", buttons.join(" "))?;
	}
	Ok(())
}

/// Picks the directory given on the command line, else the current one.
#[derive(Debug, Clone)]
pub struct ArgPicker(pub Option<PathBuf>);

impl DirectoryPicker for ArgPicker {
	fn pick_directory(&mut self) -> Option<PathBuf> {
		let dir = match self.0.take() {
			Some(dir) => dir,
			None => std::env::current_dir().ok()?,
		};
		Some(std::fs::canonicalize(&dir).unwrap_or(dir))
	}
}

#[cfg(test)]
mod tests {
	use fsi::notices;

	use super::*;

	#[test]
	fn popup_lists_detail_and_buttons() {
		let mut out = Vec::new();
		write_popup(&mut out, &notices::connect_failed("line one\nline two"), false).unwrap();

		let text = String::from_utf8(out).unwrap();
		assert!(text.starts_with("We couldn't connect.\n"));
		assert!(text.contains("    line one\n    line two\n"));
		assert!(text.ends_with("[close]\n"));
	}

	#[test]
	fn editor_calls_land_on_board() {
		let terminal = Terminal::new(false);
		let mut editor = terminal.clone();
		editor.show_result(DocumentId(1), Anchor::new(0, 2), InlineResult::Text("3".into()));
		editor.update_watch(DocumentId(1), &WatchId::new("1-w1"), "4");

		assert_eq!(terminal.responses(), 2);
		terminal.with_state(|state| {
			assert!(state.board.get(DocumentId(1), 2).is_some());
			assert_eq!(state.board.watch(DocumentId(1), &WatchId::new("1-w1")), Some("4"));
		});
	}

	#[test]
	fn popups_are_recorded_in_order() {
		let terminal = Terminal::new(false);
		let mut notifier = terminal.clone();
		notifier.popup(notices::interpreter_missing("fsharpi"));
		notifier.popup(notices::unsaved_document(None));

		assert_eq!(terminal.first_popup().as_deref(), Some("We couldn't find fsharpi."));
		terminal.with_state(|state| assert_eq!(state.popups.len(), 2));
	}

	#[test]
	fn picker_prefers_argument() {
		let dir = tempfile::TempDir::new().unwrap();
		let mut picker = ArgPicker(Some(dir.path().to_path_buf()));
		let picked = picker.pick_directory().unwrap();
		assert_eq!(picked, std::fs::canonicalize(dir.path()).unwrap());
	}
}
