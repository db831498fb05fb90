//! Popups shown when a session cannot start.

use std::path::Path;

use fsi_protocol::DocumentId;

use crate::interfaces::{Button, Popup, PopupAction};

pub const FSHARP_DOWNLOAD_URL: &str = "http://www.fsharp.org";

/// Neither an override nor PATH yielded an interpreter.
pub fn interpreter_missing(command: &str) -> Popup {
	Popup {
		header: format!("We couldn't find {command}."),
		body: format!(
			"In order to evaluate in F# files, a F# interactive ({command}) has to be installed and on your system PATH."
		),
		detail: None,
		buttons: vec![
			Button::new("Download FSharp", PopupAction::OpenUrl(FSHARP_DOWNLOAD_URL.to_string())),
			Button::new("ok", PopupAction::Dismiss),
		],
	}
}

/// The bridge script is not where it should be.
pub fn bridge_missing(path: &Path) -> Popup {
	Popup {
		header: "We couldn't find the F# bridge script.".to_string(),
		body: format!(
			"The bridge script was expected at {}. Reinstall fsi-eval or set bridge-script to its location.",
			path.display()
		),
		detail: None,
		buttons: vec![Button::new("ok", PopupAction::Dismiss)],
	}
}

/// The document has no project root, usually because it was never saved.
pub fn unsaved_document(origin: Option<DocumentId>) -> Popup {
	let mut buttons = Vec::with_capacity(2);
	if let Some(doc) = origin {
		buttons.push(Button::new("Save this file", PopupAction::SaveAndRetry(doc)));
	}
	buttons.push(Button::new("Cancel", PopupAction::Dismiss));

	Popup {
		header: "We couldn't find this file.".to_string(),
		body: "In order to evaluate in F# files, the file has to be on disk somewhere.".to_string(),
		detail: None,
		buttons,
	}
}

/// The interpreter exited before the bridge connected.
pub fn connect_failed(report: &str) -> Popup {
	Popup {
		header: "We couldn't connect.".to_string(),
		body: "Looks like there was an issue trying to connect to the project. Here's what we got:"
			.to_string(),
		detail: Some(report.to_string()),
		buttons: vec![Button::new("close", PopupAction::Dismiss)],
	}
}
