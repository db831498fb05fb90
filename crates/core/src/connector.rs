//! Connection sidebar entry.

use crate::host::HostCommand;
use crate::interfaces::DirectoryPicker;

/// Static description of a way to start a session by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connector {
	pub name: &'static str,
	pub description: &'static str,
}

/// The F# connector.
pub const FSHARP_CONNECTOR: Connector = Connector {
	name: "F#",
	description: "Select a directory to serve as the root of your F# project.",
};

impl Connector {
	/// Asks for a project directory. `None` if the user cancelled.
	pub fn connect(&self, picker: &mut dyn DirectoryPicker) -> Option<HostCommand> {
		picker.pick_directory().map(HostCommand::Connect)
	}
}
