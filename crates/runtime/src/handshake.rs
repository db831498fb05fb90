//! Connection handshake driven by interpreter output.
//!
//! The bridge prints [`CONNECTED_MARKER`] once it has dialled the control
//! port. Until then everything the process writes is kept so a failed start
//! can be shown to the user verbatim.

/// Substring of stdout that signals the bridge is attached.
pub const CONNECTED_MARKER: &str = "Connected";

/// Lifecycle of a session's interpreter start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
	Spawning,
	Connecting,
	Connected,
	Failed,
}

/// What a process exit means for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
	/// The process had connected; not a handshake failure.
	AfterConnect,
	/// The process died before connecting. `report` is everything it wrote.
	Failed { report: String },
}

/// Accumulates process output until the marker shows up.
#[derive(Debug, Clone)]
pub struct Handshake {
	state: HandshakeState,
	/// Stdout and stderr interleaved, for the failure report.
	buffer: String,
	/// End of stdout alone, long enough to hold a marker cut by a chunk
	/// boundary.
	stdout_tail: String,
}

impl Default for Handshake {
	fn default() -> Self {
		Self::new()
	}
}

impl Handshake {
	pub fn new() -> Self {
		Self {
			state: HandshakeState::Spawning,
			buffer: String::new(),
			stdout_tail: String::new(),
		}
	}

	pub fn state(&self) -> HandshakeState {
		self.state
	}

	pub fn is_connected(&self) -> bool {
		self.state == HandshakeState::Connected
	}

	pub fn buffer(&self) -> &str {
		&self.buffer
	}

	/// The process has been spawned and its output is being watched.
	pub fn spawned(&mut self) {
		if self.state == HandshakeState::Spawning {
			self.state = HandshakeState::Connecting;
		}
	}

	/// Feeds a stdout chunk. Returns `true` only for the chunk that completes
	/// the handshake.
	pub fn on_stdout(&mut self, chunk: &str) -> bool {
		if self.state == HandshakeState::Failed {
			return false;
		}

		self.buffer.push_str(chunk);
		if self.is_connected() {
			return false;
		}

		let mut window = std::mem::take(&mut self.stdout_tail);
		window.push_str(chunk);
		if window.contains(CONNECTED_MARKER) {
			self.state = HandshakeState::Connected;
			return true;
		}

		let mut keep_from = window.len().saturating_sub(CONNECTED_MARKER.len() - 1);
		while !window.is_char_boundary(keep_from) {
			keep_from -= 1;
		}
		window.drain(..keep_from);
		self.stdout_tail = window;
		false
	}

	/// Feeds a stderr chunk. Ignored once connected.
	pub fn on_stderr(&mut self, chunk: &str) {
		if matches!(self.state, HandshakeState::Connected | HandshakeState::Failed) {
			return;
		}
		self.buffer.push_str(chunk);
	}

	/// Records process exit.
	pub fn on_exit(&mut self) -> ExitOutcome {
		if self.is_connected() {
			return ExitOutcome::AfterConnect;
		}
		self.state = HandshakeState::Failed;
		ExitOutcome::Failed {
			report: self.buffer.clone(),
		}
	}
}
