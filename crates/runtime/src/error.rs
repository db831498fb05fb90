//! Error types for the interpreter runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while supervising an interpreter session.
#[derive(Debug, Error)]
pub enum Error {
	/// No interpreter executable was configured or found on PATH.
	#[error("F# interactive ({command}) not found. Install it or set fsharp-exe.")]
	InterpreterNotFound { command: &'static str },

	/// The bridge script is missing from disk.
	#[error("Bridge script not found at {0}")]
	BridgeNotFound(String),

	/// Launch preconditions were not met, so nothing was spawned.
	#[error("Refusing to launch interpreter: {0}")]
	LaunchRefused(&'static str),

	/// The interpreter process could not be started.
	#[error("Failed to launch interpreter: {0}")]
	LaunchFailed(String),

	/// Malformed record on the control channel.
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// The session's control channel has been torn down.
	#[error("Control channel closed for session {0}")]
	ChannelClosed(fsi_protocol::SessionId),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Image payload was not valid base64.
	#[error("Invalid image payload: {0}")]
	Decode(#[from] fsi_protocol::ImageDecodeError),
}

impl Error {
	/// Returns `true` when a send was attempted on a removed session.
	pub fn is_channel_closed(&self) -> bool {
		matches!(self, Error::ChannelClosed(_))
	}

	/// Returns `true` for failures that happen before any process exists.
	pub fn is_precondition(&self) -> bool {
		matches!(
			self,
			Error::InterpreterNotFound { .. } | Error::BridgeNotFound(_) | Error::LaunchRefused(_)
		)
	}
}
