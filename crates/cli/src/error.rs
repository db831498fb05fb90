use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("cannot read {path}")]
	Document {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("lines {start}:{end} are outside the document or overlap another watch")]
	InvalidWatch { start: u32, end: u32 },

	#[error("block {start}:{end} ends before it starts")]
	InvertedBlock { start: u32, end: u32 },

	#[error("line {line} is outside the document ({count} lines)")]
	LineOutOfRange { line: u32, count: u32 },

	/// A popup was shown instead of evaluating. Already reported on stderr.
	#[error("{0}")]
	Aborted(String),

	#[error("timeout after {secs}s waiting for: {condition}")]
	Timeout { secs: u64, condition: &'static str },

	#[error(transparent)]
	Session(#[from] fsi::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	/// Stable code for structured output.
	pub fn code(&self) -> &'static str {
		match self {
			CliError::Document { .. } => "DOCUMENT_UNREADABLE",
			CliError::InvalidWatch { .. }
			| CliError::InvertedBlock { .. }
			| CliError::LineOutOfRange { .. } => "INVALID_RANGE",
			CliError::Aborted(_) => "ABORTED",
			CliError::Timeout { .. } => "TIMEOUT",
			CliError::Session(err) if err.is_channel_closed() => "CHANNEL_CLOSED",
			CliError::Session(err) if err.is_precondition() => "PRECONDITION_FAILED",
			CliError::Session(_) => "SESSION_ERROR",
			CliError::Io(_) | CliError::Json(_) | CliError::Anyhow(_) => "INTERNAL_ERROR",
		}
	}

	/// True when the user has already seen why.
	pub fn is_reported(&self) -> bool {
		matches!(self, CliError::Aborted(_))
	}
}

#[cfg(test)]
mod tests {
	use fsi::protocol::SessionId;

	use super::*;

	#[test]
	fn session_errors_are_classified() {
		let closed = CliError::from(fsi::Error::ChannelClosed(SessionId(3)));
		assert_eq!(closed.code(), "CHANNEL_CLOSED");

		let refused = CliError::from(fsi::Error::LaunchRefused("no project root"));
		assert_eq!(refused.code(), "PRECONDITION_FAILED");
	}

	#[test]
	fn only_aborts_count_as_reported() {
		assert!(CliError::Aborted("We couldn't connect.".into()).is_reported());
		assert!(
			!CliError::Timeout {
				secs: 5,
				condition: "interpreter"
			}
			.is_reported()
		);
	}
}
