//! F# interactive discovery
//!
//! Resolves which interpreter frontend to invoke and where its executable
//! lives. An explicit override always wins; otherwise the frontend name is
//! looked up on PATH. Absence is an ordinary outcome, not an error.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Frontend name on Windows-family platforms.
pub const WINDOWS_COMMAND: &str = "fsi";

/// Frontend name everywhere else (Mono/.NET wrapper).
pub const UNIX_COMMAND: &str = "fsharpi";

/// Platform-specific invocation name for the interpreter frontend.
pub fn command_name() -> &'static str {
	if cfg!(windows) { WINDOWS_COMMAND } else { UNIX_COMMAND }
}

/// Resolves the interpreter executable.
///
/// Returns `override_path` verbatim when set and non-empty, otherwise the
/// PATH lookup result for [`command_name`].
pub fn resolve_executable(override_path: Option<&Path>) -> Option<PathBuf> {
	resolve_with(override_path, |command| lookup_on_path(command, None))
}

fn lookup_on_path(command: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
	let found = match search_path {
		Some(paths) => {
			let cwd = std::env::current_dir().unwrap_or_default();
			which::which_in(command, Some(paths), cwd)
		}
		None => which::which(command),
	};
	match found {
		Ok(path) => Some(path),
		Err(err) => {
			debug!(target = "fsi", command, error = %err, "interpreter not on PATH");
			None
		}
	}
}

fn resolve_with<F>(override_path: Option<&Path>, lookup: F) -> Option<PathBuf>
where
	F: FnOnce(&str) -> Option<PathBuf>,
{
	match override_path {
		Some(path) if !path.as_os_str().is_empty() => Some(path.to_path_buf()),
		_ => lookup(command_name()),
	}
}

/// Resolved interpreter: what to invoke and which executable backs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterDescriptor {
	pub command: &'static str,
	pub executable: PathBuf,
}

/// Caches the interpreter resolution for the lifetime of a host.
///
/// A successful lookup is kept until the override changes; a failed one is
/// retried on the next call.
#[derive(Debug, Clone, Default)]
pub struct InterpreterProbe {
	override_path: Option<PathBuf>,
	search_path: Option<OsString>,
	resolved: Option<PathBuf>,
}

impl InterpreterProbe {
	pub fn new(override_path: Option<PathBuf>) -> Self {
		Self {
			override_path,
			search_path: None,
			resolved: None,
		}
	}

	/// Searches `paths` (PATH syntax) instead of the process PATH.
	pub fn with_search_path(mut self, paths: impl Into<OsString>) -> Self {
		self.search_path = Some(paths.into());
		self.resolved = None;
		self
	}

	/// Replaces the configured override and drops any cached resolution.
	pub fn set_override(&mut self, path: Option<PathBuf>) {
		self.override_path = path;
		self.resolved = None;
	}

	pub fn override_path(&self) -> Option<&Path> {
		self.override_path.as_deref()
	}

	pub fn command(&self) -> &'static str {
		command_name()
	}

	pub fn resolve(&mut self) -> Option<InterpreterDescriptor> {
		let search_path = self.search_path.clone();
		self.resolve_using(|command| lookup_on_path(command, search_path.as_deref()))
	}

	fn resolve_using<F>(&mut self, lookup: F) -> Option<InterpreterDescriptor>
	where
		F: FnOnce(&str) -> Option<PathBuf>,
	{
		if self.resolved.is_none() {
			self.resolved = resolve_with(self.override_path.as_deref(), lookup);
		}
		self.resolved.clone().map(|executable| InterpreterDescriptor {
			command: command_name(),
			executable,
		})
	}
}
