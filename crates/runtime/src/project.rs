//! Project root detection.
//!
//! Walks up from a file to the directory the interpreter should run in.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Marker file whose directory is skipped during the walk.
pub const PROJECT_MARKER: &str = "__init__.py";

/// Finds the project root for `path` using the default marker.
pub fn find_project_root(path: &Path) -> Option<PathBuf> {
	ProjectLocator::default().locate(path)
}

/// Ancestor walk with a configurable marker file.
#[derive(Debug, Clone)]
pub struct ProjectLocator {
	marker: String,
}

impl Default for ProjectLocator {
	fn default() -> Self {
		Self::new(PROJECT_MARKER)
	}
}

impl ProjectLocator {
	pub fn new(marker: impl Into<String>) -> Self {
		Self { marker: marker.into() }
	}

	/// Nearest directory at or above `path` that does not hold the marker.
	///
	/// Returns `None` for an empty path, once a filesystem root is reached,
	/// or if a step makes no progress.
	pub fn locate(&self, path: &Path) -> Option<PathBuf> {
		let mut current = path.to_path_buf();
		let mut previous: Option<PathBuf> = None;

		loop {
			if current.as_os_str().is_empty()
				|| current.parent().is_none()
				|| previous.as_ref() == Some(&current)
			{
				debug!(target = "fsi", start = %path.display(), "no project root");
				return None;
			}

			if current.is_dir() && !current.join(&self.marker).exists() {
				return Some(current);
			}

			let parent = current.parent().map(Path::to_path_buf)?;
			previous = Some(std::mem::replace(&mut current, parent));
		}
	}
}
