//! Bridge script location and argument escaping.
//!
//! The bridge is the `.fsx` program the interpreter runs with `--exec`. It
//! dials back to the host's control port and relays evaluation results.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Environment override for the bridge script location.
pub const BRIDGE_ENV: &str = "FSI_BRIDGE_SCRIPT";

/// Location of the bridge relative to an install or data directory.
pub const BRIDGE_RELATIVE_PATH: &str = "fs-src/ltfsclient/ltfsclient.fsx";

/// A bridge script candidate and whether it exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeScript {
	pub path: PathBuf,
	pub present: bool,
}

/// Finds the bridge script.
///
/// Precedence: configured path, `FSI_BRIDGE_SCRIPT`, next to the running
/// executable, then the user data directory. The first existing candidate
/// wins; if none exist the highest-precedence candidate is returned with
/// `present: false` so callers can name it.
pub fn locate_bridge_script(configured: Option<&Path>) -> BridgeScript {
	let candidates = bridge_candidates(configured);
	for path in &candidates {
		if path.is_file() {
			debug!(target = "fsi", path = %path.display(), "using bridge script");
			return BridgeScript {
				path: path.clone(),
				present: true,
			};
		}
	}

	let path = candidates
		.into_iter()
		.next()
		.unwrap_or_else(|| PathBuf::from(BRIDGE_RELATIVE_PATH));
	BridgeScript { path, present: false }
}

fn bridge_candidates(configured: Option<&Path>) -> Vec<PathBuf> {
	let mut candidates = Vec::new();
	if let Some(path) = configured {
		candidates.push(path.to_path_buf());
	}
	if let Some(path) = std::env::var_os(BRIDGE_ENV) {
		candidates.push(PathBuf::from(path));
	}
	if let Some(dir) = std::env::current_exe()
		.ok()
		.and_then(|exe| exe.parent().map(Path::to_path_buf))
	{
		candidates.push(dir.join(BRIDGE_RELATIVE_PATH));
	}
	if let Some(dir) = dirs::data_dir() {
		candidates.push(dir.join("fsi-eval").join(BRIDGE_RELATIVE_PATH));
	}
	candidates
}

/// Quotes `path` when the path separator is a backslash.
///
/// Paths on `/`-separated platforms pass through untouched.
pub fn escape_path(path: &str, separator: char) -> Cow<'_, str> {
	if separator == '\\' {
		Cow::Owned(format!("\"{path}\""))
	} else {
		Cow::Borrowed(path)
	}
}

/// [`escape_path`] using this platform's separator.
pub fn escape_for_platform(path: &Path) -> String {
	escape_path(&path.to_string_lossy(), std::path::MAIN_SEPARATOR).into_owned()
}
