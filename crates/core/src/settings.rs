//! User settings: interpreter overrides and the bridge script location.
//!
//! Stored as pretty JSON at `$XDG_CONFIG_HOME/fsi-eval/settings.json`
//! (`~/.config/fsi-eval/settings.json` without XDG).

use std::fs;
use std::path::{Path, PathBuf};

use fsi_runtime::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Schema version for the settings file.
pub const SCHEMA_VERSION: u32 = 1;

/// Durable settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
	#[serde(default)]
	pub schema: u32,
	/// Replaces the PATH lookup for `fsi`/`fsharpi`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub interpreter: Option<PathBuf>,
	/// Executable for notebook-style (ifsharp) clients.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub notebook_interpreter: Option<PathBuf>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bridge_script: Option<PathBuf>,
}

/// Which path a setting command writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
	Interpreter,
	NotebookInterpreter,
	BridgeScript,
}

/// A user-invocable setting taking one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingCommand {
	pub name: &'static str,
	pub description: &'static str,
	pub key: SettingKey,
}

/// Setting commands offered to users. Each is exclusive: setting it again
/// replaces the previous value.
pub const SETTING_COMMANDS: [SettingCommand; 2] = [
	SettingCommand {
		name: "fsharp-exe",
		description: "F#: Set the path to the F# executable for clients",
		key: SettingKey::Interpreter,
	},
	SettingCommand {
		name: "ifsharp-exe",
		description: "F#: Set the path to ifsharp for clients",
		key: SettingKey::NotebookInterpreter,
	},
];

impl Settings {
	/// Creates settings with current [`SCHEMA_VERSION`].
	pub fn new() -> Self {
		Self {
			schema: SCHEMA_VERSION,
			..Default::default()
		}
	}

	pub fn get(&self, key: SettingKey) -> Option<&Path> {
		match key {
			SettingKey::Interpreter => self.interpreter.as_deref(),
			SettingKey::NotebookInterpreter => self.notebook_interpreter.as_deref(),
			SettingKey::BridgeScript => self.bridge_script.as_deref(),
		}
	}

	/// Replaces a value, returning the previous one.
	pub fn set(&mut self, key: SettingKey, value: Option<PathBuf>) -> Option<PathBuf> {
		let slot = match key {
			SettingKey::Interpreter => &mut self.interpreter,
			SettingKey::NotebookInterpreter => &mut self.notebook_interpreter,
			SettingKey::BridgeScript => &mut self.bridge_script,
		};
		std::mem::replace(slot, value.filter(|p| !p.as_os_str().is_empty()))
	}
}

/// Settings file location and I/O.
#[derive(Debug, Clone)]
pub struct SettingsStore {
	path: PathBuf,
}

impl SettingsStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// The per-user settings file.
	pub fn user() -> Self {
		let config_home = std::env::var_os("XDG_CONFIG_HOME")
			.map(PathBuf::from)
			.or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
			.or_else(dirs::config_dir)
			.unwrap_or_else(|| PathBuf::from("."));
		Self::new(config_home.join("fsi-eval").join("settings.json"))
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Loads settings; a missing or unreadable file yields defaults.
	pub fn load(&self) -> Settings {
		let Ok(content) = fs::read_to_string(&self.path) else {
			return Settings::new();
		};
		match serde_json::from_str::<Settings>(&content) {
			Ok(mut settings) => {
				if settings.schema == 0 {
					settings.schema = SCHEMA_VERSION;
				}
				settings
			}
			Err(err) => {
				warn!(target = "fsi", path = %self.path.display(), error = %err, "ignoring invalid settings");
				Settings::new()
			}
		}
	}

	pub fn save(&self, settings: &Settings) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::write(&self.path, serde_json::to_string_pretty(settings)?)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn missing_file_yields_defaults() {
		let tmp = TempDir::new().unwrap();
		let store = SettingsStore::new(tmp.path().join("settings.json"));
		assert_eq!(store.load(), Settings::new());
	}

	#[test]
	fn save_and_load() {
		let tmp = TempDir::new().unwrap();
		let store = SettingsStore::new(tmp.path().join("nested/settings.json"));
		let mut settings = Settings::new();
		settings.set(SettingKey::Interpreter, Some(PathBuf::from("/opt/fsi")));

		store.save(&settings).unwrap();
		assert_eq!(store.load(), settings);

		let raw = fs::read_to_string(store.path()).unwrap();
		assert!(raw.contains("\"interpreter\""));
		assert!(!raw.contains("notebookInterpreter"));
	}

	#[test]
	fn invalid_file_yields_defaults() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("settings.json");
		fs::write(&path, "{ nope").unwrap();
		assert_eq!(SettingsStore::new(path).load(), Settings::new());
	}

	#[test]
	fn set_replaces_previous_value() {
		let mut settings = Settings::new();
		assert_eq!(settings.set(SettingKey::NotebookInterpreter, Some("/a".into())), None);
		assert_eq!(
			settings.set(SettingKey::NotebookInterpreter, Some("/b".into())),
			Some(PathBuf::from("/a"))
		);
		assert_eq!(settings.get(SettingKey::NotebookInterpreter), Some(Path::new("/b")));
	}

	#[test]
	fn empty_path_clears_setting() {
		let mut settings = Settings::new();
		settings.set(SettingKey::Interpreter, Some("/a".into()));
		settings.set(SettingKey::Interpreter, Some(PathBuf::new()));
		assert_eq!(settings.get(SettingKey::Interpreter), None);
	}

	#[test]
	fn commands_are_named_for_users() {
		let names: Vec<_> = SETTING_COMMANDS.iter().map(|c| c.name).collect();
		assert_eq!(names, ["fsharp-exe", "ifsharp-exe"]);
	}
}
