//! `fsi-eval config`: inspect and change the persisted settings.

use std::path::{Path, PathBuf};

use anyhow::Context;
use fsi::runtime::{InterpreterProbe, locate_bridge_script};
use fsi::{SETTING_COMMANDS, SettingKey, Settings, SettingsStore};
use serde::Serialize;

use crate::cli::ConfigAction;
use crate::error::Result;
use crate::output::{self, CommandResult, OutputFormat};

const BRIDGE_SCRIPT_SETTING: &str = "bridge-script";

/// Settings plus what they currently resolve to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigReport {
	pub path: PathBuf,
	pub settings: Settings,
	pub resolved_interpreter: Option<PathBuf>,
	pub bridge_script: PathBuf,
	pub bridge_present: bool,
}

/// Result of a setter.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigChange {
	pub setting: &'static str,
	pub value: Option<PathBuf>,
	pub previous: Option<PathBuf>,
}

pub fn run(action: ConfigAction, store: &SettingsStore, format: OutputFormat) -> Result<()> {
	let (key, value) = match action {
		ConfigAction::Show => {
			show(store, format);
			return Ok(());
		}
		ConfigAction::FsharpExe { path } => (SettingKey::Interpreter, path),
		ConfigAction::IfsharpExe { path } => (SettingKey::NotebookInterpreter, path),
		ConfigAction::BridgeScript { path } => (SettingKey::BridgeScript, path),
	};

	let change = apply(store, key, value)?;
	match format {
		OutputFormat::Text => match &change.value {
			Some(path) => println!("{} = {}", change.setting, path.display()),
			None => println!("{} cleared", change.setting),
		},
		_ => output::print_json(&CommandResult::success("config", &change), format),
	}
	Ok(())
}

/// Replaces one setting and saves the file.
pub fn apply(store: &SettingsStore, key: SettingKey, value: Option<PathBuf>) -> Result<ConfigChange> {
	let mut settings = store.load();
	let previous = settings.set(key, value);
	store
		.save(&settings)
		.with_context(|| format!("failed to write {}", store.path().display()))?;

	Ok(ConfigChange {
		setting: setting_name(key),
		value: settings.get(key).map(Path::to_path_buf),
		previous,
	})
}

pub fn setting_name(key: SettingKey) -> &'static str {
	SETTING_COMMANDS
		.iter()
		.find(|command| command.key == key)
		.map_or(BRIDGE_SCRIPT_SETTING, |command| command.name)
}

fn show(store: &SettingsStore, format: OutputFormat) {
	let settings = store.load();
	let bridge = locate_bridge_script(settings.bridge_script.as_deref());
	let resolved = InterpreterProbe::new(settings.interpreter.clone())
		.resolve()
		.map(|found| found.executable);

	let report = ConfigReport {
		path: store.path().to_path_buf(),
		settings,
		resolved_interpreter: resolved,
		bridge_script: bridge.path,
		bridge_present: bridge.present,
	};

	match format {
		OutputFormat::Text => print!("{}", render(&report)),
		_ => output::print_json(&CommandResult::success("config", &report), format),
	}
}

fn render(report: &ConfigReport) -> String {
	let unset = |path: Option<&Path>| path.map_or_else(|| "(unset)".to_string(), |p| p.display().to_string());
	let mut out = format!("settings: {}\n", report.path.display());

	for command in &SETTING_COMMANDS {
		out.push_str(&format!(
			"{:<14}{}\n",
			command.name,
			unset(report.settings.get(command.key))
		));
	}
	out.push_str(&format!(
		"{:<14}{}\n",
		BRIDGE_SCRIPT_SETTING,
		unset(report.settings.get(SettingKey::BridgeScript))
	));

	out.push_str(&format!(
		"\ninterpreter:  {}\n",
		unset(report.resolved_interpreter.as_deref())
	));
	let marker = if report.bridge_present { "" } else { " (missing)" };
	out.push_str(&format!("bridge:       {}{marker}\n", report.bridge_script.display()));
	out
}
