//! Runs the fsi-eval binary against throwaway settings files.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn fsi_eval(settings: &Path, args: &[&str]) -> Command {
	let mut command = Command::new(env!("CARGO_BIN_EXE_fsi-eval"));
	command
		.args(["-f", "ndjson", "--settings"])
		.arg(settings)
		.args(args)
		.env_remove("RUST_LOG")
		.env_remove("FSI_BRIDGE_SCRIPT")
		.env("NO_COLOR", "1");
	command
}

fn envelope(output: &Output) -> serde_json::Value {
	let stdout = String::from_utf8_lossy(&output.stdout);
	serde_json::from_str(stdout.trim()).unwrap_or_else(|_| panic!("not an envelope: {stdout}"))
}

#[test]
fn config_setter_persists_and_show_reports_it() {
	let dir = TempDir::new().unwrap();
	let settings = dir.path().join("settings.json");

	let set = fsi_eval(&settings, &["config", "fsharp-exe", "/opt/fsharp/fsharpi"])
		.output()
		.unwrap();
	assert!(set.status.success());
	let json = envelope(&set);
	assert_eq!(json["ok"], true);
	assert_eq!(json["data"]["setting"], "fsharp-exe");
	assert_eq!(json["data"]["value"], "/opt/fsharp/fsharpi");

	let show = fsi_eval(&settings, &["config", "show"]).output().unwrap();
	let json = envelope(&show);
	assert_eq!(json["data"]["settings"]["interpreter"], "/opt/fsharp/fsharpi");
	assert_eq!(json["data"]["resolvedInterpreter"], "/opt/fsharp/fsharpi");
	assert_eq!(PathBuf::from(json["data"]["path"].as_str().unwrap()), settings);
}

#[test]
fn unreadable_script_fails_with_code() {
	let dir = TempDir::new().unwrap();
	let output = fsi_eval(&dir.path().join("settings.json"), &["eval", "/nonexistent/script.fsx"])
		.output()
		.unwrap();

	assert_eq!(output.status.code(), Some(1));
	let json = envelope(&output);
	assert_eq!(json["ok"], false);
	assert_eq!(json["command"], "eval");
	assert_eq!(json["error"]["code"], "DOCUMENT_UNREADABLE");
}

#[cfg(unix)]
#[test]
fn missing_interpreter_shows_popup_and_aborts() {
	let dir = TempDir::new().unwrap();
	let script = dir.path().join("script.fsx");
	std::fs::write(&script, "1 + 1\n").unwrap();
	let empty = dir.path().join("empty-path");
	std::fs::create_dir(&empty).unwrap();

	let output = fsi_eval(&dir.path().join("settings.json"), &["eval", script.to_str().unwrap()])
		.env("PATH", &empty)
		.output()
		.unwrap();

	assert_eq!(output.status.code(), Some(1));
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("We couldn't find fsharpi."), "stderr: {stderr}");
	assert!(stderr.contains("[Download FSharp] [ok]"), "stderr: {stderr}");

	let json = envelope(&output);
	assert_eq!(json["error"]["code"], "ABORTED");
	assert_eq!(json["error"]["message"], "We couldn't find fsharpi.");
}
