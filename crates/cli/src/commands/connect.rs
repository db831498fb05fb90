//! `fsi-eval connect`: start an interpreter for a project without evaluating
//! anything.

use std::path::PathBuf;
use std::time::Duration;

use colored::Colorize;
use fsi::protocol::SessionId;
use fsi::{FSHARP_CONNECTOR, HostCommand, SessionHost, SettingsStore};
use serde::Serialize;
use tokio::time::Instant;
use tracing::info;

use super::{secs, start_host};
use crate::cli::ConnectArgs;
use crate::error::{CliError, Result};
use crate::output::{self, CommandResult, OutputFormat};
use crate::terminal::{ArgPicker, Terminal};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectReport {
	pub session: SessionId,
	pub root: PathBuf,
	pub interpreter: PathBuf,
	pub control_port: u16,
}

pub async fn run(args: ConnectArgs, store: &SettingsStore, format: OutputFormat) -> Result<()> {
	let terminal = Terminal::new(false);
	let mut host = start_host(store, &terminal).await?;

	let mut picker = ArgPicker(args.dir);
	let Some(command) = FSHARP_CONNECTOR.connect(&mut picker) else {
		eprintln!("{}", FSHARP_CONNECTOR.description);
		return Err(CliError::Aborted("no directory selected".into()));
	};
	if let HostCommand::Connect(dir) = &command {
		info!(target = "fsi", connector = FSHARP_CONNECTOR.name, dir = %dir.display(), "connecting");
	}
	host.handle_command(command);

	let limit = Duration::from_secs(args.timeout);
	let session = wait_connected(&mut host, &terminal, limit).await?;
	let report = describe(&host, session).ok_or_else(|| CliError::Aborted("session ended".into()))?;

	match format {
		OutputFormat::Text => {
			println!(
				"{} {} (session {}, control port {})",
				"Connected".green().bold(),
				report.root.display(),
				report.session,
				report.control_port
			);
		}
		_ => output::print_json(&CommandResult::success("connect", &report), format),
	}

	if args.hold {
		eprintln!("Press Ctrl-C to disconnect.");
		hold(&mut host, session).await;
	}
	host.handle_command(HostCommand::Disconnect(report.root));
	Ok(())
}

/// Steps the host until a session has connected.
async fn wait_connected(host: &mut SessionHost, terminal: &Terminal, limit: Duration) -> Result<SessionId> {
	let deadline = Instant::now() + limit;

	loop {
		if let Some(header) = terminal.first_popup() {
			return Err(CliError::Aborted(header));
		}
		if let Some(session) = host.registry().iter().find(|s| s.is_connected()) {
			return Ok(session.id);
		}
		if host.registry().is_empty() {
			return Err(CliError::Aborted("session ended".into()));
		}
		if tokio::time::timeout_at(deadline, host.step()).await.is_err() {
			return Err(CliError::Timeout {
				secs: secs(limit),
				condition: "interpreter to connect",
			});
		}
	}
}

/// Serves the session until Ctrl-C or until its process goes away.
async fn hold(host: &mut SessionHost, session: SessionId) {
	let ctrl_c = tokio::signal::ctrl_c();
	tokio::pin!(ctrl_c);

	loop {
		tokio::select! {
			_ = &mut ctrl_c => break,
			alive = host.step() => {
				if !alive || !host.registry().contains(session) {
					eprintln!("Interpreter exited.");
					break;
				}
			}
		}
	}
}

fn describe(host: &SessionHost, id: SessionId) -> Option<ConnectReport> {
	let session = host.registry().get(id)?;
	Some(ConnectReport {
		session: id,
		root: session.root.clone(),
		interpreter: session.interpreter.executable.clone(),
		control_port: host.control_port(),
	})
}
