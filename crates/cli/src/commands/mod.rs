//! Subcommand implementations.

pub mod config;
pub mod connect;
pub mod eval;

use std::time::Duration;

use fsi::{SessionHost, SettingsStore};

use crate::cli::{Cli, Commands};
use crate::error::Result;
use crate::terminal::Terminal;

/// Name used in result envelopes.
pub fn command_name(command: &Commands) -> &'static str {
	match command {
		Commands::Eval(_) => "eval",
		Commands::Connect(_) => "connect",
		Commands::Config(_) => "config",
	}
}

pub async fn dispatch(cli: Cli) -> Result<()> {
	let store = cli.settings.map(SettingsStore::new).unwrap_or_else(SettingsStore::user);
	tracing::debug!(target = "fsi", settings = %store.path().display(), "using settings");

	match cli.command {
		Commands::Eval(args) => eval::run(args, &store, cli.format).await,
		Commands::Connect(args) => connect::run(args, &store, cli.format).await,
		Commands::Config(args) => config::run(args.action, &store, cli.format),
	}
}

/// Starts a host wired to `terminal`, persisting setting changes to `store`.
async fn start_host(store: &SettingsStore, terminal: &Terminal) -> Result<SessionHost> {
	let host = SessionHost::start(store.load(), terminal.parts()).await?;
	Ok(host.with_store(store.clone()))
}

fn secs(limit: Duration) -> u64 {
	limit.as_secs().max(1)
}
