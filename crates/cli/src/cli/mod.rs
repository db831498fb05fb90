#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Args, Parser, Subcommand};
use fsi::protocol::LineRange;

use crate::output::OutputFormat;

/// Root CLI for fsi-eval.
#[derive(Parser, Debug)]
#[command(name = "fsi-eval")]
#[command(about = "Evaluate F# scripts through a bridged F# interactive session")]
#[command(version)]
#[command(styles = help_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default), json, or ndjson
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Settings file to use instead of the per-user one
	#[arg(long, global = true, value_name = "FILE")]
	pub settings: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Evaluate a script, or part of it, and print the inline results.
	Eval(EvalArgs),
	/// Start an interpreter for a project directory.
	Connect(ConnectArgs),
	/// Show or change interpreter settings.
	Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EvalArgs {
	/// Script to evaluate
	#[arg(value_name = "FILE")]
	pub file: PathBuf,

	/// Evaluate the expression at this line (1-based)
	#[arg(long, value_name = "N", conflicts_with_all = ["start", "end"], value_parser = parse_line)]
	pub line: Option<u32>,

	/// First line of the block to evaluate (1-based)
	#[arg(long, value_name = "S", requires = "end", value_parser = parse_line)]
	pub start: Option<u32>,

	/// Last line of the block to evaluate (1-based, inclusive)
	#[arg(long, value_name = "E", requires = "start", value_parser = parse_line)]
	pub end: Option<u32>,

	/// Watch lines S:E (1-based, inclusive); repeatable
	#[arg(long = "watch", value_name = "S:E", value_parser = parse_span)]
	pub watches: Vec<LineRange>,

	/// Stop once no response has arrived for this long
	#[arg(long, value_name = "MS", default_value_t = 1500)]
	pub idle_ms: u64,

	/// Give up after this many seconds
	#[arg(long, value_name = "SECS", default_value_t = 60)]
	pub timeout: u64,

	/// Write rendered images into this directory
	#[arg(long, value_name = "DIR")]
	pub images: Option<PathBuf>,
}

impl EvalArgs {
	/// The evaluated block as a 0-based range, if one was given.
	pub fn block(&self) -> Option<LineRange> {
		match (self.start, self.end) {
			(Some(start), Some(end)) => Some(LineRange::new(start, end)),
			_ => None,
		}
	}
}

#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
	/// Project directory (defaults to the current directory)
	#[arg(value_name = "DIR")]
	pub dir: Option<PathBuf>,

	/// Keep the session open until interrupted
	#[arg(long)]
	pub hold: bool,

	/// Give up waiting for the interpreter after this many seconds
	#[arg(long, value_name = "SECS", default_value_t = 30)]
	pub timeout: u64,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
	#[command(subcommand)]
	pub action: ConfigAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
	/// Print the settings file location and contents.
	Show,
	/// Set the path to the F# executable for clients (omit to clear).
	FsharpExe {
		#[arg(value_name = "PATH")]
		path: Option<PathBuf>,
	},
	/// Set the path to ifsharp for clients (omit to clear).
	IfsharpExe {
		#[arg(value_name = "PATH")]
		path: Option<PathBuf>,
	},
	/// Set the bridge script location (omit to clear).
	BridgeScript {
		#[arg(value_name = "PATH")]
		path: Option<PathBuf>,
	},
}

/// 1-based line number to a 0-based index.
fn parse_line(raw: &str) -> Result<u32, String> {
	let line: u32 = raw
		.trim()
		.parse()
		.map_err(|_| format!("invalid line number: {raw}"))?;
	line.checked_sub(1)
		.ok_or_else(|| "line numbers start at 1".to_string())
}

/// `S:E` (1-based, inclusive) to a 0-based range.
fn parse_span(raw: &str) -> Result<LineRange, String> {
	let (start, end) = raw
		.split_once(':')
		.ok_or_else(|| format!("expected S:E, got {raw}"))?;
	let (start, end) = (parse_line(start)?, parse_line(end)?);
	if start > end {
		return Err(format!("range {raw} ends before it starts"));
	}
	Ok(LineRange::new(start, end))
}

fn help_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Yellow.on_default().bold())
		.usage(AnsiColor::Yellow.on_default().bold())
		.literal(AnsiColor::Blue.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
}
