//! Result envelopes and printing.
//!
//! Every command produces a [`CommandResult`]. Text output is for people;
//! the JSON forms carry the same envelope for scripts.


use std::io::{self, Write};

use colored::Colorize;
use serde::Serialize;

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text
	#[default]
	Text,
	/// Pretty JSON envelope
	Json,
	/// One compact JSON envelope per line
	Ndjson,
}

/// One rendered inline result. Lines are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineLine {
	pub line: u32,
	pub start_line: u32,
	#[serde(flatten)]
	pub value: InlineValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InlineValue {
	Text { text: String },
	Exception { text: String },
	Image {
		bytes: usize,
		#[serde(skip_serializing_if = "Option::is_none")]
		file: Option<String>,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchLine {
	pub id: String,
	pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintedLine {
	pub file: String,
	pub msg: String,
}

/// Everything an evaluation produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvalReport {
	pub file: String,
	pub results: Vec<InlineLine>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub watches: Vec<WatchLine>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub printed: Vec<PrintedLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandError {
	pub code: &'static str,
	pub message: String,
}

/// Envelope printed for every command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult<T: Serialize> {
	pub ok: bool,
	pub command: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
}

impl<T: Serialize> CommandResult<T> {
	pub fn success(command: &'static str, data: T) -> Self {
		Self {
			ok: true,
			command,
			data: Some(data),
			error: None,
		}
	}

	pub fn failure(command: &'static str, code: &'static str, message: impl Into<String>) -> Self {
		Self {
			ok: false,
			command,
			data: None,
			error: Some(CommandError {
				code,
				message: message.into(),
			}),
		}
	}
}

/// Prints `result` as JSON. Text mode is handled per command.
pub fn print_json<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	let encoded = match format {
		OutputFormat::Ndjson => serde_json::to_string(result),
		_ => serde_json::to_string_pretty(result),
	};
	if let Ok(json) = encoded {
		println!("{json}");
	}
}

/// Prints an evaluation report in the requested format.
pub fn print_report(report: &EvalReport, format: OutputFormat) {
	match format {
		OutputFormat::Text => {
			let mut stdout = io::stdout().lock();
			let _ = write_report_text(&mut stdout, report, false);
		}
		_ => print_json(&CommandResult::success("eval", report), format),
	}
}

/// Text rendering of a report: one result per line, `N: value`.
pub fn write_report_text(out: &mut impl Write, report: &EvalReport, plain: bool) -> io::Result<()> {
	let width = report
		.results
		.iter()
		.map(|r| r.line.to_string().len())
		.max()
		.unwrap_or(1);

	for result in &report.results {
		let gutter = format!("{:>width$}", result.line);
		let gutter = if plain { gutter } else { gutter.dimmed().to_string() };
		match &result.value {
			InlineValue::Text { text } => writeln!(out, "{gutter}: {text}")?,
			InlineValue::Exception { text } => {
				let text = if plain { text.clone() } else { text.red().to_string() };
				writeln!(out, "{gutter}! {text}")?
			}
			InlineValue::Image { bytes, file } => match file {
				Some(file) => writeln!(out, "{gutter}: [image {bytes} bytes -> {file}]")?,
				None => writeln!(out, "{gutter}: [image {bytes} bytes]")?,
			},
		}
	}
	for watch in &report.watches {
		writeln!(out, "watch {}: {}", watch.id, watch.value)?;
	}
	Ok(())
}

/// Prints an error to stderr, and the failure envelope to stdout in JSON
/// modes.
pub fn print_error(command: &'static str, code: &'static str, message: &str, format: OutputFormat) {
	eprintln!("{} {message}", "error:".red().bold());
	if format != OutputFormat::Text {
		print_json(&CommandResult::<()>::failure(command, code, message), format);
	}
}
