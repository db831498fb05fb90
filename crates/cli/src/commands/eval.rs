//! `fsi-eval eval`: run a script through the interpreter and print what it
//! produced, line by line.

use std::fs;
use std::path::Path;
use std::time::Duration;

use fsi::protocol::{Cursor, DocumentId};
use fsi::{Document, EvalScope, InlineResult, SessionHost, SettingsStore, TextDocument};
use tokio::time::Instant;
use tracing::{debug, info};

use super::{secs, start_host};
use crate::cli::EvalArgs;
use crate::error::{CliError, Result};
use crate::output::{self, EvalReport, InlineLine, InlineValue, OutputFormat, PrintedLine, WatchLine};
use crate::terminal::Terminal;

/// The CLI only ever has one document open.
const DOC_ID: DocumentId = DocumentId(1);

pub async fn run(args: EvalArgs, store: &SettingsStore, format: OutputFormat) -> Result<()> {
	let (doc, scope) = load_document(&args)?;
	let terminal = Terminal::new(format == OutputFormat::Text);
	let mut host = start_host(store, &terminal).await?;

	info!(target = "fsi", file = %args.file.display(), ?scope, "evaluating");
	if let Err(err) = host.eval(&doc, scope) {
		return Err(match terminal.first_popup() {
			Some(header) => CliError::Aborted(header),
			None => err.into(),
		});
	}

	let idle = Duration::from_millis(args.idle_ms);
	let limit = Duration::from_secs(args.timeout);
	settle(&mut host, &terminal, idle, limit).await?;
	host.shutdown();

	if let Some(header) = terminal.first_popup() {
		return Err(CliError::Aborted(header));
	}

	let path = doc.path().unwrap_or(&args.file);
	let report = build_report(&terminal, path, args.images.as_deref())?;
	output::print_report(&report, format);
	Ok(())
}

/// Opens the script and applies the line options to it.
pub fn load_document(args: &EvalArgs) -> Result<(TextDocument, EvalScope)> {
	let path = fs::canonicalize(&args.file).map_err(|source| CliError::Document {
		path: args.file.clone(),
		source,
	})?;
	let mut doc = TextDocument::open(DOC_ID, &path).map_err(|source| CliError::Document {
		path: path.clone(),
		source,
	})?;
	let count = doc.line_count();

	for range in &args.watches {
		if range.end >= count || doc.add_watch(*range).is_none() {
			return Err(CliError::InvalidWatch {
				start: range.start + 1,
				end: range.end + 1,
			});
		}
	}

	let scope = if let Some(line) = args.line {
		check_line(line, count)?;
		doc.set_cursor(Cursor::new(line, 0));
		EvalScope::One
	} else if let Some(block) = args.block() {
		if block.start > block.end {
			return Err(CliError::InvertedBlock {
				start: block.start + 1,
				end: block.end + 1,
			});
		}
		check_line(block.end, count)?;
		doc.select(block);
		EvalScope::One
	} else {
		EvalScope::Document
	};

	Ok((doc, scope))
}

fn check_line(line: u32, count: u32) -> Result<()> {
	if line >= count {
		return Err(CliError::LineOutOfRange { line: line + 1, count });
	}
	Ok(())
}

/// Drives the host until results stop arriving.
///
/// Finishes after `idle` without events once at least one response is in,
/// when a popup is shown, or when the session goes away. Reaching `limit`
/// with nothing to show is a timeout.
async fn settle(host: &mut SessionHost, terminal: &Terminal, idle: Duration, limit: Duration) -> Result<()> {
	let deadline = Instant::now() + limit;

	loop {
		if terminal.first_popup().is_some() {
			return Ok(());
		}
		let now = Instant::now();
		if now >= deadline {
			if terminal.responses() > 0 {
				return Ok(());
			}
			return Err(CliError::Timeout {
				secs: secs(limit),
				condition: "evaluation results",
			});
		}

		match tokio::time::timeout(idle.min(deadline - now), host.step()).await {
			Ok(true) => {}
			Ok(false) => return Ok(()),
			Err(_) if host.registry().is_empty() => {
				debug!(target = "fsi", "session ended");
				return Ok(());
			}
			Err(_) if terminal.responses() > 0 && !host.registry().any_connecting() => return Ok(()),
			Err(_) => {}
		}
	}
}

/// Collects the board into a report, writing images to `images` if given.
fn build_report(terminal: &Terminal, file: &Path, images: Option<&Path>) -> Result<EvalReport> {
	if let Some(dir) = images {
		fs::create_dir_all(dir)?;
	}

	terminal.with_state(|state| -> Result<EvalReport> {
		let mut report = EvalReport {
			file: file.display().to_string(),
			..Default::default()
		};

		for (anchor, result) in state.board.for_document(DOC_ID) {
			let value = match result {
				InlineResult::Text(text) => InlineValue::Text { text: text.clone() },
				InlineResult::Exception(text) => InlineValue::Exception { text: text.clone() },
				InlineResult::Image(png) => {
					let file = match images {
						Some(dir) => {
							let path = dir.join(format!("line-{}.png", anchor.line + 1));
							fs::write(&path, png)?;
							Some(path.display().to_string())
						}
						None => None,
					};
					InlineValue::Image { bytes: png.len(), file }
				}
			};
			report.results.push(InlineLine {
				line: anchor.line + 1,
				start_line: anchor.start_line + 1,
				value,
			});
		}

		report.watches = state
			.board
			.watches_for(DOC_ID)
			.map(|(id, value)| WatchLine {
				id: id.to_string(),
				value: value.to_string(),
			})
			.collect();
		report.printed = state
			.printed
			.iter()
			.map(|entry| PrintedLine {
				file: entry.file.clone(),
				msg: entry.content.clone(),
			})
			.collect();

		Ok(report)
	})
}
