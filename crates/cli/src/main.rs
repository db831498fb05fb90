use clap::Parser;
use fsi_cli::cli::Cli;
use fsi_cli::error::CliError;
use fsi_cli::output::{self, CommandResult, OutputFormat};
use fsi_cli::{commands, logging};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = commands::command_name(&cli.command);

	if let Err(err) = commands::dispatch(cli).await {
		handle_error(command, &err, format);
		std::process::exit(1);
	}
}

fn handle_error(command: &'static str, err: &CliError, format: OutputFormat) {
	// Popups were already printed to stderr; only the envelope is missing.
	if err.is_reported() {
		if format != OutputFormat::Text {
			output::print_json(&CommandResult::<()>::failure(command, err.code(), err.to_string()), format);
		}
		return;
	}
	output::print_error(command, err.code(), &err.to_string(), format);
}
