use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Installs the stderr subscriber. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbosity: u8) {
	// Everything logs under the "fsi" target, so 0 hides session chatter and
	// leaves only errors.
	let filter = match verbosity {
		0 => "error,fsi=off",
		1 => "warn,fsi=info",
		_ => "debug,fsi=trace",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr.with_max_level(tracing::Level::TRACE))
		.with_target(verbosity > 1)
		.compact()
		.init();
}
