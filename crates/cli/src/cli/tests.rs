use std::path::PathBuf;

use clap::Parser;

use super::*;

#[test]
fn parse_eval_whole_file() {
	let cli = Cli::try_parse_from(["fsi-eval", "eval", "script.fsx"]).unwrap();

	match cli.command {
		Commands::Eval(args) => {
			assert_eq!(args.file, PathBuf::from("script.fsx"));
			assert_eq!(args.line, None);
			assert_eq!(args.block(), None);
			assert!(args.watches.is_empty());
			assert_eq!(args.idle_ms, 1500);
		}
		_ => panic!("Expected Eval command"),
	}
	assert_eq!(cli.format, OutputFormat::Text);
}

#[test]
fn parse_eval_line_is_zero_based_internally() {
	let cli = Cli::try_parse_from(["fsi-eval", "eval", "a.fsx", "--line", "3"]).unwrap();

	match cli.command {
		Commands::Eval(args) => assert_eq!(args.line, Some(2)),
		_ => panic!("Expected Eval command"),
	}
}

#[test]
fn parse_eval_block_and_watches() {
	let cli = Cli::try_parse_from([
		"fsi-eval", "eval", "a.fsx", "--start", "2", "--end", "4", "--watch", "1:1", "--watch", "5:6",
	])
	.unwrap();

	match cli.command {
		Commands::Eval(args) => {
			assert_eq!(args.block(), Some(LineRange::new(1, 3)));
			assert_eq!(args.watches, vec![LineRange::new(0, 0), LineRange::new(4, 5)]);
		}
		_ => panic!("Expected Eval command"),
	}
}

#[test]
fn line_conflicts_with_block() {
	let err = Cli::try_parse_from(["fsi-eval", "eval", "a.fsx", "--line", "1", "--start", "1", "--end", "2"]);
	assert!(err.is_err());
}

#[test]
fn start_requires_end() {
	assert!(Cli::try_parse_from(["fsi-eval", "eval", "a.fsx", "--start", "1"]).is_err());
}

#[test]
fn rejects_bad_spans() {
	assert!(Cli::try_parse_from(["fsi-eval", "eval", "a.fsx", "--watch", "3"]).is_err());
	assert!(Cli::try_parse_from(["fsi-eval", "eval", "a.fsx", "--watch", "4:2"]).is_err());
	assert!(Cli::try_parse_from(["fsi-eval", "eval", "a.fsx", "--line", "0"]).is_err());
}

#[test]
fn parse_connect_defaults() {
	let cli = Cli::try_parse_from(["fsi-eval", "connect"]).unwrap();

	match cli.command {
		Commands::Connect(args) => {
			assert_eq!(args.dir, None);
			assert!(!args.hold);
			assert_eq!(args.timeout, 30);
		}
		_ => panic!("Expected Connect command"),
	}
}

#[test]
fn parse_config_setters() {
	let cli = Cli::try_parse_from(["fsi-eval", "config", "fsharp-exe", "/usr/bin/fsharpi"]).unwrap();
	match cli.command {
		Commands::Config(ConfigArgs {
			action: ConfigAction::FsharpExe { path },
		}) => assert_eq!(path, Some(PathBuf::from("/usr/bin/fsharpi"))),
		_ => panic!("Expected config fsharp-exe"),
	}

	let cli = Cli::try_parse_from(["fsi-eval", "config", "ifsharp-exe"]).unwrap();
	assert!(matches!(
		cli.command,
		Commands::Config(ConfigArgs {
			action: ConfigAction::IfsharpExe { path: None }
		})
	));
}

#[test]
fn global_flags_after_subcommand() {
	let cli = Cli::try_parse_from(["fsi-eval", "config", "show", "-vv", "-f", "json"]).unwrap();
	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.format, OutputFormat::Json);
}
