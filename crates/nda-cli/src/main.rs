//! NDA BIDS upload preparation CLI.

use clap::{ColorChoice, Parser};
use nda_cli::commands::{exit_code_for, run_collect, run_lookup, run_prepare, run_templates};
use nda_cli::logging::{LogConfig, LogFormat, init_logging};
use nda_cli::types::{PrepareOptions, exit_code};
use nda_prepare::PlacementMode;
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::summary::{print_lookup_summary, print_prepare_summary, print_templates_summary};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(exit_code::FAILURE);
    }
    let outcome = match cli.command {
        Command::Templates(args) => run_templates(
            &args.bids_dir,
            args.destination.as_deref(),
            args.generalize_sessions,
        )
        .map(|result| {
            print_templates_summary(&result);
            exit_code::SUCCESS
        }),
        Command::Collect(args) => {
            run_collect(&args.bids_dir, args.destination.as_deref()).map(|json| {
                println!("{json}");
                exit_code::SUCCESS
            })
        }
        Command::Lookup(args) => {
            run_lookup(&args.bids_dir, args.output.as_deref()).map(|result| {
                print_lookup_summary(&result);
                exit_code::SUCCESS
            })
        }
        Command::Prepare(args) => {
            let options = PrepareOptions {
                source: args.source,
                destination: args.destination,
                skip_filemapper: args.skip_filemapper,
                manifest_dir: args.manifest_dir,
                mode: if args.copy {
                    PlacementMode::Copy
                } else {
                    PlacementMode::Symlink
                },
            };
            run_prepare(&options).map(|result| {
                print_prepare_summary(&result);
                result.exit_code()
            })
        }
    };
    let exit_code = match outcome {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            exit_code_for(&error)
        }
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
