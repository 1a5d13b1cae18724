//! AutoML skill CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use aml_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use aml_cli::commands::{
    load_config, run_all, run_evaluate, run_predict, run_process_data, run_train,
};
use aml_cli::logging::{LogConfig, LogFormat, init_logging};
use aml_cli::summary::{print_processed, print_score, print_train_summary};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let exit_code = match execute(&cli) {
        Ok(()) => 0,
        Err(error) => {
            tracing::error!("command failed: {error:#}");
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn execute(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(&cli.settings)?;
    match &cli.command {
        Command::ProcessData(args) => {
            let processed = run_process_data(&config, &args.data_dir)?;
            print_processed(&processed);
        }
        Command::Train(args) => {
            let summary = run_train(&config, &args.data_dir)?;
            print_train_summary(&summary);
        }
        Command::Evaluate(args) => {
            let score = run_evaluate(&config, &args.data_dir)?;
            print_score(config.scoring.as_str(), score);
        }
        Command::Predict(args) => {
            println!("{}", run_predict(&config, args)?);
        }
        Command::Run(args) => {
            let result = run_all(&config, &args.data_dir)?;
            print_processed(&result.processed);
            print_train_summary(&result.training);
            print_score(config.scoring.as_str(), result.score);
        }
    }
    Ok(())
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
