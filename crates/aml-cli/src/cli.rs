//! CLI argument definitions for the AutoML skill.

use std::path::PathBuf;

use aml_config::{BackendKind, Scoring};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "aml",
    version,
    about = "Tabular AutoML skill - train and evaluate classifiers on CSV data",
    long_about = "Train, evaluate and serve a classifier over directories of CSV files.\n\n\
                  Settings come from defaults, an optional TOML file, environment\n\
                  variables and finally the flags below, in that order."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

/// Flags that override configuration file and environment values.
#[derive(Args, Default)]
pub struct SettingsArgs {
    /// TOML configuration file.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Name of the column to predict.
    #[arg(long = "target-column", value_name = "NAME", global = true)]
    pub target_column: Option<String>,

    /// Directory holding model.sav and label_encoder.sav.
    #[arg(long = "artifacts-dir", value_name = "DIR", global = true)]
    pub artifacts_directory: Option<PathBuf>,

    /// Read only this file from each data directory.
    #[arg(long = "csv-name", value_name = "FILE", global = true)]
    pub csv_name: Option<String>,

    /// CSV field delimiter.
    #[arg(long = "delimiter", value_name = "CHAR", global = true)]
    pub delimiter: Option<char>,

    /// Search budget in minutes.
    #[arg(long = "train-time", value_name = "MINUTES", global = true)]
    pub train_time: Option<f64>,

    /// Metric used for model selection and evaluation.
    #[arg(long = "scoring", value_enum, global = true)]
    pub scoring: Option<ScoringArg>,

    /// Pipeline search strategy.
    #[arg(long = "backend", value_enum, global = true)]
    pub backend: Option<BackendArg>,

    /// Search a new pipeline even when a model already exists.
    #[arg(long = "keep-training", global = true)]
    pub keep_training: bool,

    /// Worker threads for candidate scoring (-1 for all cores).
    #[arg(long = "n-jobs", value_name = "N", allow_negative_numbers = true, global = true)]
    pub n_jobs: Option<i32>,

    /// Seed for splitting and searching.
    #[arg(long = "random-state", value_name = "SEED", global = true)]
    pub random_state: Option<u64>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Split a data directory into training/train.csv and test/evaluate.csv.
    ProcessData(DataArgs),

    /// Train a model on a data directory and save it.
    Train(DataArgs),

    /// Score the saved model on a data directory.
    Evaluate(DataArgs),

    /// Predict labels for JSON records.
    Predict(PredictArgs),

    /// Process, train, save and evaluate in one go.
    Run(DataArgs),
}

#[derive(Parser)]
pub struct DataArgs {
    /// Directory containing the CSV files.
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,
}

#[derive(Parser)]
pub struct PredictArgs {
    /// JSON object or array of objects. Read from stdin when omitted.
    #[arg(value_name = "JSON", conflicts_with = "file")]
    pub input: Option<String>,

    /// Read the JSON input from a file.
    #[arg(long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ScoringArg {
    Accuracy,
    BalancedAccuracy,
    F1Macro,
}

impl From<ScoringArg> for Scoring {
    fn from(arg: ScoringArg) -> Self {
        match arg {
            ScoringArg::Accuracy => Self::Accuracy,
            ScoringArg::BalancedAccuracy => Self::BalancedAccuracy,
            ScoringArg::F1Macro => Self::F1Macro,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum BackendArg {
    RandomSearch,
    Evolutionary,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::RandomSearch => Self::RandomSearch,
            BackendArg::Evolutionary => Self::Evolutionary,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
