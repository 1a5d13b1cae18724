use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use aml_config::Config;
use aml_core::{ProcessedData, Skill, TEST_DIR, TRAINING_DIR, TrainSummary};

use crate::cli::{PredictArgs, SettingsArgs};

/// Everything the `run` command did.
#[derive(Debug)]
pub struct RunResult {
    pub processed: ProcessedData,
    pub training: TrainSummary,
    pub score: f64,
}

/// Defaults, file, environment, then flags; validated.
pub fn load_config(settings: &SettingsArgs) -> Result<Config> {
    let mut config = Config::load(settings.config.as_deref()).context("load configuration")?;
    apply_settings(&mut config, settings);
    config.validate().context("validate configuration")?;
    Ok(config)
}

fn apply_settings(config: &mut Config, settings: &SettingsArgs) {
    if let Some(target) = &settings.target_column {
        config.target_column.clone_from(target);
    }
    if let Some(dir) = &settings.artifacts_directory {
        config.artifacts_directory.clone_from(dir);
    }
    if let Some(name) = &settings.csv_name {
        config.csv_name = Some(name.clone());
    }
    if let Some(delimiter) = settings.delimiter {
        config.delimiter = delimiter;
    }
    if let Some(minutes) = settings.train_time {
        config.train_time = minutes;
    }
    if let Some(scoring) = settings.scoring {
        config.scoring = scoring.into();
    }
    if let Some(backend) = settings.backend {
        config.backend = backend.into();
    }
    if settings.keep_training {
        config.keep_training = true;
    }
    if let Some(n_jobs) = settings.n_jobs {
        config.n_jobs = n_jobs;
    }
    if let Some(seed) = settings.random_state {
        config.random_state = seed;
    }
}

fn open_skill(config: &Config) -> Result<Skill> {
    Skill::from_config(config.clone()).with_context(|| {
        format!(
            "open artifacts in {}",
            config.artifacts_directory.display()
        )
    })
}

pub fn run_process_data(config: &Config, data_dir: &Path) -> Result<ProcessedData> {
    let _guard = info_span!("process_data", dir = %data_dir.display()).entered();
    let skill = open_skill(config)?;
    skill
        .process_data(data_dir)
        .with_context(|| format!("process {}", data_dir.display()))
}

/// Train on `data_dir` and save the model.
pub fn run_train(config: &Config, data_dir: &Path) -> Result<TrainSummary> {
    let _guard = info_span!("train", dir = %data_dir.display()).entered();
    let mut skill = open_skill(config)?;
    let summary = skill
        .train(data_dir)
        .with_context(|| format!("train on {}", data_dir.display()))?;
    let path = skill.save().context("save model")?;
    info!(path = %path.display(), "model saved");
    Ok(summary)
}

pub fn run_evaluate(config: &Config, data_dir: &Path) -> Result<f64> {
    let _guard = info_span!("evaluate", dir = %data_dir.display()).entered();
    let skill = open_skill(config)?;
    skill
        .evaluate(data_dir)
        .with_context(|| format!("evaluate on {}", data_dir.display()))
}

/// Predict from the inline argument, a file, or stdin.
pub fn run_predict(config: &Config, args: &PredictArgs) -> Result<String> {
    let input = match (&args.input, &args.file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => {
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?
        }
        (None, None) => io::read_to_string(io::stdin()).context("read stdin")?,
    };
    let skill = open_skill(config)?;
    skill.predict_str(&input).context("predict")
}

/// Split, train on the training split, save, then score the test split.
pub fn run_all(config: &Config, data_dir: &Path) -> Result<RunResult> {
    let _guard = info_span!("run", dir = %data_dir.display()).entered();
    let processed = run_process_data(config, data_dir)?;
    let training = run_train(config, &data_dir.join(TRAINING_DIR))?;
    let score = run_evaluate(config, &data_dir.join(TEST_DIR))?;
    info!(score, scoring = %config.scoring, "run complete");
    Ok(RunResult {
        processed,
        training,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aml_config::Scoring;

    use crate::cli::ScoringArg;

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        let settings = SettingsArgs {
            target_column: Some("label".to_string()),
            scoring: Some(ScoringArg::F1Macro),
            n_jobs: Some(-1),
            keep_training: true,
            ..SettingsArgs::default()
        };
        apply_settings(&mut config, &settings);
        assert_eq!(config.target_column, "label");
        assert_eq!(config.scoring, Scoring::F1Macro);
        assert_eq!(config.n_jobs, -1);
        assert!(config.keep_training);
        assert_eq!(config.random_state, 420);
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let mut config = Config {
            keep_training: true,
            ..Config::default()
        };
        apply_settings(&mut config, &SettingsArgs::default());
        assert_eq!(config, Config {
            keep_training: true,
            ..Config::default()
        });
    }
}
