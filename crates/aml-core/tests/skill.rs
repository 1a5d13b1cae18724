//! Full skill lifecycle over temporary data and artifact directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use aml_automl::{AutoMlBackend, CandidateSpec, FittedPipeline, SearchOutcome, SearchSettings, Weighting};
use aml_config::Config;
use aml_core::{EVALUATE_FILE, Skill, SkillError, TEST_DIR, TRAIN_FILE, TRAINING_DIR};
use aml_persistence::verify_checksum;
use ndarray::Array2;
use serde_json::json;
use tempfile::TempDir;

/// Two well separated classes on `size`, a categorical `shape` and a noise column.
fn write_dataset(dir: &Path, name: &str, rows: usize, offset: usize) {
    let mut content = String::from("size,shape,noise,label\n");
    for i in 0..rows {
        let n = i + offset;
        let big = n % 2 == 0;
        let size = if big { 50.0 + (n % 7) as f64 } else { 5.0 + (n % 5) as f64 };
        let shape = if big { "square" } else { "circle" };
        let label = if big { "large" } else { "small" };
        content.push_str(&format!("{size},{shape},{},{label}\n", n % 3));
    }
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), content).unwrap();
}

fn config(root: &Path) -> Config {
    Config {
        target_column: "label".to_string(),
        artifacts_directory: root.join("artifacts"),
        train_time: 0.05,
        cv_folds: 3,
        population_size: 4,
        generations: 2,
        ..Config::default()
    }
}

fn data_dir(root: &Path) -> PathBuf {
    let dir = root.join("data");
    write_dataset(&dir, "part1.csv", 40, 0);
    write_dataset(&dir, "part2.csv", 20, 40);
    dir
}

#[test]
fn train_save_reopen_evaluate() {
    let root = TempDir::new().unwrap();
    let data = data_dir(root.path());
    let config = config(root.path());

    let mut skill = Skill::from_config(config.clone()).unwrap();
    assert!(!skill.is_trained());

    let summary = skill.train(&data).unwrap();
    assert_eq!(summary.rows, 60);
    assert_eq!(summary.features, 3);
    assert!(!summary.refit);
    assert!(summary.cv_score > 0.9, "cv score {}", summary.cv_score);

    let score = skill.evaluate(&data).unwrap();
    assert!(score > 0.9);

    let model_path = skill.save().unwrap();
    assert!(model_path.is_file());

    let description = fs::read_to_string(config.pipeline_path()).unwrap();
    assert!(description.contains(&summary.pipeline));
    assert!(description.contains("classes: large, small"));
    assert!(description.contains("shape: categorical (2 categories)"));

    let reopened = Skill::from_config(config).unwrap();
    assert!(reopened.is_trained());
    assert_eq!(reopened.artifact(), skill.artifact());
    assert_eq!(reopened.evaluate(&data).unwrap(), score);
}

#[test]
fn untrained_operations_fail() {
    let root = TempDir::new().unwrap();
    let data = data_dir(root.path());
    let skill = Skill::from_config(config(root.path())).unwrap();

    assert!(matches!(skill.evaluate(&data), Err(SkillError::ModelNotTrained)));
    assert!(matches!(skill.save(), Err(SkillError::ModelNotTrained)));
    assert!(matches!(
        skill.predict(&json!({"size": 1.0})),
        Err(SkillError::ModelNotTrained)
    ));
}

#[test]
fn missing_directory_is_data_unavailable() {
    let root = TempDir::new().unwrap();
    let mut skill = Skill::from_config(config(root.path())).unwrap();
    let result = skill.train(&root.path().join("nowhere"));
    assert!(matches!(result, Err(SkillError::DataUnavailable { .. })));
}

#[test]
fn single_class_is_rejected() {
    let root = TempDir::new().unwrap();
    let data = root.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("one.csv"), "size,label\n1,a\n2,a\n3,a\n").unwrap();

    let mut skill = Skill::from_config(config(root.path())).unwrap();
    let result = skill.train(&data);
    assert!(matches!(result, Err(SkillError::InsufficientClasses { class }) if class == "a"));
}

#[test]
fn imbalanced_classes_are_rejected() {
    let root = TempDir::new().unwrap();
    let data = root.path().join("data");
    fs::create_dir_all(&data).unwrap();
    let mut content = String::from("size,label\n");
    for i in 0..99 {
        content.push_str(&format!("{i},common\n"));
    }
    content.push_str("1000,rare\n");
    fs::write(data.join("skewed.csv"), content).unwrap();

    let config = Config {
        class_percentage_validation: 0.05,
        ..config(root.path())
    };
    let mut skill = Skill::from_config(config).unwrap();
    assert!(matches!(skill.train(&data), Err(SkillError::ClassImbalance { .. })));
}

#[test]
fn retrain_refits_existing_pipeline() {
    let root = TempDir::new().unwrap();
    let data = data_dir(root.path());
    let mut skill = Skill::from_config(config(root.path())).unwrap();

    let first = skill.train(&data).unwrap();
    let second = skill.train(&data).unwrap();

    assert!(second.refit);
    assert_eq!(second.evaluated, 0);
    assert_eq!(second.pipeline, first.pipeline);
}

#[test]
fn process_data_writes_checksummed_splits() {
    let root = TempDir::new().unwrap();
    let data = data_dir(root.path());
    let skill = Skill::from_config(config(root.path())).unwrap();

    let processed = skill.process_data(&data).unwrap();
    assert_eq!(processed.train_rows + processed.test_rows, 60);
    assert_eq!(processed.test_rows, 12);
    assert_eq!(processed.train_path, data.join(TRAINING_DIR).join(TRAIN_FILE));
    assert_eq!(processed.test_path, data.join(TEST_DIR).join(EVALUATE_FILE));
    assert!(verify_checksum(&processed.train_path, &processed.train_checksum).unwrap());
    assert!(verify_checksum(&processed.test_path, &processed.test_checksum).unwrap());

    let text = fs::read_to_string(&processed.test_path).unwrap();
    assert!(text.contains("large"));
    assert!(text.contains("small"));

    let again = skill.process_data(&data).unwrap();
    assert_eq!(again.train_checksum, processed.train_checksum);
    assert_eq!(again.test_checksum, processed.test_checksum);
}

#[test]
fn processed_splits_train_and_evaluate() {
    let root = TempDir::new().unwrap();
    let data = data_dir(root.path());
    let mut skill = Skill::from_config(config(root.path())).unwrap();

    skill.process_data(&data).unwrap();
    let summary = skill.train(&data.join(TRAINING_DIR)).unwrap();
    assert_eq!(summary.rows, 48);
    assert!(skill.evaluate(&data.join(TEST_DIR)).unwrap() > 0.8);
}

#[test]
fn predict_decodes_labels() {
    let root = TempDir::new().unwrap();
    let data = data_dir(root.path());
    let mut skill = Skill::from_config(config(root.path())).unwrap();
    skill.train(&data).unwrap();

    let single = skill
        .predict(&json!({"size": 55.0, "shape": "square", "noise": 1}))
        .unwrap();
    assert_eq!(single, json!("large"));

    let batch = skill
        .predict(&json!([
            {"size": 6.0, "shape": "circle", "noise": 0},
            {"size": 52.0, "shape": "square"}
        ]))
        .unwrap();
    assert_eq!(batch, json!(["small", "large"]));

    let text = skill.predict_str(r#"{"size": 7, "shape": "circle"}"#).unwrap();
    assert_eq!(text, r#""small""#);

    assert_eq!(skill.predict(&json!([])).unwrap(), json!([]));
    assert!(matches!(skill.predict(&json!(3)), Err(SkillError::InvalidInput { .. })));
    assert!(matches!(skill.predict_str("{not json"), Err(SkillError::InvalidInput { .. })));
    assert!(matches!(
        skill.predict(&json!({"unrelated": 1})),
        Err(SkillError::SchemaMismatch { .. })
    ));
}

#[test]
fn retrain_on_numeric_target_drops_old_labels() {
    let root = TempDir::new().unwrap();
    let labelled = root.path().join("labelled");
    let numeric = root.path().join("numeric");
    fs::create_dir_all(&labelled).unwrap();
    fs::create_dir_all(&numeric).unwrap();
    let mut text_rows = String::from("f1,target\n");
    let mut code_rows = String::from("f1,target\n");
    for i in 0..50 {
        let (label, code) = if i < 25 { ("no", 0) } else { ("yes", 1) };
        text_rows.push_str(&format!("{i},{label}\n"));
        code_rows.push_str(&format!("{i},{code}\n"));
    }
    fs::write(labelled.join("part.csv"), text_rows).unwrap();
    fs::write(numeric.join("part.csv"), code_rows).unwrap();

    let base = Config {
        target_column: "target".to_string(),
        ..config(root.path())
    };
    let mut skill = Skill::from_config(base.clone()).unwrap();
    skill.train(&labelled).unwrap();
    skill.save().unwrap();
    assert_eq!(skill.predict(&json!({"f1": 40})).unwrap(), json!("yes"));

    let retrain = Config {
        keep_training: true,
        ..base.clone()
    };
    let mut skill = Skill::from_config(retrain).unwrap();
    skill.train(&numeric).unwrap();
    skill.save().unwrap();

    let reopened = Skill::from_config(base).unwrap();
    assert_eq!(reopened.artifact().unwrap().classes, None);
    assert_eq!(reopened.predict(&json!({"f1": 40})).unwrap(), json!(1));
    assert_eq!(reopened.predict(&json!({"f1": 3})).unwrap(), json!(0));
}

/// Always returns a 10-nearest-neighbours pipeline.
struct TenNeighbours;

impl AutoMlBackend for TenNeighbours {
    fn name(&self) -> &'static str {
        "ten-neighbours"
    }

    fn search(&self, x: &Array2<f64>, y: &[i64], _settings: &SearchSettings) -> aml_automl::Result<SearchOutcome> {
        let spec = CandidateSpec::Knn {
            k: 10,
            weighting: Weighting::Uniform,
        };
        Ok(SearchOutcome {
            pipeline: FittedPipeline::fit(spec, x, y)?,
            cv_score: 1.0,
            evaluated: 1,
            elapsed: Duration::ZERO,
        })
    }
}

#[test]
fn refit_on_small_data_survives_cross_validation_failure() {
    let root = TempDir::new().unwrap();
    let data = data_dir(root.path());
    let small = root.path().join("small");
    write_dataset(&small, "small.csv", 12, 0);

    let mut skill = Skill::open(config(root.path()), Box::new(TenNeighbours)).unwrap();
    skill.train(&data).unwrap();

    // 12 rows fit k = 10, but 3-fold training folds of 8 rows do not.
    let summary = skill.train(&small).unwrap();
    assert!(summary.refit);
    assert_eq!(summary.rows, 12);
    assert!(summary.cv_score.is_nan());
    assert_eq!(skill.artifact().unwrap().trained_rows, 12);
    assert!(skill.predict(&json!({"size": 55.0, "shape": "square"})).is_ok());
}
