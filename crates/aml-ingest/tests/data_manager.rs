//! End-to-end tests for loading, encoding and splitting a data directory.

use std::fs;
use std::path::Path;

use aml_config::Config;
use aml_ingest::{DataManager, LabelEncoder, LoadPurpose, stratified_split};
use tempfile::TempDir;

fn write_csv(dir: &Path, name: &str, rows: &[(i64, f64, &str)]) {
    let mut content = String::from("f1,f2,target\n");
    for (f1, f2, target) in rows {
        content.push_str(&format!("{f1},{f2},{target}\n"));
    }
    fs::write(dir.join(name), content).unwrap();
}

fn two_file_dataset(dir: &Path) {
    let first: Vec<(i64, f64, &str)> = (0..30)
        .map(|i| (i, f64::from(i as i32) * 0.5, if i % 2 == 0 { "yes" } else { "no" }))
        .collect();
    let second: Vec<(i64, f64, &str)> = (30..50)
        .map(|i| (i, f64::from(i as i32) * 0.5, if i % 2 == 0 { "yes" } else { "no" }))
        .collect();
    write_csv(dir, "part1.csv", &first);
    write_csv(dir, "part2.csv", &second);
}

#[test]
fn two_files_merge_encode_and_split() {
    let root = TempDir::new().unwrap();
    let data = root.path().join("data");
    fs::create_dir(&data).unwrap();
    two_file_dataset(&data);

    let config = Config {
        artifacts_directory: root.path().join("artifacts"),
        ..Config::default()
    };

    let manager = DataManager::load(&data, &config, LoadPurpose::Training).unwrap();
    assert_eq!(manager.report().loaded_count(), 2);
    assert!(manager.validate(true).is_valid());

    let frame = manager.data().unwrap();
    assert_eq!(frame.height(), 50);

    let codes: Vec<i64> = frame
        .column("target")
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert!(codes.iter().all(|c| *c == 0 || *c == 1));
    assert_eq!(manager.classes(), vec![0, 1]);

    let encoder = LabelEncoder::load(&config.label_encoder_path()).unwrap().unwrap();
    assert_eq!(encoder.classes(), &["no", "yes"]);

    let split = stratified_split(frame, "target", 0.2, 420).unwrap();
    assert_eq!(split.test.height(), 10);
    assert_eq!(split.train.height(), 40);

    let test_codes: Vec<i64> = split
        .test
        .column("target")
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert!(test_codes.contains(&0));
    assert!(test_codes.contains(&1));
}

#[test]
fn reload_keeps_label_codes() {
    let root = TempDir::new().unwrap();
    let data = root.path().join("data");
    fs::create_dir(&data).unwrap();
    two_file_dataset(&data);

    let config = Config {
        artifacts_directory: root.path().join("artifacts"),
        ..Config::default()
    };

    let first = DataManager::load(&data, &config, LoadPurpose::Training).unwrap();
    let second = DataManager::load(&data, &config, LoadPurpose::Training).unwrap();

    assert_eq!(first.label_encoder(), second.label_encoder());
    assert!(first.data().unwrap().equals(second.data().unwrap()));
}

#[test]
fn directory_without_usable_files_has_no_data() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("notes.txt"), "hello").unwrap();
    fs::write(root.path().join("other.csv"), "a,b\n1,2\n").unwrap();

    let config = Config {
        artifacts_directory: root.path().join("artifacts"),
        ..Config::default()
    };
    let manager = DataManager::load(root.path(), &config, LoadPurpose::Training).unwrap();

    assert!(manager.data().is_none());
    assert!(!manager.validate(true).is_valid());
    assert_eq!(manager.report().skipped().count(), 1);
}
