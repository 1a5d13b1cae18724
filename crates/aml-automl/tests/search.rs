//! Search backends on small synthetic datasets.

use std::time::Duration;

use aml_automl::{AutoMlBackend, Evolutionary, FittedPipeline, RandomSearch, SearchSettings, accuracy};
use aml_config::Scoring;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Three classes separated along the first feature, plus one noise feature
/// and a sprinkling of missing cells.
fn dataset(rows_per_class: usize, seed: u64) -> (Array2<f64>, Vec<i64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut values = Vec::new();
    let mut y = Vec::new();
    for class in 0..3i64 {
        for _ in 0..rows_per_class {
            let signal = class as f64 * 4.0 + rng.gen_range(-1.0..1.0);
            let noise = rng.gen_range(-10.0..10.0);
            let signal = if rng.gen_bool(0.05) { f64::NAN } else { signal };
            values.extend_from_slice(&[signal, noise]);
            y.push(class);
        }
    }
    (Array2::from_shape_vec((y.len(), 2), values).unwrap(), y)
}

fn quick_settings() -> SearchSettings {
    SearchSettings {
        scoring: Scoring::Accuracy,
        cv_folds: 3,
        time_budget: Duration::from_secs(5),
        n_jobs: 2,
        random_state: 420,
        population_size: 6,
        generations: 3,
    }
}

#[test]
fn random_search_beats_chance() {
    let (x, y) = dataset(30, 1);
    let outcome = RandomSearch.search(&x, &y, &quick_settings()).unwrap();

    assert!(outcome.cv_score > 0.8, "cv score {}", outcome.cv_score);
    assert!(outcome.evaluated >= 4);
    let predictions = outcome.pipeline.predict(&x).unwrap();
    assert!(accuracy(&y, &predictions) > 0.8);
}

#[test]
fn evolutionary_beats_chance() {
    let (x, y) = dataset(30, 2);
    let outcome = Evolutionary.search(&x, &y, &quick_settings()).unwrap();

    assert!(outcome.cv_score > 0.8, "cv score {}", outcome.cv_score);
    let predictions = outcome.pipeline.predict(&x).unwrap();
    assert!(accuracy(&y, &predictions) > 0.8);
}

#[test]
fn evolutionary_is_deterministic_for_a_seed() {
    let (x, y) = dataset(20, 3);
    let settings = quick_settings();
    let a = Evolutionary.search(&x, &y, &settings).unwrap();
    let b = Evolutionary.search(&x, &y, &settings).unwrap();

    assert_eq!(a.pipeline.spec(), b.pipeline.spec());
    assert_eq!(a.cv_score, b.cv_score);
}

#[test]
fn all_cores_pool() {
    let (x, y) = dataset(15, 4);
    let settings = SearchSettings {
        n_jobs: -1,
        ..quick_settings()
    };
    assert!(RandomSearch.search(&x, &y, &settings).is_ok());
}

#[test]
fn mismatched_input_is_rejected() {
    let (x, _) = dataset(10, 5);
    assert!(RandomSearch.search(&x, &[0, 1], &quick_settings()).is_err());
}

#[test]
fn fitted_pipeline_survives_archiving() {
    let (x, y) = dataset(20, 6);
    let outcome = RandomSearch.search(&x, &y, &quick_settings()).unwrap();

    let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&outcome.pipeline).unwrap();
    let restored = rkyv::from_bytes::<FittedPipeline, rkyv::rancor::Error>(&bytes).unwrap();

    assert_eq!(restored, outcome.pipeline);
    assert_eq!(restored.predict(&x).unwrap(), outcome.pipeline.predict(&x).unwrap());
}
