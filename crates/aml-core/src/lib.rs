//! The AutoML skill: train, evaluate, save and predict over CSV directories.
//!
//! A [`Skill`] owns one configuration, one search backend and at most one
//! trained [`ModelArtifact`]. Artifacts live in the configured directory as
//! `model.sav` and `label_encoder.sav` and are picked up again by
//! [`Skill::open`].
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use aml_config::Config;
//! use aml_core::Skill;
//!
//! let mut skill = Skill::from_config(Config::load(None)?)?;
//! skill.train(Path::new("data/training"))?;
//! let score = skill.evaluate(Path::new("data/test"))?;
//! skill.save()?;
//! ```

mod artifact;
mod error;
mod features;
mod skill;

pub use artifact::ModelArtifact;
pub use error::{Result, SkillError};
pub use features::{FeatureColumn, FeatureKind, FeatureSchema, target_codes};
pub use skill::{
    EVALUATE_FILE, ModelState, ProcessedData, Skill, TEST_DIR, TRAIN_FILE, TRAINING_DIR, TrainSummary,
};
