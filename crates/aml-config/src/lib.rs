//! Run configuration for the AutoML skill.
//!
//! A [`Config`] is built once at process start and passed by reference into
//! every component. Values are layered:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. An optional TOML file ([`Config::from_file`])
//! 3. Environment variables ([`Config::apply_overrides`])
//!
//! The binary applies its own flag overrides on top and then calls
//! [`Config::validate`].

mod error;
mod settings;

pub use error::{ConfigError, Result};
pub use settings::{BackendKind, Config, ENV_PREFIX, LABEL_ENCODER_FILE, MODEL_FILE, PIPELINE_FILE, Scoring};
