//! CLI library components for the AutoML skill.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
