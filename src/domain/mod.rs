//! Core domain types and logic.

pub mod transform;
pub mod series;
pub mod frequency;
pub mod metric;
pub mod window;
pub mod engine;
pub mod config_validation;
pub mod error;
