//! # Cohort Common Library
//!
//! Shared code for the cohort platform services:
//! - Error and result types
//! - Configuration loading and root folder resolution
//! - Database schema and initialization
//! - Time parsing and human-readable duration formatting

pub mod config;
pub mod db;
pub mod error;
pub mod human_time;
pub mod time;

pub use error::{Error, Result};
