//! MyFood Library
//!
//! Nutrient recalculation, period aggregation and analytics caching for
//! meal tracking.

pub mod analytics;
pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
