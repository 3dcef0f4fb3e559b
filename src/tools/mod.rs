//! MyFood Tools module
//!
//! MCP tool implementations for products, meals, weight, calculations and analytics.

pub mod analytics;
pub mod calculations;
pub mod meals;
pub mod products;
pub mod status;
pub mod weight;
