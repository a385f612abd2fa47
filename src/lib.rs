//! NutriLens Library
//!
//! Nutrient estimation, aggregation, and weekly intake tracking, served over
//! MCP and a small HTTP proxy.

pub mod build_info;
pub mod config;
pub mod db;
pub mod estimator;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod proxy;
pub mod tools;
