//! Core module - Configuration and analytics

pub mod analytics;
pub mod config;
