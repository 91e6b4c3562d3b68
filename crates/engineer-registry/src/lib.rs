//! Review, scoring, and registration lifecycle for a professional engineering registry.

pub mod auth;
pub mod config;
pub mod error;
pub mod listing;
pub mod locale;
pub mod telemetry;
pub mod uploads;
pub mod workflows;
