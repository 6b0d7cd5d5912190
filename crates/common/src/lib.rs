//! Catalog Common Library
//!
//! Shared code for the catalog services including:
//! - Database models, entity type resolution and the generic repository
//! - Wire models and the generic service layer
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod metrics;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository, SourceKey};
pub use dto::{Content, Source};
pub use errors::{AppError, Result};
pub use services::{ContentService, SourceService, WireModel};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
