//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + command line flags
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!
//! responses file (YAML/TOML)
//!     → loader.rs (parse & deserialize)
//!     → ResponsesFile
//!     → routing::RuleSet::compile
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_responses, ConfigError};
pub use schema::{ResponseConfig, ResponsesFile, ServerConfig};
pub use validation::{validate_config, ValidationError};
