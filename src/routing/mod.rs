//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path)
//!     → router.rs (scan routes in configured order)
//!     → pattern.rs (path shape match)
//!     → rules.rs (method filter)
//!     → Return: Matched, NotFound or MethodNotAllowed response
//!
//! Rule Compilation (at startup):
//!     ResponsesFile
//!     → Compile patterns, methods, statuses, headers
//!     → Reject conflicts, report every error
//!     → Freeze as immutable RuleSet
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - Two-phase match: path shape first, then method
//! - Deterministic: same input always resolves to the same response
//! - First match wins (configured order)

pub mod pattern;
pub mod router;
pub mod rules;

pub use pattern::{PathPattern, PatternError};
pub use router::{Resolution, RuleSet, RuleSetError};
pub use rules::{ResponseDefinition, Route, RuleError, RuleLocation};
