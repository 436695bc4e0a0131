//! Backend Error Module
//!
//! Error types returned by HTTP handlers and services, and their
//! conversion into HTTP responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - BackendError and its status mapping
//! └── conversion.rs - IntoResponse and library error conversions
//! ```
//!
//! # Transactions
//!
//! Services open an `sqlx::Transaction` for every mutation and return early
//! with `?` on the first failure. An uncommitted transaction rolls back when
//! dropped, so an error response never leaves partial writes behind.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use conversion::{conflict_on_reference, conflict_on_unique, is_unique_violation};
pub use types::BackendError;
