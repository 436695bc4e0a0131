//! Administration
//!
//! ```text
//! admin/
//! ├── mod.rs       - Module exports
//! ├── types.rs     - Request/response bodies
//! └── handlers.rs  - /admin endpoints
//! ```

pub mod handlers;
pub mod types;
