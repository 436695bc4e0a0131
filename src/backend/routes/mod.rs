//! Route Configuration Module
//!
//! - **`router`** - Router assembly, CORS and tracing layers
//! - **`api_routes`** - Public and protected route tables
//!
//! ```text
//! routes/
//! ├── mod.rs         - Module exports
//! ├── router.rs      - create_router
//! └── api_routes.rs  - Route tables
//! ```

/// Main router creation
pub mod router;

/// Route tables
pub mod api_routes;

pub use router::create_router;
