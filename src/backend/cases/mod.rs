//! Cases
//!
//! The central entity: a unit of legal work for one client.
//!
//! ```text
//! cases/
//! ├── mod.rs        - Module exports
//! ├── types.rs      - Rows, request bodies and their validation
//! ├── lifecycle.rs  - Status transition policy
//! ├── db.rs         - Queries and case-number generation
//! └── handlers.rs   - /cases and /cases/admin endpoints
//! ```

pub mod db;
pub mod handlers;
pub mod lifecycle;
pub mod types;

pub use handlers::find_case;
pub use lifecycle::StatusPolicy;
pub use types::{CaseRecord, NewCase};
