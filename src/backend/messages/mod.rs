//! Case Messages
//!
//! ```text
//! messages/
//! ├── mod.rs       - Module exports
//! ├── db.rs        - Queries and row types
//! ├── service.rs   - Recipient resolution, persistence and fan-out
//! └── handlers.rs  - HTTP endpoints
//! ```

pub mod db;
pub mod handlers;
pub mod service;

pub use db::MessageRecord;
pub use service::{resolve_recipient, send_case_message};
