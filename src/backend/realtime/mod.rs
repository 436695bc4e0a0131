//! Realtime Module
//!
//! Case-scoped push over WebSockets.
//!
//! - **`broadcast`** - Broadcast groups keyed by case or by user
//! - **`session`** - Per-connection join/leave/send handling
//! - **`socket`** - The `/ws` endpoint and its read/write loop
//!
//! ```text
//! realtime/
//! ├── mod.rs        - Module exports
//! ├── broadcast.rs  - CaseGroups registry
//! ├── session.rs    - CaseSession
//! └── socket.rs     - WebSocket upgrade and connection loop
//! ```
//!
//! # Groups
//!
//! A connection is always in its own user group, which carries personal
//! notifications. It joins case groups on request, provided the user is
//! the case's client or staff. HTTP handlers publish to groups only after
//! their transaction commits.

pub mod broadcast;
pub mod session;
pub mod socket;

pub use broadcast::{CaseGroups, GroupKey};
pub use session::CaseSession;
pub use socket::handle_socket_upgrade;
