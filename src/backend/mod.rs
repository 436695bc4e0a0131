//! Backend Module
//!
//! Server-side code: an Axum HTTP API over SQLite plus a WebSocket
//! channel for case-scoped push.
//!
//! - **`server`** - Configuration, application state, startup
//! - **`routes`** - Route tables and router assembly
//! - **`middleware`** - Bearer authentication and JSON body extraction
//! - **`access`** - Role gates and ownership rules
//! - **`auth`** - Users, password hashing, session tokens
//! - **`cases`** - Case intake, staff management, status lifecycle
//! - **`notes`**, **`messages`**, **`documents`**, **`deadlines`** - Case
//!   sub-resources
//! - **`appointments`** - Booking, confirmation and meeting links
//! - **`admin`** - User administration and system statistics
//! - **`realtime`** - Broadcast groups and the `/ws` endpoint
//! - **`integrations`** - Meeting-link provider and mail notifier
//! - **`error`** - `BackendError` and its HTTP mapping
//!
//! ```text
//! backend/
//! ├── mod.rs
//! ├── server/        ├── cases/         ├── appointments/
//! ├── routes/        ├── notes/         ├── admin/
//! ├── middleware/    ├── messages/      ├── realtime/
//! ├── access/        ├── documents/     ├── integrations/
//! ├── auth/          ├── deadlines/     └── error/
//! ```

pub mod access;
pub mod admin;
pub mod appointments;
pub mod auth;
pub mod cases;
pub mod deadlines;
pub mod documents;
pub mod error;
pub mod integrations;
pub mod messages;
pub mod middleware;
pub mod notes;
pub mod realtime;
pub mod routes;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::BackendError;
pub use server::init::create_app;
