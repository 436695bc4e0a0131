//! Appointments
//!
//! Meetings between a client and a staff attorney, optionally tied to a
//! case.
//!
//! ```text
//! appointments/
//! ├── mod.rs       - Module exports
//! ├── schedule.rs  - Timestamp parsing and window rules
//! ├── types.rs     - Rows, request bodies and their validation
//! ├── db.rs        - Queries
//! ├── service.rs   - Booking, confirmation side effects, links
//! └── handlers.rs  - /api/appointments endpoints
//! ```
//!
//! # Status Flow
//!
//! PENDING (client bookings) → CONFIRMED → COMPLETED | CANCELLED |
//! RESCHEDULED. Staff bookings may start at CONFIRMED.

pub mod db;
pub mod handlers;
pub mod schedule;
pub mod service;
pub mod types;

pub use types::AppointmentRecord;
