//! Shared Module
//!
//! Types shared by the HTTP handlers and the realtime layer: the closed
//! enumerations stored on users, cases and appointments, the case-number
//! value type, realtime event frames and wire validation errors.
//!
//! Nothing in here touches the database or the network.

/// Closed enumerations with explicit parsing
pub mod enums;

/// Case identifier value type
pub mod case_number;

/// Real-time event frames
pub mod event;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use case_number::CaseNumber;
pub use enums::{AppointmentStatus, AppointmentType, CaseCategory, CaseStatus, Priority, Role};
pub use error::SharedError;
pub use event::{ClientEvent, EventType, RealtimeEvent};
