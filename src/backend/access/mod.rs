//! Access Control
//!
//! The single authorization policy consumed by every handler.
//!
//! - **`policy`** - `authorize(principal, allowed_roles)`, the `Action`
//!   table, `require` and its non-failing twin `permits`
//! - **`ownership`** - per-entity rules (case client, note privacy,
//!   appointment parties, self-protection for user management)
//!
//! A missing or invalid principal is rejected earlier, by the
//! authentication middleware, with 401. Everything here answers 403.

pub mod ownership;
pub mod policy;

pub use ownership::{
    can_access_appointment, can_view_case, can_view_note, ensure_can_access_appointment, ensure_can_view_case,
    ensure_not_self,
};
pub use policy::{authorize, permits, require, Action, STAFF};
