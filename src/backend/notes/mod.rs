//! Case Notes
//!
//! Staff-authored notes on a case. `is_private` notes never reach a
//! client.

pub mod db;
pub mod handlers;

pub use db::NoteRecord;
