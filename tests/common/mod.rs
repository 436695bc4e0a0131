//! Common test utilities and helpers
//!
//! - **`database`** - Throwaway SQLite store per test
//! - **`auth_helpers`** - `TestApp`, users and bearer headers
//! - **`assertions`** - Assertion macros and response helpers

#![allow(dead_code)]

pub mod assertions;
pub mod auth_helpers;
pub mod database;

pub use assertions::*;
pub use auth_helpers::*;
pub use database::*;
