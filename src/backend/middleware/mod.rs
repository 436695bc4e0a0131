//! Middleware Module
//!
//! Request processing that runs before handlers:
//!
//! - **`auth`** - bearer-token authentication and the `AuthUser` extractor
//! - **`json`** - `ApiJson`, a JSON body extractor with uniform 400s

pub mod auth;
pub mod json;

pub use auth::{authenticate_token, bearer_token, require_auth, AuthUser, AuthenticatedUser};
pub use json::ApiJson;
