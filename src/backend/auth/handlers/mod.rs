//! Authentication HTTP Handlers

/// Request/response types
pub mod types;

/// `POST /auth/register`
pub mod register;

/// `POST /auth/login`
pub mod login;

/// `GET /auth/me`
pub mod me;

pub use login::login;
pub use me::get_me;
pub use register::register;
