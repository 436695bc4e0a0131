//! Authentication Module
//!
//! User storage, bearer tokens and the authentication endpoints.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── users.rs        - User model and database operations
//! ├── sessions.rs     - JWT signing keys and claims
//! └── handlers/       - HTTP handlers
//!     ├── types.rs    - Request/response types and validation
//!     ├── register.rs - Client self-registration
//!     ├── login.rs    - Credential check and token issue
//!     └── me.rs       - Current user profile
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Register**: email, password, name → CLIENT user created
//! 2. **Login**: email and password → bearer token with role
//! 3. **Me**: bearer token → profile
//!
//! # Security
//!
//! - Passwords are hashed with bcrypt before storage
//! - Tokens are HS256 JWTs, one hour by default
//! - Invalid credentials return 401 without saying which part was wrong

/// User data model and database operations
pub mod users;

/// JWT token generation and validation
pub mod sessions;

/// HTTP handlers for authentication endpoints
pub mod handlers;

pub use handlers::types::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
pub use handlers::{get_me, login, register};
pub use sessions::{Claims, SessionKeys};
pub use users::{User, UserProfile, UserSummary};
