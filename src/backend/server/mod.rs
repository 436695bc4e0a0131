//! Server Module
//!
//! Configuration loading, application state and startup.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs      - Module exports and documentation
//! ├── state.rs    - AppState and FromRef implementations
//! ├── config.rs   - AppConfig and store connection
//! └── init.rs     - Application assembly
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: `AppConfig::from_env`
//! 2. **Store**: SQLite pool opened, migrations applied
//! 3. **Bootstrap**: optional super admin seeded
//! 4. **State Creation**: `AppState` with collaborators chosen from config
//! 5. **Router Creation**: all routes and layers configured

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::{AppConfig, ConfigError};
pub use init::create_app;
pub use state::AppState;
