//! casedesk
//!
//! Backend for a legal case desk: clients submit cases and book
//! appointments, staff triage and work them, and both sides talk through
//! case-scoped messages that are pushed live over a WebSocket.
//!
//! - **`shared`** - Enumerations, case numbers, realtime frames and wire
//!   validation errors; no I/O
//! - **`backend`** - HTTP API, persistence, access control and realtime
//!
//! ```rust,no_run
//! use casedesk::backend::server::config::AppConfig;
//! use casedesk::backend::create_app;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (app, _state) = create_app(AppConfig::from_env()?).await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
