//! Rollcall engine library.
//!
//! Server side of a live tabletop session: HTTP session management, the
//! WebSocket gateway, master authority, mediated dice and narrated actions.
//!
//! ## Structure
//!
//! - `stores/` - In-memory runtime state (presence, pending dice)
//! - `use_cases/` - User story orchestration over ports
//! - `infrastructure/` - Port traits and their adapters (SQLite, HTTP clients)
//! - `api/` - HTTP and WebSocket entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

pub use app::App;
