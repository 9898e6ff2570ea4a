//! Rollcall Protocol - Shared types for the engine and its clients
//!
//! This crate contains:
//! - Real-time message types (`ClientMessage`, `ServerMessage`)
//! - Payload structs carried by those messages
//! - HTTP request/response DTOs
//!
//! # Design Principles
//!
//! 1. **No business logic** - Pure data types and serialization
//! 2. **Stable wire format** - `{"event": "<snake_case>", "data": {<camelCase>}}`
//! 3. **Ids as strings** - clients send whatever they have; the engine validates

pub mod dto;
pub mod messages;
pub mod types;

pub use dto::{
    CreateSessionRequest, HealthResponse, MasterTargetRequest, SessionMasterResponse,
    SessionResponse, SuccessResponse, UpdateSessionRequest,
};
pub use messages::{ClientMessage, ServerMessage};
pub use types::{wire_timestamp, ConnectedUserData, DiceRollRequestData, ProtocolError};
