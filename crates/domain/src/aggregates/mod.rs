//! Aggregate roots - domain objects that own their related data
//!
//! Each aggregate has a unique identity, keeps its fields private and exposes
//! behaviour through methods.

pub mod session;

pub use session::{Session, SessionStatus};
