//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod cache;
pub mod clock;
pub mod config;
pub mod image_gen;
pub mod narrator;
pub mod ports;
pub mod sqlite;
