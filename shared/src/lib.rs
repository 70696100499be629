//! Shared types and models for the EasyStock platform
//!
//! This crate contains the domain models and pure business rules shared
//! between the backend and other components of the system. Nothing in here
//! performs IO; everything is unit-testable in isolation.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
