//! Typed client for the Pathfinder REST API.
//!
//! `client` maps each backend endpoint to one async method, `types` holds
//! the server-defined domain model, and `error` is the uniform failure
//! taxonomy shared by every call.

pub mod client;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
