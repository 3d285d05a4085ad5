//! WebSocket bridge between the backend service and the sync engine.

pub mod client;
pub mod error;

pub use client::BackendClient;
pub use error::BackendError;
