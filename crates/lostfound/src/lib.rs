//! Lost & Found Client Library
//!
//! Client for the campus lost-and-found backend: the streamed agent chat,
//! posts and claims, feedback and public system data. Loosely shaped backend
//! payloads are normalized into typed records on the way in.

pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod feedback;
pub mod page;
pub mod posts;
pub mod status;
pub mod stream;
pub mod system;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::LostFoundClient;
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use lostfound_protocol::StreamEvent;
pub use stream::StreamOutcome;
pub use transport::{ApiRequest, HttpTransport, RequestTransport};
