//! Session-aware client for the PropDesk admin API
//!
//! [`ApiClient`] wraps `reqwest` with the authentication flow the dashboard
//! and the CLI share: bearer tokens, proactive and on-demand token refresh,
//! and session persistence through a pluggable [`SessionStore`].

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod auth;
pub mod http;
pub mod listings;
pub mod session;

pub use http::ApiClient;
#[cfg(not(target_arch = "wasm32"))]
pub use session::{write_private_file, FileSessionStore};
pub use session::{MemorySessionStore, SessionManager, SessionStore};
