//! Core types, forms and configuration for the PropDesk admin dashboard
//!
//! Shared by the HTTP client, the Leptos dashboard and the operator CLI, so
//! everything here compiles for both native and `wasm32` targets. File and
//! environment based configuration loading and logging bootstrap are native
//! only.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod error;
pub mod forms;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, LoggingConfig, SessionConfig};
pub use error::{Error, Result};
pub use forms::{
    validate_form, EditListingForm, ForgotPasswordForm, LoginForm, OtpForm, RejectForm,
    ResetPasswordForm,
};
pub use types::{
    AdminRole, AdminUser, Listing, ListingAction, ListingId, ListingQuery, ListingStatus,
    ListingUpdate, LoginOutcome, OtpChallenge, Page, PageMeta, Session, TokenResponse,
};

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| Error::Configuration {
        message: format!("failed to initialise logging: {e}"),
    })
}
