//! PropDesk admin dashboard
//!
//! Client-side rendered Leptos app for signing in and moderating property
//! listings. All state changes go through [`propdesk_client::ApiClient`];
//! the session is kept in `localStorage` between page loads.

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod app;
pub mod components;
pub mod pages;
pub mod state;
pub mod storage;

pub use app::App;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();

    // tracing forwards to `log` when no subscriber is installed
    _ = console_log::init_with_level(log::Level::Debug);

    log::info!("PropDesk admin starting");
    leptos::mount::mount_to_body(App);
}
