//! # backoffice-session
//!
//! Browser-resident session layer for the backoffice web client, built on
//! Leptos + WASM. It keeps one authoritative record of who is signed in,
//! persists it across reloads, reconciles it with the identity backend, and
//! gates routes on it.
//!
//! The session core (`identity`, `storage`, `state`, `util::guard`) is plain
//! Rust over small seams, so it runs under native tests; the `csr` feature
//! swaps in the browser's storage, `fetch`, and timers.

pub mod app;
pub mod components;
pub mod config;
pub mod error;
pub mod identity;
pub mod net;
pub mod pages;
pub mod state;
pub mod storage;
pub mod util;

#[cfg(test)]
mod test_support;

/// WASM entry point: install panic and log hooks, then mount the app.
#[cfg(feature = "csr")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Fails only if a logger is already installed, which is fine.
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::mount_to_body(app::App);
}
