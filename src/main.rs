// The host binary is empty; the handshake core builds natively for its unit tests.
#![cfg_attr(all(not(target_arch = "wasm32"), not(test)), allow(dead_code))]

#[cfg(target_arch = "wasm32")]
mod app;
#[path = "lib/mod.rs"]
mod app_lib;
#[cfg(target_arch = "wasm32")]
mod components;
mod features;
#[cfg(target_arch = "wasm32")]
mod routes;

#[cfg(target_arch = "wasm32")]
use crate::app::App;
#[cfg(target_arch = "wasm32")]
use leptos::prelude::mount_to_body;

#[cfg(target_arch = "wasm32")]
pub fn main() {
    let config = app_lib::config::AppConfig::load();
    app_lib::logging::init(config.log_level);
    tracing::info!(
        version = app_lib::built_info::PKG_VERSION,
        commit = app_lib::GIT_COMMIT_HASH,
        api_base_url = %config.api_base_url,
        "starting JACS web client"
    );
    mount_to_body(App);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn main() {}
