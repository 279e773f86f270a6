//! Shared frontend utilities for API access, configuration, errors, logging and
//! browser storage.
//!
//! ## Email verification handshake
//!
//! 1. **Signup:** `POST /api/auth/register` succeeds and the tab writes the
//!    pending-verification markers before showing the waiting screen.
//! 2. **Link:** the emailed link opens `/verify-email?email=..&token=..`, possibly
//!    in another tab or browser, which calls `POST /api/auth/verify-email`.
//! 3. **Reconcile:** the waiting tab learns about the result through the
//!    `jacs_verification` broadcast channel or by polling
//!    `GET /api/auth/check-verification-status`, whichever lands first.
//!
//! Centralizing these helpers keeps network behavior consistent and avoids
//! duplicated logic in routes and features. Callers must avoid logging tokens.

pub(crate) mod api;
#[allow(dead_code, clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub(crate) mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
pub(crate) mod config;
pub(crate) mod errors;
pub(crate) mod logging;
pub(crate) mod storage;

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub(crate) use api::{get_json, post_json_response};
pub(crate) use errors::AppError;
