//! Auth feature module: the `/api/auth` payloads, their client wrappers and
//! local form validation. The verification handshake built on top of these
//! calls lives in `features::verification`. Payloads carry passwords and
//! single-use tokens and must never be logged.

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) mod client;
pub(crate) mod forms;
pub(crate) mod types;
