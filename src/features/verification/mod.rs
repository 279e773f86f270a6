//! Cross-context email verification.
//!
//! A signup in one tab is confirmed by a link that may open anywhere: the same
//! tab, another tab of the same browser, or another device. Three paths can
//! report the result back to the waiting tab:
//!
//! - the link page itself, which verifies the token (`link`);
//! - a same-browser broadcast on `jacs_verification` (`broadcast`);
//! - a fixed-cadence status poll, the only path that crosses devices (`poller`).
//!
//! All of them feed one state machine (`machine`), so the first terminal result
//! wins and side effects (`reconciler`) run once. Browser handles are owned
//! through `handles` and released by `watch` on every exit path.

pub(crate) mod broadcast;
pub(crate) mod handles;
pub(crate) mod link;
pub(crate) mod machine;
pub(crate) mod outcome;
pub(crate) mod poller;
pub(crate) mod reconciler;
pub(crate) mod request;
pub(crate) mod resend;
pub(crate) mod watch;
