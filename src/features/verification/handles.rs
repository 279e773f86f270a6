//! Ownership contracts for the browser resources the handshake holds.
//!
//! Both methods consume the handle so a released resource cannot be used again.

/// A running timer (interval or one-shot).
pub trait TimerHandle {
    fn cancel(self);
}

/// An open broadcast-channel subscription or publisher.
pub trait ChannelHandle {
    fn close(self);
}

/// Timers owned by the waiting screen.
///
/// One-shots use Leptos' handle rather than a `gloo` closure: the completion
/// callback navigates away, which unmounts the screen and cancels the timer
/// from inside its own callback.
#[cfg(target_arch = "wasm32")]
pub enum BrowserTimer {
    Interval(gloo_timers::callback::Interval),
    Timeout(leptos::prelude::TimeoutHandle),
}

#[cfg(target_arch = "wasm32")]
impl TimerHandle for BrowserTimer {
    fn cancel(self) {
        match self {
            BrowserTimer::Interval(interval) => {
                drop(interval.cancel());
            }
            BrowserTimer::Timeout(handle) => handle.clear(),
        }
    }
}
