//! Controller behind the waiting screen shown after signup.
//!
//! Two independent activities race to observe the verification: the status
//! poll and the broadcast listener. Both report into one [`PendingWatch`],
//! which owns the state machine together with the timer and channel handles.
//! Whichever path settles the flow first wins. The other becomes a no-op and
//! every handle is released on verified, on timeout and on unmount.

use super::{
    broadcast::BroadcastMessage,
    handles::{ChannelHandle, TimerHandle},
    machine::{FlowState, Trigger, VerificationFlow},
    outcome::VerificationOutcome,
    poller::{PollPolicy, PollStep, PollTracker},
    request::same_email,
};
use crate::{
    app_lib::AppError,
    features::auth::types::{
        VerificationStatusResponse, VerifiedUser, VerifyEmailRequest, VerifyEmailResponse,
    },
};
use tracing::{debug, info};

/// What the route has to do after feeding the watch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchEvent {
    Nothing,
    /// Run the reconciler and schedule the completion callback, exactly once.
    Verified {
        email: String,
        user: Option<VerifiedUser>,
    },
    /// Polling gave up; offer a resend.
    TimedOut,
}

pub struct PendingWatch<T: TimerHandle, C: ChannelHandle> {
    email: String,
    flow: VerificationFlow,
    poll: PollTracker,
    interval: Option<T>,
    completion: Option<T>,
    channel: Option<C>,
    broadcast_verify_in_flight: bool,
    mounted: bool,
}

impl<T: TimerHandle, C: ChannelHandle> PendingWatch<T, C> {
    pub fn new(email: impl Into<String>, policy: PollPolicy) -> Self {
        Self {
            email: email.into(),
            flow: VerificationFlow::new(),
            poll: PollTracker::new(policy),
            interval: None,
            completion: None,
            channel: None,
            broadcast_verify_in_flight: false,
            mounted: true,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn state(&self) -> &FlowState {
        self.flow.state()
    }

    #[cfg(test)]
    fn has_interval(&self) -> bool {
        self.interval.is_some()
    }

    #[cfg(test)]
    fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// True when polling should (re)start: mounted, unsettled, no timer yet.
    pub fn wants_interval(&self) -> bool {
        self.mounted
            && !self.flow.is_verified()
            && self.interval.is_none()
            && !self.poll.is_stopped()
    }

    /// Takes ownership of the poll interval. Released at once if it is no longer wanted.
    pub fn attach_interval(&mut self, timer: T) {
        if !self.mounted || self.flow.is_verified() || self.poll.is_stopped() {
            timer.cancel();
            return;
        }
        if let Some(previous) = self.interval.replace(timer) {
            previous.cancel();
        }
    }

    /// Takes ownership of the completion timer scheduled after `Verified`.
    pub fn attach_completion(&mut self, timer: T) {
        if !self.mounted {
            timer.cancel();
            return;
        }
        if let Some(previous) = self.completion.replace(timer) {
            previous.cancel();
        }
    }

    /// Takes ownership of the broadcast subscription.
    pub fn attach_channel(&mut self, channel: C) {
        if !self.mounted || self.flow.is_verified() {
            channel.close();
            return;
        }
        if let Some(previous) = self.channel.replace(channel) {
            previous.close();
        }
    }

    /// Claims a poll on a timer tick. `None` means skip this tick.
    pub fn next_poll(&mut self) -> Option<u32> {
        if !self.mounted || !self.flow.accepts_verification() {
            return None;
        }
        self.poll.next_attempt()
    }

    pub fn on_poll_result(
        &mut self,
        result: Result<VerificationStatusResponse, AppError>,
    ) -> WatchEvent {
        if !self.mounted {
            return WatchEvent::Nothing;
        }

        match self.poll.record(result) {
            PollStep::Verified { user } => {
                let email = user
                    .as_ref()
                    .map_or_else(|| self.email.clone(), |user| user.email.clone());
                self.settle(Trigger::Poll, VerificationOutcome::Success { email, user })
            }
            PollStep::Exhausted => {
                self.release_interval();
                if self.flow.time_out().applied() {
                    info!(attempts = self.poll.attempts(), "verification polling exhausted");
                    WatchEvent::TimedOut
                } else {
                    WatchEvent::Nothing
                }
            }
            PollStep::Continue | PollStep::Ignored => WatchEvent::Nothing,
        }
    }

    /// Returns the request to verify when `message` is for this signup and
    /// nothing has settled the flow yet.
    pub fn on_broadcast(&mut self, message: &BroadcastMessage) -> Option<VerifyEmailRequest> {
        if !self.mounted
            || !self.flow.accepts_verification()
            || self.broadcast_verify_in_flight
        {
            return None;
        }

        let BroadcastMessage::VerifyEmail { email, token } = message;
        if !same_email(email, &self.email) {
            debug!("ignoring verification broadcast for another address");
            return None;
        }

        self.broadcast_verify_in_flight = true;
        Some(VerifyEmailRequest {
            email: email.clone(),
            token: token.clone(),
        })
    }

    /// Result of the verify call started from a broadcast.
    ///
    /// Failures do not move the flow: the link tab may have consumed the token
    /// already, and the poll remains the authority.
    pub fn on_broadcast_verified(
        &mut self,
        result: Result<VerifyEmailResponse, AppError>,
    ) -> WatchEvent {
        self.broadcast_verify_in_flight = false;
        if !self.mounted {
            return WatchEvent::Nothing;
        }

        match VerificationOutcome::from_response(&self.email, result) {
            outcome @ VerificationOutcome::Success { .. } => {
                self.settle(Trigger::Broadcast, outcome)
            }
            VerificationOutcome::Failure { message } | VerificationOutcome::Invalid { message } => {
                info!("broadcast-triggered verification did not succeed: {message}");
                WatchEvent::Nothing
            }
        }
    }

    /// Restarts polling after a resend from `TimedOut`. The caller attaches a
    /// new interval when this returns true.
    pub fn restart(&mut self) -> bool {
        if !self.mounted || !self.flow.restart().applied() {
            return false;
        }
        self.poll.reset();
        true
    }

    /// Releases every handle and discards later results.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.poll.stop();
        self.release_interval();
        self.release_completion();
        self.release_channel();
    }

    fn settle(&mut self, trigger: Trigger, outcome: VerificationOutcome) -> WatchEvent {
        let VerificationOutcome::Success { email, user } = outcome.clone() else {
            return WatchEvent::Nothing;
        };
        if !self.flow.apply(trigger, outcome).applied() {
            return WatchEvent::Nothing;
        }

        info!(?trigger, "email verification observed");
        self.poll.stop();
        self.release_interval();
        self.release_channel();
        WatchEvent::Verified { email, user }
    }

    fn release_interval(&mut self) {
        if let Some(timer) = self.interval.take() {
            timer.cancel();
        }
    }

    fn release_completion(&mut self) {
        if let Some(timer) = self.completion.take() {
            timer.cancel();
        }
    }

    fn release_channel(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PendingWatch, WatchEvent};
    use crate::{
        app_lib::{
            AppError,
            storage::{MemoryStore, SessionStore, keys},
        },
        features::{
            auth::types::{
                LoginResponse, UserId, VerificationStatusResponse, VerifiedUser,
                VerifyEmailResponse,
            },
            verification::{
                broadcast::BroadcastMessage,
                handles::{ChannelHandle, TimerHandle},
                link::LinkVerification,
                machine::FlowState,
                poller::PollPolicy,
                reconciler::SessionReconciler,
            },
        },
    };
    use anyhow::Result;
    use std::{cell::Cell, rc::Rc};

    /// Counts releases so tests can assert nothing leaks.
    #[derive(Clone, Default)]
    struct Ledger {
        opened: Rc<Cell<u32>>,
        released: Rc<Cell<u32>>,
    }

    impl Ledger {
        fn open(&self) -> FakeHandle {
            self.opened.set(self.opened.get() + 1);
            FakeHandle {
                released: Rc::clone(&self.released),
            }
        }

        fn live(&self) -> u32 {
            self.opened.get() - self.released.get()
        }
    }

    struct FakeHandle {
        released: Rc<Cell<u32>>,
    }

    impl TimerHandle for FakeHandle {
        fn cancel(self) {
            self.released.set(self.released.get() + 1);
        }
    }

    impl ChannelHandle for FakeHandle {
        fn close(self) {
            self.released.set(self.released.get() + 1);
        }
    }

    const POLICY: PollPolicy = PollPolicy {
        interval_ms: 3_000,
        max_attempts: 100,
        log_every: 10,
    };

    fn watch(ledger: &Ledger, policy: PollPolicy) -> PendingWatch<FakeHandle, FakeHandle> {
        let mut watch = PendingWatch::new("a@b.com", policy);
        watch.attach_interval(ledger.open());
        watch.attach_channel(ledger.open());
        watch
    }

    fn tenant() -> VerifiedUser {
        VerifiedUser {
            id: UserId::Number(1),
            email: "a@b.com".to_string(),
            role: "tenant".to_string(),
            first_name: None,
            last_name: None,
        }
    }

    fn status(verified: bool) -> Result<VerificationStatusResponse, AppError> {
        Ok(VerificationStatusResponse {
            verified,
            email: Some("a@b.com".to_string()),
            user: verified.then(tenant),
        })
    }

    fn message(email: &str) -> BroadcastMessage {
        BroadcastMessage::VerifyEmail {
            email: email.to_string(),
            token: "abc123".to_string(),
        }
    }

    #[test]
    fn poll_success_releases_handles_and_mutes_late_broadcast() {
        let ledger = Ledger::default();
        let mut watch = watch(&ledger, POLICY);

        assert_eq!(watch.email(), "a@b.com");
        assert_eq!(watch.next_poll(), Some(1));
        let event = watch.on_poll_result(status(true));

        assert_eq!(
            event,
            WatchEvent::Verified {
                email: "a@b.com".to_string(),
                user: Some(tenant())
            }
        );
        assert_eq!(ledger.live(), 0);
        assert!(!watch.has_interval() && !watch.has_channel());

        assert_eq!(watch.on_broadcast(&message("a@b.com")), None);
        assert_eq!(
            watch.on_broadcast_verified(Ok(VerifyEmailResponse {
                message: None,
                user: Some(tenant())
            })),
            WatchEvent::Nothing
        );
        assert_eq!(watch.on_poll_result(status(true)), WatchEvent::Nothing);
        assert_eq!(watch.next_poll(), None);
    }

    #[test]
    fn broadcast_success_wins_before_poll() {
        let ledger = Ledger::default();
        let mut watch = watch(&ledger, POLICY);

        assert_eq!(watch.on_broadcast(&message("other@b.com")), None);
        let request = watch.on_broadcast(&message("A@B.com"));
        assert_eq!(request.as_ref().map(|r| r.token.as_str()), Some("abc123"));
        assert_eq!(watch.on_broadcast(&message("a@b.com")), None, "one verify at a time");

        assert_eq!(watch.next_poll(), Some(1));
        let event = watch.on_broadcast_verified(Ok(VerifyEmailResponse {
            message: Some("Email verified".to_string()),
            user: None,
        }));
        assert!(matches!(event, WatchEvent::Verified { user: None, .. }));
        assert_eq!(ledger.live(), 0);

        assert_eq!(watch.on_poll_result(status(true)), WatchEvent::Nothing);
    }

    #[test]
    fn broadcast_failure_keeps_waiting() {
        let ledger = Ledger::default();
        let mut watch = watch(&ledger, POLICY);

        watch.on_broadcast(&message("a@b.com"));
        let event = watch.on_broadcast_verified(Err(AppError::Http {
            status: 400,
            message: "Token already used".to_string(),
        }));

        assert_eq!(event, WatchEvent::Nothing);
        assert_eq!(watch.state(), &FlowState::Waiting);
        assert_eq!(ledger.live(), 2);
        assert!(watch.on_broadcast(&message("a@b.com")).is_some());
    }

    #[test]
    fn exhaustion_times_out_without_error_and_restart_polls_again() {
        let ledger = Ledger::default();
        let mut watch = watch(&ledger, PollPolicy {
            max_attempts: 2,
            ..POLICY
        });

        watch.next_poll();
        assert_eq!(watch.on_poll_result(status(false)), WatchEvent::Nothing);
        watch.next_poll();
        assert_eq!(watch.on_poll_result(status(false)), WatchEvent::TimedOut);

        assert_eq!(watch.state(), &FlowState::TimedOut);
        assert!(!watch.has_interval());
        assert!(watch.has_channel(), "a late broadcast may still complete the flow");
        assert!(!watch.wants_interval());

        assert!(watch.restart());
        assert!(watch.wants_interval());
        watch.attach_interval(ledger.open());
        assert_eq!(watch.next_poll(), Some(1));
        assert!(!watch.restart(), "already waiting");
    }

    #[test]
    fn unmount_releases_everything_and_discards_late_results() {
        let ledger = Ledger::default();
        let mut watch = watch(&ledger, POLICY);
        watch.attach_completion(ledger.open());
        watch.next_poll();

        watch.unmount();

        assert_eq!(ledger.live(), 0);
        assert!(!watch.wants_interval());
        assert_eq!(watch.on_poll_result(status(true)), WatchEvent::Nothing);
        assert_eq!(watch.on_broadcast(&message("a@b.com")), None);
        assert_eq!(watch.state(), &FlowState::Waiting);

        watch.attach_interval(ledger.open());
        watch.attach_channel(ledger.open());
        assert_eq!(ledger.live(), 0, "handles attached after unmount are released at once");
    }

    #[test]
    fn slow_poll_after_link_tab_sign_in_keeps_the_session() -> Result<()> {
        let ledger = Ledger::default();
        let store = MemoryStore::new();
        let reconciler = SessionReconciler::new(&store);
        reconciler.mark_pending("a@b.com")?;
        let mut watch = watch(&ledger, POLICY);

        let mut link = LinkVerification::start("?email=a%40b.com&token=abc123", &store);
        link.begin();
        link.complete(
            Ok(VerifyEmailResponse {
                message: None,
                user: Some(tenant()),
            }),
            &store,
        )?;
        reconciler.take_verified_email();
        reconciler.store_login(&LoginResponse {
            access_token: "fresh".to_string(),
            refresh_token: Some("r".to_string()),
            user: tenant(),
        })?;
        let signed_in = store.snapshot();

        watch.next_poll();
        let WatchEvent::Verified { email, user } = watch.on_poll_result(status(true)) else {
            anyhow::bail!("poll should observe the verification");
        };
        assert!(!reconciler.apply_if_pending(&email, user.as_ref())?);

        assert_eq!(store.snapshot(), signed_in);
        assert_eq!(store.get(keys::ACCESS_TOKEN), Some("fresh".to_string()));
        assert_eq!(ledger.live(), 0);
        Ok(())
    }

    #[test]
    fn waiting_screen_reconciles_once_per_browser() -> Result<()> {
        let ledger = Ledger::default();
        let store = MemoryStore::new();
        let reconciler = SessionReconciler::new(&store);
        reconciler.mark_pending("a@b.com")?;
        let mut first = watch(&ledger, POLICY);
        let mut second = watch(&ledger, POLICY);

        first.next_poll();
        let WatchEvent::Verified { email, user } = first.on_poll_result(status(true)) else {
            anyhow::bail!("first tab should observe the verification");
        };
        assert!(reconciler.apply_if_pending(&email, user.as_ref())?);
        assert_eq!(store.get(keys::USER_ROLE), Some("tenant".to_string()));
        let after_first = store.snapshot();

        second.next_poll();
        let WatchEvent::Verified { email, user } = second.on_poll_result(status(true)) else {
            anyhow::bail!("second tab should observe the verification");
        };
        assert!(!reconciler.apply_if_pending(&email, user.as_ref())?);
        assert_eq!(store.snapshot(), after_first);
        Ok(())
    }

    #[test]
    fn replacing_a_handle_releases_the_previous_one() {
        let ledger = Ledger::default();
        let mut watch = watch(&ledger, POLICY);

        watch.attach_interval(ledger.open());
        watch.attach_channel(ledger.open());
        assert_eq!(ledger.live(), 2);

        watch.unmount();
        assert_eq!(ledger.live(), 0);
    }
}
