//! Fixed-cadence status polling for the waiting screen.
//!
//! The tracker owns the attempt budget and failure accounting; the route owns
//! the actual interval. There is no backoff: the wait is user-scale (someone
//! checking their inbox) and bounded by `max_attempts`.

use crate::{
    app_lib::AppError,
    features::auth::types::{VerificationStatusResponse, VerifiedUser},
};
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval_ms: u32,
    pub max_attempts: u32,
    /// Transport failures are logged only on every `log_every`-th occurrence.
    pub log_every: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollStep {
    /// Keep the interval running.
    Continue,
    Verified { user: Option<VerifiedUser> },
    /// Budget spent without a verification.
    Exhausted,
    /// The tracker was already stopped; the result is stale.
    Ignored,
}

#[derive(Clone, Debug)]
pub struct PollTracker {
    policy: PollPolicy,
    attempts: u32,
    failures: u32,
    in_flight: bool,
    stopped: bool,
}

impl PollTracker {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            failures: 0,
            in_flight: false,
            stopped: false,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Claims the next attempt on a timer tick.
    ///
    /// Returns `None` while the previous request is still out, once the tracker
    /// stopped, or when the budget is spent.
    pub fn next_attempt(&mut self) -> Option<u32> {
        if self.stopped || self.in_flight || self.attempts >= self.policy.max_attempts {
            return None;
        }
        self.attempts += 1;
        self.in_flight = true;
        Some(self.attempts)
    }

    /// Records the answer to the attempt claimed by [`Self::next_attempt`].
    pub fn record(&mut self, result: Result<VerificationStatusResponse, AppError>) -> PollStep {
        if self.stopped {
            return PollStep::Ignored;
        }
        self.in_flight = false;

        match result {
            Ok(status) if status.verified => {
                self.stopped = true;
                debug!(attempt = self.attempts, "verification observed by status poll");
                return PollStep::Verified { user: status.user };
            }
            Ok(_) => {}
            Err(err) => {
                self.failures += 1;
                if failure_is_logged(self.failures, self.policy.log_every) {
                    warn!(
                        attempt = self.attempts,
                        failures = self.failures,
                        "verification status poll failing: {err}"
                    );
                }
            }
        }

        if self.attempts >= self.policy.max_attempts {
            self.stopped = true;
            PollStep::Exhausted
        } else {
            PollStep::Continue
        }
    }

    /// Stops without a result, e.g. on unmount.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.in_flight = false;
    }

    /// Fresh budget after a resend.
    pub fn reset(&mut self) {
        *self = Self::new(self.policy);
    }
}

fn failure_is_logged(failures: u32, log_every: u32) -> bool {
    log_every <= 1 || failures % log_every == 0
}

#[cfg(test)]
mod tests {
    use super::{PollPolicy, PollStep, PollTracker, failure_is_logged};
    use crate::{app_lib::AppError, features::auth::types::VerificationStatusResponse};

    const POLICY: PollPolicy = PollPolicy {
        interval_ms: 3_000,
        max_attempts: 100,
        log_every: 10,
    };

    fn not_verified() -> Result<VerificationStatusResponse, AppError> {
        Ok(VerificationStatusResponse {
            verified: false,
            email: None,
            user: None,
        })
    }

    #[test]
    fn stops_after_the_last_unverified_attempt() {
        let mut tracker = PollTracker::new(POLICY);

        for attempt in 1..100 {
            assert_eq!(tracker.next_attempt(), Some(attempt));
            assert_eq!(tracker.record(not_verified()), PollStep::Continue);
        }
        assert_eq!(tracker.next_attempt(), Some(100));
        assert_eq!(tracker.record(not_verified()), PollStep::Exhausted);

        assert!(tracker.is_stopped());
        assert_eq!(tracker.next_attempt(), None);
        assert_eq!(tracker.record(not_verified()), PollStep::Ignored);
        assert_eq!(tracker.attempts(), 100);
    }

    #[test]
    fn verified_stops_immediately() {
        let mut tracker = PollTracker::new(POLICY);
        tracker.next_attempt();

        let step = tracker.record(Ok(VerificationStatusResponse {
            verified: true,
            email: Some("a@b.com".to_string()),
            user: None,
        }));

        assert_eq!(step, PollStep::Verified { user: None });
        assert_eq!(tracker.next_attempt(), None);
    }

    #[test]
    fn does_not_double_fire_while_a_request_is_out() {
        let mut tracker = PollTracker::new(POLICY);
        assert_eq!(tracker.next_attempt(), Some(1));
        assert_eq!(tracker.next_attempt(), None);
        tracker.record(not_verified());
        assert_eq!(tracker.next_attempt(), Some(2));
    }

    #[test]
    fn transport_errors_are_swallowed_and_counted() {
        let mut tracker = PollTracker::new(PollPolicy {
            max_attempts: 3,
            ..POLICY
        });

        for _ in 0..2 {
            tracker.next_attempt();
            let step = tracker.record(Err(AppError::Network("offline".to_string())));
            assert_eq!(step, PollStep::Continue);
        }
        tracker.next_attempt();
        assert_eq!(
            tracker.record(Err(AppError::Timeout("slow".to_string()))),
            PollStep::Exhausted
        );
        assert_eq!(tracker.failures, 3);
    }

    #[test]
    fn failure_logging_is_sparse() {
        let logged: Vec<u32> = (1..=30).filter(|n| failure_is_logged(*n, 10)).collect();
        assert_eq!(logged, vec![10, 20, 30]);
        assert!(failure_is_logged(1, 0));
    }

    #[test]
    fn reset_and_stop() {
        let mut tracker = PollTracker::new(PollPolicy {
            max_attempts: 1,
            ..POLICY
        });
        tracker.next_attempt();
        assert_eq!(tracker.record(not_verified()), PollStep::Exhausted);

        tracker.reset();
        assert_eq!(tracker.next_attempt(), Some(1));
        tracker.stop();
        assert_eq!(tracker.record(not_verified()), PollStep::Ignored);
    }
}
