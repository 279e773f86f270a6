//! Verification state machine shared by the link page and the waiting screen.
//!
//! Three paths can settle a verification: the link itself, a broadcast from
//! another tab, and the status poll. They all funnel through
//! [`VerificationFlow::apply`], which decides whether the signal changes state.
//! Only an applied transition into `Verified` may run side effects.

use super::outcome::VerificationOutcome;
use crate::features::auth::types::VerifiedUser;
use tracing::debug;

/// Where a signal came from; used for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Link,
    Broadcast,
    Poll,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowState {
    Waiting,
    Verified {
        email: String,
        user: Option<VerifiedUser>,
    },
    Failed {
        message: String,
    },
    /// The poll budget ran out without seeing a verification.
    TimedOut,
    Invalid {
        message: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored,
}

impl Transition {
    pub fn applied(self) -> bool {
        self == Transition::Applied
    }
}

#[derive(Clone, Debug)]
pub struct VerificationFlow {
    state: FlowState,
}

impl Default for VerificationFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationFlow {
    pub fn new() -> Self {
        Self {
            state: FlowState::Waiting,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.state, FlowState::Verified { .. })
    }

    /// `Verified` and `Invalid` absorb every later signal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            FlowState::Verified { .. } | FlowState::Invalid { .. }
        )
    }

    /// True while a verification signal can still change the state.
    pub fn accepts_verification(&self) -> bool {
        !self.is_terminal()
    }

    /// Feeds one outcome into the machine.
    ///
    /// A success after a failure still applies: the token is single-use, so a
    /// failure on one path usually means another path consumed it.
    pub fn apply(&mut self, trigger: Trigger, outcome: VerificationOutcome) -> Transition {
        if self.is_terminal() {
            return Transition::Ignored;
        }

        let next = match (&self.state, outcome) {
            (_, VerificationOutcome::Success { email, user }) => {
                FlowState::Verified { email, user }
            }
            (FlowState::Failed { .. }, VerificationOutcome::Failure { .. }) => {
                return Transition::Ignored;
            }
            (_, VerificationOutcome::Failure { message }) => FlowState::Failed { message },
            (FlowState::Waiting, VerificationOutcome::Invalid { message }) => {
                FlowState::Invalid { message }
            }
            (_, VerificationOutcome::Invalid { .. }) => return Transition::Ignored,
        };

        debug!(?trigger, "verification flow settled");
        self.state = next;
        Transition::Applied
    }

    /// Moves `Waiting` to `TimedOut` once polling gives up.
    pub fn time_out(&mut self) -> Transition {
        if self.state != FlowState::Waiting {
            return Transition::Ignored;
        }
        self.state = FlowState::TimedOut;
        Transition::Applied
    }

    /// Manual retry after a resend: `Failed` or `TimedOut` go back to `Waiting`.
    pub fn restart(&mut self) -> Transition {
        match self.state {
            FlowState::Failed { .. } | FlowState::TimedOut => {
                self.state = FlowState::Waiting;
                Transition::Applied
            }
            _ => Transition::Ignored,
        }
    }
}
