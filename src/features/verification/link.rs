//! Controller behind `/verify-email`, the page the emailed link opens.
//!
//! The page may load in the browser that signed up or in a completely different
//! one. It verifies the token exactly once per load, tells a same-browser
//! waiting tab about it when it is not the originating browser, and reconciles
//! local session state only when the verification actually lands.

use super::{
    broadcast::BroadcastMessage,
    machine::{FlowState, Transition, Trigger, VerificationFlow},
    outcome::VerificationOutcome,
    reconciler::SessionReconciler,
    request::{InvalidLink, VerificationRequest},
};
use crate::{
    app_lib::{AppError, storage::SessionStore},
    features::auth::types::{VerifyEmailRequest, VerifyEmailResponse},
};
use tracing::{debug, info};

pub struct LinkVerification {
    request: Result<VerificationRequest, InvalidLink>,
    originating: bool,
    flow: VerificationFlow,
    dispatched: bool,
}

impl LinkVerification {
    /// Parses the link and checks for this browser's pending marker.
    /// Invalid links settle immediately without touching the network.
    pub fn start<S: SessionStore + ?Sized>(query: &str, store: &S) -> Self {
        let request = VerificationRequest::from_query(query);
        let mut flow = VerificationFlow::new();
        let originating = match &request {
            Ok(request) => SessionReconciler::new(store).is_originating(request.email()),
            Err(err) => {
                debug!("verification link rejected: {err}");
                flow.apply(Trigger::Link, VerificationOutcome::invalid(err));
                false
            }
        };

        Self {
            request,
            originating,
            flow,
            dispatched: false,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.request.as_ref().ok().map(VerificationRequest::email)
    }

    /// True when this browser wrote the pending marker for the link's address.
    pub fn originating(&self) -> bool {
        self.originating
    }

    pub fn state(&self) -> &FlowState {
        self.flow.state()
    }

    /// True when the page should move on to sign-in after `transition`: only
    /// the originating browser redirects, and only on the transition into
    /// `Verified`.
    pub fn redirects_after(&self, transition: Transition) -> bool {
        self.originating && transition.applied() && self.flow.is_verified()
    }

    /// Message to publish for a waiting tab, only outside the originating browser.
    pub fn broadcast(&self) -> Option<BroadcastMessage> {
        match (&self.request, self.originating) {
            (Ok(request), false) => Some(BroadcastMessage::verify_email(request)),
            _ => None,
        }
    }

    /// Hands out the verify call once per page load.
    pub fn begin(&mut self) -> Option<VerifyEmailRequest> {
        if self.dispatched || self.flow.state() != &FlowState::Waiting {
            return None;
        }
        let request = self.request.as_ref().ok()?.to_api();
        self.dispatched = true;
        Some(request)
    }

    /// Applies the verify response. Side effects run only on the transition
    /// into `Verified`; replays are ignored.
    pub fn complete<S: SessionStore + ?Sized>(
        &mut self,
        result: Result<VerifyEmailResponse, AppError>,
        store: &S,
    ) -> Result<Transition, AppError> {
        let Some(request) = self.request.as_ref().ok() else {
            return Ok(Transition::Ignored);
        };

        let outcome = VerificationOutcome::from_response(request.email(), result);
        let transition = self.flow.apply(Trigger::Link, outcome.clone());
        if let (Transition::Applied, VerificationOutcome::Success { email, user }) =
            (transition, &outcome)
        {
            info!(originating = self.originating, "email verified from link");
            let reconciler = SessionReconciler::new(store);
            if self.originating {
                reconciler.apply_if_pending(email, user.as_ref())?;
            } else {
                reconciler.apply_verified(email, user.as_ref(), false)?;
            }
        }
        Ok(transition)
    }
}
