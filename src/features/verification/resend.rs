//! Resend control state. The backend rate-limits resends; the client only keeps
//! the control disabled while its own request is in flight.

use super::request::normalize_email;
use crate::{app_lib::AppError, features::auth::types::MessageResponse};

const DEFAULT_SENT_MESSAGE: &str = "If that email exists, a new link is on the way.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResendStatus {
    Idle,
    Pending,
    Sent(String),
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResendGate {
    status: ResendStatus,
}

impl Default for ResendGate {
    fn default() -> Self {
        Self {
            status: ResendStatus::Idle,
        }
    }
}

impl ResendGate {
    pub fn status(&self) -> &ResendStatus {
        &self.status
    }

    pub fn in_flight(&self) -> bool {
        self.status == ResendStatus::Pending
    }

    /// Claims the control. Returns false while a request is already out.
    pub fn begin(&mut self) -> bool {
        if self.in_flight() {
            return false;
        }
        self.status = ResendStatus::Pending;
        true
    }

    /// Settles the in-flight request. Returns true only for the first settle.
    pub fn settle(&mut self, result: &Result<MessageResponse, AppError>) -> bool {
        if !self.in_flight() {
            return false;
        }
        self.status = match result {
            Ok(response) => ResendStatus::Sent(
                response
                    .message
                    .clone()
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_SENT_MESSAGE.to_string()),
            ),
            Err(err) => ResendStatus::Failed(err.user_message()),
        };
        true
    }

    /// Rejects a locally invalid address without claiming the control.
    pub fn reject(&mut self, err: &AppError) {
        if !self.in_flight() {
            self.status = ResendStatus::Failed(err.user_message());
        }
    }
}

/// Validates the address typed into a resend form.
pub fn resend_target(input: &str) -> Result<String, AppError> {
    let email = normalize_email(input);
    if email.is_empty() {
        return Err(AppError::Config(
            "Email is required to resend verification.".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(AppError::Config("Email address looks invalid.".to_string()));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_SENT_MESSAGE, ResendGate, ResendStatus, resend_target};
    use crate::{app_lib::AppError, features::auth::types::MessageResponse};

    #[test]
    fn disabled_while_in_flight_and_released_once() {
        let mut gate = ResendGate::default();
        assert!(!gate.in_flight());

        assert!(gate.begin());
        assert!(gate.in_flight());
        assert!(!gate.begin());

        let sent = Ok(MessageResponse { message: None });
        assert!(gate.settle(&sent));
        assert!(!gate.in_flight());
        assert!(!gate.settle(&sent), "second settle is ignored");
        assert_eq!(
            gate.status(),
            &ResendStatus::Sent(DEFAULT_SENT_MESSAGE.to_string())
        );
    }

    #[test]
    fn failure_re_enables_with_message() {
        let mut gate = ResendGate::default();
        gate.begin();

        assert!(gate.settle(&Err(AppError::Http {
            status: 429,
            message: "Too many requests".to_string(),
        })));

        assert!(!gate.in_flight());
        assert_eq!(
            gate.status(),
            &ResendStatus::Failed("Too many requests".to_string())
        );
        assert!(gate.begin());
    }

    #[test]
    fn resend_target_validates_locally() {
        assert_eq!(resend_target("  A@b.com "), Ok("a@b.com".to_string()));
        assert!(resend_target("   ").is_err());
        assert!(resend_target("nobody").is_err());

        let mut gate = ResendGate::default();
        if let Err(err) = resend_target("nobody") {
            gate.reject(&err);
        }
        assert_eq!(
            gate.status(),
            &ResendStatus::Failed("Email address looks invalid.".to_string())
        );
    }
}
