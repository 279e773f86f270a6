use crate::{
    app_lib::AppError,
    features::{
        auth::types::{VerifiedUser, VerifyEmailResponse},
        verification::request::InvalidLink,
    },
};

/// Result of one attempt to verify an address, whatever path produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The backend accepted the token. `user` is absent when it only sent a message.
    Success {
        email: String,
        user: Option<VerifiedUser>,
    },
    /// Rejected token or transport failure; recoverable through resend.
    Failure { message: String },
    /// The link itself is unusable; no request was made.
    Invalid { message: String },
}

impl VerificationOutcome {
    pub fn from_response(email: &str, result: Result<VerifyEmailResponse, AppError>) -> Self {
        match result {
            Ok(response) => Self::Success {
                email: response
                    .user
                    .as_ref()
                    .map_or_else(|| email.to_string(), |user| user.email.clone()),
                user: response.user,
            },
            Err(err) => Self::Failure {
                message: err.user_message(),
            },
        }
    }

    pub fn invalid(err: &InvalidLink) -> Self {
        Self::Invalid {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VerificationOutcome;
    use crate::{
        app_lib::{AppError, errors::GENERIC_ERROR_MESSAGE},
        features::{
            auth::types::{UserId, VerifiedUser, VerifyEmailResponse},
            verification::request::InvalidLink,
        },
    };

    #[test]
    fn success_prefers_the_user_email() {
        let response = VerifyEmailResponse {
            message: None,
            user: Some(VerifiedUser {
                id: UserId::Number(1),
                email: "a@b.com".to_string(),
                role: "tenant".to_string(),
                first_name: None,
                last_name: None,
            }),
        };
        let outcome = VerificationOutcome::from_response("A@B.com", Ok(response));
        assert!(matches!(
            outcome,
            VerificationOutcome::Success { ref email, user: Some(_) } if email == "a@b.com"
        ));

        let bare = VerifyEmailResponse {
            message: Some("Email verified".to_string()),
            user: None,
        };
        assert_eq!(
            VerificationOutcome::from_response("a@b.com", Ok(bare)),
            VerificationOutcome::Success {
                email: "a@b.com".to_string(),
                user: None
            }
        );
    }

    #[test]
    fn failures_keep_backend_message_and_hide_transport_detail() {
        let rejected = AppError::Http {
            status: 400,
            message: "Token expired".to_string(),
        };
        assert_eq!(
            VerificationOutcome::from_response("a@b.com", Err(rejected)),
            VerificationOutcome::Failure {
                message: "Token expired".to_string()
            }
        );

        let offline = AppError::Network("Unable to reach the server".to_string());
        assert_eq!(
            VerificationOutcome::from_response("a@b.com", Err(offline)),
            VerificationOutcome::Failure {
                message: GENERIC_ERROR_MESSAGE.to_string()
            }
        );
        assert!(matches!(
            VerificationOutcome::invalid(&InvalidLink::MissingToken),
            VerificationOutcome::Invalid { .. }
        ));
    }
}
