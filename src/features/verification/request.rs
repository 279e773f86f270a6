//! Parsing of the emailed verification link (`/verify-email?email=..&token=..`).

use crate::features::auth::types::VerifyEmailRequest;
use thiserror::Error;
use url::form_urlencoded;

/// Why a link cannot be used. Detected before any network call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvalidLink {
    #[error("Invalid verification link: the email address is missing.")]
    MissingEmail,
    #[error("Invalid verification link: the token is missing.")]
    MissingToken,
    #[error("Invalid verification link: the email address is malformed.")]
    MalformedEmail,
}

/// Email and token captured from the link. Immutable once parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationRequest {
    email: String,
    token: String,
}

impl VerificationRequest {
    /// Parses a query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Result<Self, InvalidLink> {
        let query = query.trim().trim_start_matches('?');
        let mut email = None;
        let mut token = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "email" if email.is_none() => email = non_blank(&value),
                "token" if token.is_none() => token = non_blank(&value),
                _ => {}
            }
        }

        let email = email.ok_or(InvalidLink::MissingEmail)?;
        let token = token.ok_or(InvalidLink::MissingToken)?;
        if !email.contains('@') {
            return Err(InvalidLink::MalformedEmail);
        }

        Ok(Self { email, token })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn to_api(&self) -> VerifyEmailRequest {
        VerifyEmailRequest {
            email: self.email.clone(),
            token: self.token.clone(),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Trims and lowercases an address for comparison and storage.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn same_email(left: &str, right: &str) -> bool {
    let left = normalize_email(left);
    !left.is_empty() && left == normalize_email(right)
}
