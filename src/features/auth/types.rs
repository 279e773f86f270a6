//! Request and response types for `/api/auth` calls. These payloads carry
//! passwords and verification tokens, so they must never be logged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Roles a visitor can pick during self-service signup.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignupRole {
    Tenant,
    PropertyManager,
}

impl SignupRole {
    pub fn as_str(self) -> &'static str {
        match self {
            SignupRole::Tenant => "tenant",
            SignupRole::PropertyManager => "property_manager",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "tenant" => Some(SignupRole::Tenant),
            "property_manager" => Some(SignupRole::PropertyManager),
            _ => None,
        }
    }
}

/// Backend user ids are integers today; older rows come back as strings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(value) => write!(formatter, "{value}"),
            UserId::Text(value) => formatter.write_str(value),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
/// User summary returned once an email address is verified.
pub struct VerifiedUser {
    pub id: UserId,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: SignupRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<VerifiedUser>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyEmailResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<VerifiedUser>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
/// Poll answer from `check-verification-status`.
pub struct VerificationStatusResponse {
    pub verified: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user: Option<VerifiedUser>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: VerifiedUser,
}
