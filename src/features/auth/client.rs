//! Client wrappers for the JACS auth endpoints used by signup, login and the
//! email-verification handshake. Route code calls these instead of building
//! URLs so paths and payload shapes stay in one place.

use crate::{
    app_lib::{AppError, get_json, post_json_response},
    features::auth::types::{
        LoginRequest, LoginResponse, MessageResponse, RegisterRequest, RegisterResponse,
        ResendVerificationRequest, VerificationStatusResponse, VerifyEmailRequest,
        VerifyEmailResponse,
    },
};
use url::form_urlencoded;

const REGISTER_PATH: &str = "/api/auth/register";
const LOGIN_PATH: &str = "/api/auth/login";
const VERIFY_EMAIL_PATH: &str = "/api/auth/verify-email";
const RESEND_VERIFICATION_PATH: &str = "/api/auth/resend-verification";
const VERIFICATION_STATUS_PATH: &str = "/api/auth/check-verification-status";

/// Creates an account; the backend sends the verification email on success.
/// Must never log the password.
pub async fn register(request: &RegisterRequest) -> Result<RegisterResponse, AppError> {
    post_json_response(REGISTER_PATH, request).await
}

/// Exchanges credentials for access and refresh tokens.
pub async fn login(request: &LoginRequest) -> Result<LoginResponse, AppError> {
    post_json_response(LOGIN_PATH, request).await
}

/// Consumes a verification token. A second call with the same token gets a
/// stable `400`, not a success.
pub async fn verify_email(request: &VerifyEmailRequest) -> Result<VerifyEmailResponse, AppError> {
    post_json_response(VERIFY_EMAIL_PATH, request).await
}

/// Asks the backend to issue a fresh link. Rate limiting is server-side.
pub async fn resend_verification(
    request: &ResendVerificationRequest,
) -> Result<MessageResponse, AppError> {
    post_json_response(RESEND_VERIFICATION_PATH, request).await
}

/// Polls whether `email` has been verified from any browser.
pub async fn check_verification_status(
    email: &str,
) -> Result<VerificationStatusResponse, AppError> {
    get_json(&verification_status_path(email)).await
}

fn verification_status_path(email: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("email", email)
        .finish();
    format!("{VERIFICATION_STATUS_PATH}?{query}")
}
