//! Local validation for the signup and login forms. Checks here are for early
//! feedback only; the backend validates again.

use super::types::{LoginRequest, RegisterRequest, SignupRole};
use crate::{app_lib::AppError, features::verification::request::normalize_email};

/// Minimum password length enforced by the client.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Raw signup form input, captured without borrowing signals.
#[derive(Clone, Default)]
pub struct SignupInput {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub phone: String,
}

impl SignupInput {
    pub fn validate(&self) -> Result<RegisterRequest, AppError> {
        let email = normalize_email(&self.email);
        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();

        if email.is_empty()
            || first_name.is_empty()
            || last_name.is_empty()
            || self.password.trim().is_empty()
            || self.confirm_password.trim().is_empty()
        {
            return Err(invalid("Name, email and both password fields are required."));
        }
        if !email.contains('@') {
            return Err(invalid("Email address looks invalid."));
        }
        if self.password != self.confirm_password {
            return Err(invalid("Passwords do not match."));
        }
        if self.password.trim().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Config(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters."
            )));
        }
        let role = SignupRole::parse(&self.role)
            .ok_or_else(|| invalid("Choose whether you are a tenant or a property manager."))?;

        let phone = self.phone.trim();
        Ok(RegisterRequest {
            email,
            password: self.password.clone(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role,
            phone: (!phone.is_empty()).then(|| phone.to_string()),
        })
    }
}

pub fn login_request(email: &str, password: &str) -> Result<LoginRequest, AppError> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(invalid("Email and password are required."));
    }
    Ok(LoginRequest {
        email,
        password: password.to_string(),
    })
}

fn invalid(message: &str) -> AppError {
    AppError::Config(message.to_string())
}
