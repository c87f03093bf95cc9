//! Account, registration, and password-management payloads.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Minimum password length accepted by the sign-up and reset forms.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Length of the e-mailed one-time code.
pub const OTP_LENGTH: usize = 6;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Form body of `POST /auth/login` (OAuth2 password flow field names).
#[derive(Debug, Clone, Serialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyResetOtpRequest {
    pub email: String,
    pub otp_code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub email: String,
    #[serde(default)]
    pub otp_sent: bool,
}

/// Issued by login and by OTP verification.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetTokenResponse {
    pub message: String,
    pub reset_token: String,
}

/// Generic `{"message": ...}` acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    /// Development backends echo the reset token here.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}

impl UserInfo {
    /// "First Last", falling back to the username and then the e-mail.
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        self.username
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.email.clone())
    }
}

/// Reply to `GET /user/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub total_dreams: u32,
    pub dreams_with_images: u32,
    pub dreams_with_interpretation: u32,
    #[serde(default)]
    pub oldest_dream_date: Option<String>,
    #[serde(default)]
    pub newest_dream_date: Option<String>,
    /// `"N/A"` on backends that do not track it.
    #[serde(default)]
    pub account_created: Option<String>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check a new password and its confirmation.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), CoreError> {
    if password != confirmation {
        return Err(CoreError::Validation("Passwords do not match".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// One-time codes are exactly [`OTP_LENGTH`] ASCII digits.
pub fn validate_otp(code: &str) -> Result<(), CoreError> {
    let code = code.trim();
    if code.len() == OTP_LENGTH && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Verification code must be {OTP_LENGTH} digits"
        )))
    }
}

/// Minimal shape check; the backend does the real validation.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(CoreError::Validation(format!("invalid e-mail address: {email}"))),
    }
}
