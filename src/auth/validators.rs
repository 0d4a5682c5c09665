use super::models::{RegisterRequest, ResetPasswordRequest};
use crate::common::{ValidationResult, Validator};

impl Validator<RegisterRequest> for RegisterRequest {
    fn validate(&self, data: &RegisterRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.fullname.trim().is_empty() {
            result.add_error("fullname", "Full name is required");
        }

        if data.email.trim().is_empty() {
            result.add_error("email", "Email is required");
        } else if validate_email_format(&data.email).is_err() {
            result.add_error("email", "Email must be a valid email address");
        }

        if data.password.is_empty() {
            result.add_error("password", "Password is required");
        } else if data.password.len() < 6 {
            result.add_error("password", "Password must be at least 6 characters");
        }

        result
    }
}

impl Validator<ResetPasswordRequest> for ResetPasswordRequest {
    fn validate(&self, data: &ResetPasswordRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.email.trim().is_empty() {
            result.add_error("email", "Email is required");
        }

        if data.new_password.is_empty() {
            result.add_error("newPassword", "New password is required");
        } else if data.new_password.len() < 6 {
            result.add_error("newPassword", "Password must be at least 6 characters");
        }

        if data.new_password != data.confirm_new_password {
            result.add_error("confirmNewPassword", "Passwords do not match");
        }

        result
    }
}

/// Validates email shape without pulling in a full RFC parser
pub fn validate_email_format(email: &str) -> Result<(), String> {
    let trimmed = email.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err("Email must contain an @ sign".to_string());
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err("Email must be a valid address".to_string());
    }
    Ok(())
}
