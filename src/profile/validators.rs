use super::models::ChangePasswordRequest;
use crate::common::{ValidationResult, Validator};

impl Validator<ChangePasswordRequest> for ChangePasswordRequest {
    fn validate(&self, data: &ChangePasswordRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.old_password.is_empty() {
            result.add_error("oldPassword", "Old password is required");
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

/// An empty name is allowed and clears nothing; a sent name is capped
pub fn validate_fullname(fullname: &str) -> Result<(), String> {
    if fullname.chars().count() > 100 {
        return Err("Full name must be at most 100 characters".to_string());
    }
    Ok(())
}
