// src/services/email.rs
use serde::{Deserialize, Serialize};

/// Email template data for generating OTP emails
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpEmailData {
    pub fullname: Option<String>,
    pub otp: i64,
}

impl OtpEmailData {
    fn greeting_name(&self) -> &str {
        self.fullname.as_deref().filter(|n| !n.is_empty()).unwrap_or("there")
    }
}

pub fn generate_verification_otp_email(data: &OtpEmailData) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #4F46E5; color: white; padding: 20px; text-align: center; }}
        .content {{ padding: 20px; background-color: #f9f9f9; }}
        .footer {{ padding: 20px; text-align: center; font-size: 12px; color: #666; }}
        .otp-box {{ background-color: #EDE9FE; padding: 20px; border-radius: 8px; margin: 15px 0; text-align: center; font-size: 32px; letter-spacing: 8px; font-weight: bold; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Verify Your Email</h1>
        </div>
        <div class="content">
            <p>Hi {},</p>

            <p>Thanks for signing up! Use the code below to verify your email address:</p>

            <div class="otp-box">{}</div>

            <p>This code expires in 10 minutes. If you did not create an account, you can safely ignore this email.</p>
        </div>
        <div class="footer">
            <p>This is an automated message. Please do not reply directly to this email.</p>
        </div>
    </div>
</body>
</html>"#,
        data.greeting_name(),
        data.otp
    )
}

pub fn generate_password_reset_otp_email(data: &OtpEmailData) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #6B7280; color: white; padding: 20px; text-align: center; }}
        .content {{ padding: 20px; background-color: #f9f9f9; }}
        .footer {{ padding: 20px; text-align: center; font-size: 12px; color: #666; }}
        .otp-box {{ background-color: #F3F4F6; padding: 20px; border-radius: 8px; margin: 15px 0; text-align: center; font-size: 32px; letter-spacing: 8px; font-weight: bold; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Password Reset</h1>
        </div>
        <div class="content">
            <p>Hi {},</p>

            <p>We received a request to reset your password. Use the code below to continue:</p>

            <div class="otp-box">{}</div>

            <p>This code expires in 10 minutes. If you did not request a password reset, you can safely ignore this email.</p>
        </div>
        <div class="footer">
            <p>This is an automated message. Please do not reply directly to this email.</p>
        </div>
    </div>
</body>
</html>"#,
        data.greeting_name(),
        data.otp
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_email_contains_otp_and_name() {
        let data = OtpEmailData {
            fullname: Some("Alice".to_string()),
            otp: 123456,
        };
        let body = generate_verification_otp_email(&data);
        assert!(body.contains("123456"));
        assert!(body.contains("Hi Alice,"));
    }

    #[test]
    fn test_reset_email_falls_back_when_name_missing() {
        let data = OtpEmailData {
            fullname: None,
            otp: 654321,
        };
        let body = generate_password_reset_otp_email(&data);
        assert!(body.contains("654321"));
        assert!(body.contains("Hi there,"));
    }
}
