//! Tests for auth module
//!
//! Covers JWT issue/validate, OTP expiry rules, the per-provider
//! credential view and the request validators.

#[cfg(test)]
mod tests {
    use super::super::handlers::issue_token;
    use super::super::models::{
        AuthProvider, Claims, ProviderState, RegisterRequest, ResetPasswordRequest, User, UserRole,
    };
    use super::super::validators::validate_email_format;
    use crate::common::Validator;
    use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

    fn email_user() -> User {
        User {
            id: "U_TEST01".to_string(),
            email: Some("player@example.com".to_string()),
            password_hash: None,
            fullname: Some("Test Player".to_string()),
            profile_image: None,
            provider: AuthProvider::Email,
            provider_id: None,
            role: UserRole::User,
            otp: Some(482913),
            otp_expires_at: None,
            is_verified: false,
            is_deleted: false,
            date_of_birth: None,
            favorite_card_ids: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_claims_structure() {
        let claims = Claims {
            sub: "U_TEST01".to_string(),
            exp: 1234567890,
        };

        assert_eq!(claims.sub, "U_TEST01");
        assert_eq!(claims.exp, 1234567890);
    }

    #[test]
    fn test_issued_token_round_trips() {
        let secret = "test_secret_key";
        let token = issue_token(secret, "U_TEST01").expect("Failed to issue token");

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .expect("Failed to decode token");

        assert_eq!(decoded.claims.sub, "U_TEST01");
        // Expiry sits in the future
        let now = chrono::Utc::now().timestamp() as usize;
        assert!(decoded.claims.exp > now);
    }

    #[test]
    fn test_jwt_validation_fails_with_wrong_secret() {
        let secret = "test_secret_key";
        let wrong_secret = "wrong_secret_key";

        let claims = Claims {
            sub: "U_TEST01".to_string(),
            exp: 9999999999,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to encode token");

        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(wrong_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        );

        assert!(
            result.is_err(),
            "Token validation should fail with wrong secret"
        );
    }

    #[test]
    fn test_otp_expiry_rules() {
        let now = chrono::Utc::now();
        let mut user = email_user();

        // No expiry recorded means the code is not treated as lapsed
        user.otp_expires_at = None;
        assert!(!user.otp_is_expired(now));

        user.otp_expires_at = Some((now + chrono::Duration::minutes(5)).to_rfc3339());
        assert!(!user.otp_is_expired(now));

        user.otp_expires_at = Some((now - chrono::Duration::minutes(5)).to_rfc3339());
        assert!(user.otp_is_expired(now));

        // An unreadable timestamp counts as lapsed
        user.otp_expires_at = Some("not-a-timestamp".to_string());
        assert!(user.otp_is_expired(now));
    }

    #[test]
    fn test_provider_state_mapping() {
        let user = email_user();
        assert_eq!(
            user.provider_state(),
            ProviderState::Email {
                otp: Some(482913),
                otp_expires_at: None,
                verified: false,
            }
        );

        let mut google = email_user();
        google.provider = AuthProvider::Google;
        google.is_verified = true;
        assert_eq!(google.provider_state(), ProviderState::Google);

        let mut apple = email_user();
        apple.provider = AuthProvider::Apple;
        apple.provider_id = Some("001234.abcdef".to_string());
        assert_eq!(
            apple.provider_state(),
            ProviderState::Apple {
                subject_id: Some("001234.abcdef".to_string()),
            }
        );
    }

    #[test]
    fn test_favorite_ids_parsing() {
        let mut user = email_user();
        assert!(user.favorite_ids().is_empty());

        user.favorite_card_ids = Some(r#"["6910","23094"]"#.to_string());
        assert_eq!(user.favorite_ids(), vec!["6910", "23094"]);

        user.favorite_card_ids = Some("not json".to_string());
        assert!(user.favorite_ids().is_empty());
    }

    #[test]
    fn test_register_validation_rules() {
        let valid = RegisterRequest {
            fullname: "Test Player".to_string(),
            email: "player@example.com".to_string(),
            password: "secret123".to_string(),
        };
        assert!(valid.validate(&valid).is_valid());

        let missing_name = RegisterRequest {
            fullname: "  ".to_string(),
            email: "player@example.com".to_string(),
            password: "secret123".to_string(),
        };
        let result = missing_name.validate(&missing_name);
        assert!(!result.is_valid());
        assert_eq!(result.errors[0].field, "fullname");

        let bad_email = RegisterRequest {
            fullname: "Test Player".to_string(),
            email: "not-an-email".to_string(),
            password: "secret123".to_string(),
        };
        assert!(!bad_email.validate(&bad_email).is_valid());

        let short_password = RegisterRequest {
            fullname: "Test Player".to_string(),
            email: "player@example.com".to_string(),
            password: "abc".to_string(),
        };
        let result = short_password.validate(&short_password);
        assert!(!result.is_valid());
        assert_eq!(
            result.errors[0].message,
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn test_reset_password_validation_requires_match() {
        let mismatched = ResetPasswordRequest {
            email: "player@example.com".to_string(),
            new_password: "secret123".to_string(),
            confirm_new_password: "secret124".to_string(),
        };
        let result = mismatched.validate(&mismatched);
        assert!(!result.is_valid());
        assert_eq!(result.errors[0].message, "Passwords do not match");

        let matched = ResetPasswordRequest {
            email: "player@example.com".to_string(),
            new_password: "secret123".to_string(),
            confirm_new_password: "secret123".to_string(),
        };
        assert!(matched.validate(&matched).is_valid());
    }

    #[test]
    fn test_email_format_shapes() {
        assert!(validate_email_format("player@example.com").is_ok());
        assert!(validate_email_format("  player@example.com  ").is_ok());
        assert!(validate_email_format("no-at-sign.com").is_err());
        assert!(validate_email_format("@example.com").is_err());
        assert!(validate_email_format("player@nodot").is_err());
    }
}
