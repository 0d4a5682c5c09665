// src/services/apple.rs
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

const APPLE_JWKS_URL: &str = "https://appleid.apple.com/auth/keys";
const APPLE_ISSUER: &str = "https://appleid.apple.com";

#[derive(Debug, Error)]
pub enum AppleAuthError {
    #[error("Identity token is malformed: {0}")]
    MalformedToken(String),

    #[error("No Apple signing key matches kid {0}")]
    UnknownKeyId(String),

    #[error("Identity token verification failed: {0}")]
    VerificationFailed(String),

    #[error("Failed to fetch Apple signing keys: {0}")]
    KeyFetchFailed(String),
}

/// One RSA key from Apple's published JWK set
#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// Claims we care about from a verified Apple identity token.
/// Apple only includes the email when the user granted access to it.
#[derive(Debug, Clone, Deserialize)]
pub struct AppleIdentity {
    pub sub: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppleService {
    client: Client,
    bundle_id: Option<String>,
}

impl AppleService {
    pub fn new(client: Client, bundle_id: Option<String>) -> Self {
        Self {
            client,
            bundle_id: bundle_id.filter(|b| !b.is_empty()),
        }
    }

    /// Verify a Sign in with Apple identity token against Apple's published
    /// signing keys and return its claims.
    ///
    /// The header is decoded first so an unparseable token is rejected before
    /// any network call. The audience is only enforced when a bundle id is
    /// configured.
    pub async fn verify_identity_token(
        &self,
        identity_token: &str,
    ) -> Result<AppleIdentity, AppleAuthError> {
        let header = decode_header(identity_token)
            .map_err(|e| AppleAuthError::MalformedToken(e.to_string()))?;

        let kid = header
            .kid
            .ok_or_else(|| AppleAuthError::MalformedToken("missing key id".to_string()))?;

        let jwks = self.fetch_signing_keys().await?;

        let jwk = jwks
            .keys
            .iter()
            .find(|key| key.kid == kid)
            .ok_or_else(|| AppleAuthError::UnknownKeyId(kid.clone()))?;

        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| AppleAuthError::VerificationFailed(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[APPLE_ISSUER]);
        if let Some(bundle_id) = &self.bundle_id {
            validation.set_audience(&[bundle_id]);
        }

        let token_data = decode::<AppleIdentity>(identity_token, &decoding_key, &validation)
            .map_err(|e| {
                error!(error = %e, "Apple identity token failed verification");
                AppleAuthError::VerificationFailed(e.to_string())
            })?;

        debug!(kid = %kid, "Apple identity token verified");
        Ok(token_data.claims)
    }

    async fn fetch_signing_keys(&self) -> Result<JwkSet, AppleAuthError> {
        let response = self
            .client
            .get(APPLE_JWKS_URL)
            .send()
            .await
            .map_err(|e| AppleAuthError::KeyFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppleAuthError::KeyFetchFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AppleAuthError::KeyFetchFailed(e.to_string()))
    }
}
