// src/services/aws.rs
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_sesv2::Client as SesClient;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum AWSError {
    #[error("AWS credentials not configured")]
    NotConfigured,

    #[error("S3 operation failed: {0}")]
    S3Error(String),

    #[error("SES operation failed: {0}")]
    SESError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AWSConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub s3_bucket_name: String,
    pub cloudfront_domain: Option<String>,
    pub ses_from_email: String,
    pub ses_region: String,
}

impl AWSConfig {
    /// Read AWS configuration from environment variables.
    /// Returns None when the credentials are absent so the server can still
    /// boot; upload and email endpoints then answer with a service error.
    pub fn from_env() -> Option<Self> {
        let access_key_id = env::var("AWS_ACCESS_KEY_ID").ok()?;
        let secret_access_key = env::var("AWS_SECRET_ACCESS_KEY").ok()?;

        let region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let ses_region = env::var("AWS_SES_REGION").unwrap_or_else(|_| region.clone());

        Some(Self {
            access_key_id,
            secret_access_key,
            region,
            s3_bucket_name: env::var("AWS_S3_BUCKET_NAME").unwrap_or_default(),
            cloudfront_domain: env::var("AWS_CLOUDFRONT_DOMAIN").ok().filter(|d| !d.is_empty()),
            ses_from_email: env::var("AWS_SES_FROM_EMAIL").unwrap_or_default(),
            ses_region,
        })
    }
}

#[derive(Debug)]
pub struct AWSService {
    config: Option<AWSConfig>,
}

impl AWSService {
    pub fn new(config: Option<AWSConfig>) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(AWSConfig::from_env())
    }

    fn config(&self) -> Result<&AWSConfig, AWSError> {
        self.config.as_ref().ok_or(AWSError::NotConfigured)
    }

    /// Initialize S3 client with the configured credentials
    async fn get_s3_client(&self) -> Result<(S3Client, String), AWSError> {
        let config = self.config()?;

        if config.s3_bucket_name.is_empty() {
            return Err(AWSError::InvalidConfig(
                "S3 bucket name not configured".to_string(),
            ));
        }

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "env",
        );

        let region = Region::new(config.region.clone());

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials)
            .load()
            .await;

        let client = S3Client::new(&aws_config);

        Ok((client, config.s3_bucket_name.clone()))
    }

    /// Upload a file to S3 and return its public URL
    pub async fn upload_file(
        &self,
        file_data: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<String, AWSError> {
        let (client, bucket) = self.get_s3_client().await?;

        let body = ByteStream::from(Bytes::from(file_data));

        client
            .put_object()
            .bucket(&bucket)
            .key(file_name)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, key = %file_name, "Failed to upload file to S3");
                AWSError::S3Error(format!("Upload failed: {}", e))
            })?;

        let url = self.file_url(file_name)?;

        info!(key = %file_name, bucket = %bucket, "File uploaded to S3 successfully");
        Ok(url)
    }

    /// Delete a single file from S3
    pub async fn delete_file(&self, key: &str) -> Result<(), AWSError> {
        let (client, bucket) = self.get_s3_client().await?;

        client
            .delete_object()
            .bucket(&bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, key = %key, "Failed to delete S3 object");
                AWSError::S3Error(format!("Delete failed: {}", e))
            })?;

        info!(key = %key, "File deleted from S3 successfully");
        Ok(())
    }

    /// Get the public URL for a stored object (CloudFront when configured)
    pub fn file_url(&self, key: &str) -> Result<String, AWSError> {
        let config = self.config()?;

        if let Some(cloudfront_domain) = &config.cloudfront_domain {
            return Ok(format!("https://{}/{}", cloudfront_domain, key));
        }

        let url = format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            config.s3_bucket_name, config.region, key
        );

        Ok(url)
    }

    /// Map one of our stored URLs back to its S3 key.
    /// Returns None for foreign URLs (external avatars, client-supplied image
    /// links) so callers skip deletion instead of firing at someone else's key.
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        let config = self.config.as_ref()?;

        if let Some(cloudfront_domain) = &config.cloudfront_domain {
            let prefix = format!("https://{}/", cloudfront_domain);
            if let Some(key) = url.strip_prefix(&prefix) {
                return Some(key.to_string());
            }
        }

        let s3_prefix = format!(
            "https://{}.s3.{}.amazonaws.com/",
            config.s3_bucket_name, config.region
        );
        url.strip_prefix(&s3_prefix).map(|key| key.to_string())
    }

    /// Initialize SES client with the configured credentials
    async fn get_ses_client(&self) -> Result<SesClient, AWSError> {
        let config = self.config()?;

        if config.ses_from_email.is_empty() {
            return Err(AWSError::InvalidConfig(
                "SES from email not configured".to_string(),
            ));
        }

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "env",
        );

        let region = Region::new(config.ses_region.clone());

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials)
            .load()
            .await;

        let client = SesClient::new(&aws_config);

        Ok(client)
    }

    /// Send an HTML email via SES
    pub async fn send_email(
        &self,
        to: Vec<String>,
        subject: &str,
        body: &str,
    ) -> Result<(), AWSError> {
        let client = self.get_ses_client().await?;
        let config = self.config()?;

        use aws_sdk_sesv2::types::{Body as SesBody, Content, Destination, EmailContent, Message};

        let destination = Destination::builder()
            .set_to_addresses(Some(to.clone()))
            .build();

        let subject_content = Content::builder()
            .data(subject)
            .charset("UTF-8")
            .build()
            .map_err(|e| AWSError::SESError(format!("Failed to build subject: {}", e)))?;

        let body_content = Content::builder()
            .data(body)
            .charset("UTF-8")
            .build()
            .map_err(|e| AWSError::SESError(format!("Failed to build body: {}", e)))?;

        let ses_body = SesBody::builder().html(body_content).build();

        let message = Message::builder()
            .subject(subject_content)
            .body(ses_body)
            .build();

        let email_content = EmailContent::builder().simple(message).build();

        let result = client
            .send_email()
            .from_email_address(&config.ses_from_email)
            .destination(destination)
            .content(email_content)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send email via SES");
                AWSError::SESError(format!("Send failed: {}", e))
            })?;

        info!(
            message_id = ?result.message_id(),
            "Email sent successfully via SES"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(cloudfront: Option<&str>) -> AWSConfig {
        AWSConfig {
            access_key_id: "test_key".to_string(),
            secret_access_key: "test_secret".to_string(),
            region: "us-east-1".to_string(),
            s3_bucket_name: "my-bucket".to_string(),
            cloudfront_domain: cloudfront.map(|d| d.to_string()),
            ses_from_email: "noreply@example.com".to_string(),
            ses_region: "us-east-1".to_string(),
        }
    }

    #[test]
    fn test_file_url_standard() {
        let service = AWSService::new(Some(test_config(None)));
        let url = service.file_url("cards/card_U_1_ABC.png").unwrap();
        assert_eq!(
            url,
            "https://my-bucket.s3.us-east-1.amazonaws.com/cards/card_U_1_ABC.png"
        );
    }

    #[test]
    fn test_file_url_cloudfront() {
        let service = AWSService::new(Some(test_config(Some("d123456.cloudfront.net"))));
        let url = service.file_url("cards/card_U_1_ABC.png").unwrap();
        assert_eq!(url, "https://d123456.cloudfront.net/cards/card_U_1_ABC.png");
    }

    #[test]
    fn test_file_url_not_configured() {
        let service = AWSService::new(None);
        assert!(matches!(
            service.file_url("anything"),
            Err(AWSError::NotConfigured)
        ));
    }

    #[test]
    fn test_key_from_url_round_trip() {
        let service = AWSService::new(Some(test_config(None)));
        let url = service.file_url("profile-pictures/profile_U_1_XYZ.jpg").unwrap();
        assert_eq!(
            service.key_from_url(&url),
            Some("profile-pictures/profile_U_1_XYZ.jpg".to_string())
        );
    }

    #[test]
    fn test_key_from_url_foreign_url() {
        let service = AWSService::new(Some(test_config(None)));
        assert_eq!(
            service.key_from_url("https://lh3.googleusercontent.com/a/photo.jpg"),
            None
        );
    }

    #[test]
    fn test_key_from_url_cloudfront() {
        let service = AWSService::new(Some(test_config(Some("cdn.example.com"))));
        assert_eq!(
            service.key_from_url("https://cdn.example.com/cards/card_U_1_ABC.png"),
            Some("cards/card_U_1_ABC.png".to_string())
        );
    }
}
