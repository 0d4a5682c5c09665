// src/services/price_charting.rs
//! PriceCharting API client for card price lookups

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum PriceChartingError {
    #[error("PriceCharting API token not configured")]
    NotConfigured,

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, Clone)]
pub struct PriceChartingService {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl PriceChartingService {
    pub fn new(client: Client, base_url: String, api_token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.filter(|t| !t.is_empty()),
        }
    }

    fn token(&self) -> Result<&str, PriceChartingError> {
        self.api_token
            .as_deref()
            .ok_or(PriceChartingError::NotConfigured)
    }

    fn search_url(&self, query: &str) -> Result<String, PriceChartingError> {
        Ok(format!(
            "{}/api/products?t={}&q={}",
            self.base_url,
            self.token()?,
            urlencoding::encode(query)
        ))
    }

    fn product_url(&self, product_id: &str) -> Result<String, PriceChartingError> {
        Ok(format!(
            "{}/api/product?t={}&id={}",
            self.base_url,
            self.token()?,
            urlencoding::encode(product_id)
        ))
    }

    /// Search the catalog and return its `products` array
    pub async fn search_products(&self, query: &str) -> Result<Value, PriceChartingError> {
        let url = self.search_url(query)?;

        debug!(query = %query, "Searching PriceCharting catalog");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PriceChartingError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "PriceCharting search failed");
            return Err(PriceChartingError::RequestFailed(format!("HTTP {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PriceChartingError::UnexpectedResponse(e.to_string()))?;

        Ok(body.get("products").cloned().unwrap_or_default())
    }

    /// Fetch a single product's detail payload as-is
    pub async fn product_detail(&self, product_id: &str) -> Result<Value, PriceChartingError> {
        let url = self.product_url(product_id)?;

        debug!(product_id = %product_id, "Fetching PriceCharting product detail");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PriceChartingError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, product_id = %product_id, "PriceCharting detail fetch failed");
            return Err(PriceChartingError::RequestFailed(format!("HTTP {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| PriceChartingError::UnexpectedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service(token: Option<&str>) -> PriceChartingService {
        PriceChartingService::new(
            Client::new(),
            "https://www.pricecharting.com/".to_string(),
            token.map(|t| t.to_string()),
        )
    }

    #[test]
    fn test_search_url_encodes_query() {
        let service = test_service(Some("secret"));
        let url = service.search_url("charizard ex #105").unwrap();
        assert_eq!(
            url,
            "https://www.pricecharting.com/api/products?t=secret&q=charizard%20ex%20%23105"
        );
    }

    #[test]
    fn test_product_url_format() {
        let service = test_service(Some("secret"));
        let url = service.product_url("6910").unwrap();
        assert_eq!(
            url,
            "https://www.pricecharting.com/api/product?t=secret&id=6910"
        );
    }

    #[test]
    fn test_missing_token_is_not_configured() {
        let service = test_service(None);
        assert!(matches!(
            service.search_url("pikachu"),
            Err(PriceChartingError::NotConfigured)
        ));
        assert!(matches!(
            service.product_url("1"),
            Err(PriceChartingError::NotConfigured)
        ));
    }

    #[test]
    fn test_blank_token_treated_as_missing() {
        let service = test_service(Some(""));
        assert!(matches!(
            service.search_url("pikachu"),
            Err(PriceChartingError::NotConfigured)
        ));
    }
}
