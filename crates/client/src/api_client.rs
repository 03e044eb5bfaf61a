//! HTTP API client for the inventory backend.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use stockroom_shared::{ApiError, Product, ProductDraft};

/// HTTP client for making authenticated requests to the inventory API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: String::new(),
            access_token: None,
        }
    }

    /// Set the base URL for API requests
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Attach a bearer token to every request
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if self.base_url.is_empty() {
            if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            }
        } else {
            let base = self.base_url.trim_end_matches('/');
            let path = path.trim_start_matches('/');
            format!("{base}/{path}")
        }
    }

    fn authorize(&self, rb: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    /// Send a request and return the raw body of a successful response
    async fn send(&self, rb: RequestBuilder) -> Result<String, ApiError> {
        let resp = self
            .authorize(rb)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let is_success = resp.status().is_success();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;

        if !is_success {
            crate::log_warn!("API request failed with HTTP {}: {}", status, text);
            return Err(ApiError::Http { status, body: text });
        }

        Ok(text)
    }

    fn parse<TRes: DeserializeOwned>(text: &str) -> Result<TRes, ApiError> {
        let text = if text.is_empty() { "null" } else { text };
        serde_json::from_str(text).map_err(|e| ApiError::Deserialize(e.to_string()))
    }

    /// Make a GET request
    pub async fn get_json<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        let url = self.url(path);
        let text = self.send(self.client.get(&url)).await?;
        Self::parse(&text)
    }

    /// Make a POST request with JSON body
    pub async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let url = self.url(path);
        let text = self.send(self.client.post(&url).json(body)).await?;
        Self::parse(&text)
    }

    /// Make a PUT request with JSON body
    pub async fn put_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let url = self.url(path);
        let text = self.send(self.client.put(&url).json(body)).await?;
        Self::parse(&text)
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    // --- Product API methods ---

    /// List every product in the catalog
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get_json("/products/all/").await
    }

    /// Get a single product
    pub async fn get_product(&self, product_id: i64) -> Result<Product, ApiError> {
        self.get_json(&product_path(product_id)).await
    }

    /// Create a product
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
        self.post_json("/products/", draft).await
    }

    /// Replace a product's fields
    pub async fn update_product(
        &self,
        product_id: i64,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        self.put_json(&product_path(product_id), draft).await
    }

    /// Delete a product
    pub async fn delete_product(&self, product_id: i64) -> Result<(), ApiError> {
        self.delete(&product_path(product_id)).await
    }
}

fn product_path(product_id: i64) -> String {
    format!("/products/{product_id}")
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}
