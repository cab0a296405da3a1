//! HTTP client for TheCocktailDB public API.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use super::models::{Drink, DrinksResponse, Ingredient, IngredientsResponse};

/// Public v1 endpoint with the shared test key.
pub const DEFAULT_API_BASE_URL: &str = "https://www.thecocktaildb.com/api/json/v1/1/";

#[derive(Debug, Error)]
pub enum CocktailApiError {
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CocktailDB returned HTTP {0}")]
    Status(StatusCode),

    #[error("Failed to decode CocktailDB response: {0}")]
    Decode(String),
}

impl CocktailApiError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status(status) => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

/// Exponential backoff for upstream calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

#[derive(Debug, Clone)]
pub struct CocktailDbClient {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl CocktailDbClient {
    pub fn new(base_url: &str) -> Result<Self, CocktailApiError> {
        // Endpoints are joined relative to the base, which needs a trailing slash
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let http = reqwest::Client::builder()
            .user_agent(concat!("cocktail-chat/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: Url::parse(&normalized)?,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn search_cocktails(&self, name: &str) -> Result<Option<Vec<Drink>>, CocktailApiError> {
        let response: DrinksResponse = self.get_json("search.php", &[("s", name)]).await?;
        Ok(response.drinks)
    }

    pub async fn cocktails_by_first_letter(
        &self,
        letter: char,
    ) -> Result<Option<Vec<Drink>>, CocktailApiError> {
        let letter = letter.to_string();
        let response: DrinksResponse = self.get_json("search.php", &[("f", letter.as_str())]).await?;
        Ok(response.drinks)
    }

    pub async fn search_ingredients(
        &self,
        name: &str,
    ) -> Result<Option<Vec<Ingredient>>, CocktailApiError> {
        let response: IngredientsResponse = self.get_json("search.php", &[("i", name)]).await?;
        Ok(response.ingredients)
    }

    pub async fn random_cocktail(&self) -> Result<Option<Vec<Drink>>, CocktailApiError> {
        let response: DrinksResponse = self.get_json("random.php", &[]).await?;
        Ok(response.drinks)
    }

    pub async fn lookup_cocktail(&self, id: &str) -> Result<Option<Vec<Drink>>, CocktailApiError> {
        let response: DrinksResponse = self.get_json("lookup.php", &[("i", id)]).await?;
        Ok(response.drinks)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CocktailApiError> {
        let url = self.base_url.join(endpoint)?;
        let mut attempt = 1;

        loop {
            match self.get_once(&url, query).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        endpoint,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying CocktailDB request: {}",
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &[(&str, &str)],
    ) -> Result<T, CocktailApiError> {
        tracing::debug!("GET {} {:?}", url, query);
        let response = self.http.get(url.clone()).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CocktailApiError::Status(status));
        }
        let body = response.text().await?;
        // An empty body is how the API answers some misses
        if body.trim().is_empty() {
            return serde_json::from_str("{}").map_err(|e| CocktailApiError::Decode(e.to_string()));
        }
        serde_json::from_str(&body).map_err(|e| CocktailApiError::Decode(e.to_string()))
    }
}
