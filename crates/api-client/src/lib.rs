// In crates/api-client/src/lib.rs

use app_config::PriceSourceSettings;
use async_trait::async_trait;
use serde_json::Value;

pub mod error;

// Re-export public types
pub use error::{Error, Result};

/// The universal interface for a price feed.
///
/// A failed fetch is reported by the implementation and surfaces to the caller
/// as `None`; the caller treats it as a skipped sample, never as fatal.
#[async_trait]
pub trait PriceSource {
    /// The name of the source, used in logs.
    fn name(&self) -> &str;

    /// Fetches the current price of the tracked asset.
    async fn fetch_price(&self) -> Option<f64>;
}

/// A client for the CoinGecko `simple/price` endpoint.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    asset: String,
    vs_currency: String,
}

impl ApiClient {
    /// Constructs a new ApiClient from PriceSourceSettings.
    ///
    /// The configured timeout bounds the whole request, so a hung endpoint
    /// shows up as an ordinary request failure.
    pub fn new(settings: &PriceSourceSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(ApiClient {
            http_client,
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            asset: settings.asset.clone(),
            vs_currency: settings.vs_currency.clone(),
        })
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// Fetches the spot price of the configured asset.
    ///
    /// This corresponds to the `GET /simple/price` endpoint.
    pub async fn get_simple_price(&self) -> Result<f64> {
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.base_url, self.asset, self.vs_currency
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ApiError { status: status.as_u16() });
        }

        let body = response.text().await.map_err(Error::RequestFailed)?;
        parse_simple_price(&body, &self.asset, &self.vs_currency)
    }
}

#[async_trait]
impl PriceSource for ApiClient {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch_price(&self) -> Option<f64> {
        match self.get_simple_price().await {
            Ok(price) => Some(price),
            Err(e) => {
                tracing::warn!(asset = %self.asset, error = %e, "Error fetching price.");
                None
            }
        }
    }
}

/// Extracts `body[asset][vs_currency]` from a `simple/price` response.
pub fn parse_simple_price(body: &str, asset: &str, vs_currency: &str) -> Result<f64> {
    let value: Value = serde_json::from_str(body).map_err(Error::DeserializationFailed)?;

    let price = value
        .get(asset)
        .and_then(|quotes| quotes.get(vs_currency))
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::MissingPrice {
            asset: asset.to_string(),
            vs_currency: vs_currency.to_string(),
        })?;

    if !price.is_finite() || price <= 0.0 {
        return Err(Error::InvalidPrice(price));
    }

    Ok(price)
}

// Free function to allow api_client::new usage
pub fn new(settings: &PriceSourceSettings) -> Result<ApiClient> {
    ApiClient::new(settings)
}
