// In crates/api-client/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the API client: {0}")]
    ClientBuildError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("API error: HTTP {status}")]
    ApiError { status: u16 },
    #[error("No {vs_currency} price for {asset} in response")]
    MissingPrice { asset: String, vs_currency: String },
    #[error("Price {0} is not a positive finite number")]
    InvalidPrice(f64),
}

pub type Result<T> = std::result::Result<T, Error>;
