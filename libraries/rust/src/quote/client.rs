use async_trait::async_trait;
use mockall::automock;
use reqwest::Client as HTTPClient;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error as ThisError;

pub const DEFAULT_BASE_URL: &str = "https://stock-price-checker-proxy.freecodecamp.rocks";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Base URL cannot carry a path: {0}")]
    BaseUrl(String),
    #[error("Quote request failed with status: {0}")]
    Status(u16),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Http(error) if error.is_timeout())
    }
}

/// Price lookup result. Both fields are `None` when the symbol could not be
/// resolved.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Quote {
    pub symbol: Option<String>,
    pub price: Option<f64>,
}

impl Quote {
    pub fn not_found() -> Self {
        Quote::default()
    }

    pub fn resolved_symbol(&self) -> Option<&str> {
        self.symbol.as_deref().filter(|symbol| !symbol.is_empty())
    }
}

#[derive(Deserialize, Debug)]
struct QuoteResponse {
    symbol: Option<String>,
    #[serde(rename = "latestPrice")]
    latest_price: Option<f64>,
}

#[automock]
#[async_trait]
pub trait Interface: Send + Sync {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, Error>;
}

#[derive(Clone)]
pub struct Client {
    base_url: String,
    http_client: HTTPClient,
}

impl Client {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, Error> {
        let http_client = HTTPClient::builder().timeout(timeout).build()?;

        Ok(Client {
            base_url,
            http_client,
        })
    }

    fn quote_url(&self, symbol: &str) -> Result<Url, Error> {
        let mut url = Url::parse(&self.base_url)?;

        url.path_segments_mut()
            .map_err(|_| Error::BaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(&["v1", "stock", symbol, "quote"]);

        Ok(url)
    }
}

#[async_trait]
impl Interface for Client {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, Error> {
        let url = self.quote_url(symbol)?;

        let response = self
            .http_client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Status(response.status().as_u16()));
        }

        let quote_response: QuoteResponse = response.json().await?;

        Ok(Quote {
            symbol: quote_response.symbol,
            price: quote_response.latest_price,
        })
    }
}
