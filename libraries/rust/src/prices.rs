use crate::quote::{Interface as QuoteInterface, Quote};
use crate::store::{Error as StoreError, StockRecord, Store};
use futures::join;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::{debug, error, info};

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Listing {
    pub stock: String,
    pub price: Option<f64>,
}

impl Listing {
    fn from_quote(quote: Quote) -> Option<Self> {
        let stock = quote.resolved_symbol()?.to_string();

        Some(Listing {
            stock,
            price: quote.price,
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SingleStock {
    #[serde(flatten)]
    pub listing: Option<Listing>,
    pub likes: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ComparedStock {
    #[serde(flatten)]
    pub listing: Option<Listing>,
    pub rel_likes: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum StockData {
    Single(SingleStock),
    Pair([ComparedStock; 2]),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StockPrices {
    #[serde(rename = "stockData")]
    pub stock_data: StockData,
}

/// Own like count minus the other side's.
pub fn relative_likes(own: &StockRecord, other: &StockRecord) -> i64 {
    own.like_count() as i64 - other.like_count() as i64
}

#[derive(Clone)]
pub struct Checker {
    quotes: Arc<dyn QuoteInterface>,
    store: Store,
}

impl Checker {
    pub fn new(quotes: Arc<dyn QuoteInterface>, store: Store) -> Self {
        Checker { quotes, store }
    }

    /// Never fails: any lookup problem degrades to [`Quote::not_found`].
    pub async fn fetch_quote(&self, symbol: &str) -> Quote {
        if symbol.is_empty() {
            debug!("No symbol given, skipping quote lookup");
            return Quote::not_found();
        }

        match self.quotes.get_quote(symbol).await {
            Ok(quote) => quote,
            Err(err) if err.is_timeout() => {
                error!("Quote lookup timed out for {}", symbol);
                Quote::not_found()
            }
            Err(err) => {
                error!("Quote lookup failed for {}: {}", symbol, err);
                Quote::not_found()
            }
        }
    }

    pub async fn handle_single(
        &self,
        raw_symbol: &str,
        register_like: bool,
        requester_ip: &str,
    ) -> Result<StockPrices, Error> {
        let quote = self.fetch_quote(raw_symbol).await;

        let Some(listing) = Listing::from_quote(quote) else {
            info!("Symbol {:?} unresolved, reporting likes only", raw_symbol);
            return Ok(StockPrices {
                stock_data: StockData::Single(SingleStock {
                    listing: None,
                    likes: usize::from(register_like),
                }),
            });
        };

        let record = self
            .store
            .find_or_create(&listing.stock, register_like, requester_ip)
            .await?;

        Ok(StockPrices {
            stock_data: StockData::Single(SingleStock {
                listing: Some(listing),
                likes: record.like_count(),
            }),
        })
    }

    /// Likes are keyed by the raw inputs, not by the symbols the quote
    /// service resolved them to.
    pub async fn handle_pair(
        &self,
        first_symbol: &str,
        second_symbol: &str,
        register_like: bool,
        requester_ip: &str,
    ) -> Result<StockPrices, Error> {
        let (first_quote, second_quote) = join!(
            self.fetch_quote(first_symbol),
            self.fetch_quote(second_symbol)
        );

        let (first_record, second_record) = join!(
            self.store
                .find_or_create(first_symbol, register_like, requester_ip),
            self.store
                .find_or_create(second_symbol, register_like, requester_ip)
        );
        let (first_record, second_record) = (first_record?, second_record?);

        Ok(StockPrices {
            stock_data: StockData::Pair([
                ComparedStock {
                    listing: Listing::from_quote(first_quote),
                    rel_likes: relative_likes(&first_record, &second_record),
                },
                ComparedStock {
                    listing: Listing::from_quote(second_quote),
                    rel_likes: relative_likes(&second_record, &first_record),
                },
            ]),
        })
    }
}
