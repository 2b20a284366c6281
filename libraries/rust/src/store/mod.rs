pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryRepository;
#[cfg(feature = "postgres")]
pub use postgres::PostgresRepository;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::{debug, info, warn};

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("Uniqueness conflict: {0}")]
    Conflict(String),
    #[error("Invalid stock symbol")]
    InvalidSymbol,
    #[error("Stock record not found: {0}")]
    NotFound(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Database error: {0}")]
    Database(String),
}

impl Error {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

/// Like state for one ticker.
///
/// `alias_label` is written with the same value as `symbol` and is only kept
/// because lookups match on either field.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct StockRecord {
    pub symbol: String,
    #[serde(rename = "stock")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "stock"))]
    pub alias_label: String,
    pub likes: Vec<String>,
}

impl StockRecord {
    pub fn new(symbol: &str, likes: Vec<String>) -> Self {
        StockRecord {
            symbol: symbol.to_string(),
            alias_label: symbol.to_string(),
            likes,
        }
    }

    pub fn matches(&self, symbol: &str) -> bool {
        self.symbol == symbol || self.alias_label == symbol
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    /// Returns false when the address had already liked this ticker.
    pub fn register_like(&mut self, requester_ip: &str) -> bool {
        if self.likes.iter().any(|ip| ip == requester_ip) {
            return false;
        }
        self.likes.push(requester_ip.to_string());
        true
    }

    /// Appends the likes from `other` that are not present yet.
    pub fn merge_likes(&mut self, other: &[String]) {
        for ip in other {
            self.register_like(ip);
        }
    }
}

/// Persistence collaborator.
///
/// `insert` must fail with [`Error::Conflict`] when a record with the same
/// symbol already exists. `save` merges the record's likes into the stored
/// ones, it never removes a like.
#[automock]
#[async_trait]
pub trait Interface: Send + Sync {
    async fn find(&self, symbol: &str) -> Result<Option<StockRecord>, Error>;
    async fn insert(&self, record: StockRecord) -> Result<StockRecord, Error>;
    async fn save(&self, record: StockRecord) -> Result<StockRecord, Error>;
}

#[derive(Clone)]
pub struct Store {
    repository: Arc<dyn Interface>,
}

impl Store {
    pub fn new(repository: Arc<dyn Interface>) -> Self {
        Store { repository }
    }

    pub async fn find(&self, symbol: &str) -> Result<Option<StockRecord>, Error> {
        self.repository.find(symbol).await
    }

    /// Inserts a fresh record, or returns the one a concurrent caller created first.
    ///
    /// The like of the caller that lost the race is not re-applied.
    pub async fn create_if_absent(
        &self,
        symbol: &str,
        register_like: bool,
        requester_ip: &str,
    ) -> Result<StockRecord, Error> {
        if symbol.is_empty() {
            return Err(Error::InvalidSymbol);
        }

        let likes = if register_like {
            vec![requester_ip.to_string()]
        } else {
            Vec::new()
        };

        match self.repository.insert(StockRecord::new(symbol, likes)).await {
            Ok(created) => {
                info!("Created stock record for {}", symbol);
                Ok(created)
            }
            Err(error) if error.is_conflict() => {
                warn!(
                    "Concurrent creation of {} detected, reading existing record",
                    symbol
                );
                match self.repository.find(symbol).await? {
                    Some(existing) => Ok(existing),
                    None => Err(error),
                }
            }
            Err(error) => Err(error),
        }
    }

    pub async fn register_like_and_save(
        &self,
        mut record: StockRecord,
        requester_ip: &str,
    ) -> Result<StockRecord, Error> {
        if record.register_like(requester_ip) {
            debug!("Registering like for {} from {}", record.symbol, requester_ip);
        }

        self.repository.save(record).await
    }

    /// Empty symbols yield an unsaved, like-less record.
    pub async fn find_or_create(
        &self,
        symbol: &str,
        register_like: bool,
        requester_ip: &str,
    ) -> Result<StockRecord, Error> {
        if symbol.is_empty() {
            return Ok(StockRecord::default());
        }

        match self.find(symbol).await? {
            None => self.create_if_absent(symbol, register_like, requester_ip).await,
            Some(existing) if register_like => {
                self.register_like_and_save(existing, requester_ip).await
            }
            Some(existing) => Ok(existing),
        }
    }
}
