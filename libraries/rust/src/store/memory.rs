use super::{Error, Interface, StockRecord};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Process-local repository. The write lock stands in for the unique index
/// and the atomic update a database provides.
#[derive(Default)]
pub struct MemoryRepository {
    records: RwLock<Vec<StockRecord>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        MemoryRepository::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl Interface for MemoryRepository {
    async fn find(&self, symbol: &str) -> Result<Option<StockRecord>, Error> {
        let records = self.records.read().await;

        Ok(records.iter().find(|record| record.matches(symbol)).cloned())
    }

    async fn insert(&self, record: StockRecord) -> Result<StockRecord, Error> {
        let mut records = self.records.write().await;

        if records.iter().any(|existing| existing.symbol == record.symbol) {
            return Err(Error::Conflict(format!(
                "duplicate key symbol: {}",
                record.symbol
            )));
        }

        records.push(record.clone());

        Ok(record)
    }

    async fn save(&self, record: StockRecord) -> Result<StockRecord, Error> {
        let mut records = self.records.write().await;

        let stored = records
            .iter_mut()
            .find(|existing| existing.symbol == record.symbol)
            .ok_or_else(|| Error::NotFound(record.symbol.clone()))?;

        stored.alias_label = record.alias_label;
        stored.merge_likes(&record.likes);

        Ok(stored.clone())
    }
}
