use super::{Error, Interface, StockRecord};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS stocks (
        symbol TEXT PRIMARY KEY,
        stock TEXT NOT NULL,
        likes TEXT[] NOT NULL DEFAULT '{}'
    )
";

const FIND_QUERY: &str = "
    SELECT symbol, stock, likes
    FROM stocks
    WHERE symbol = $1 OR stock = $1
    ORDER BY symbol
    LIMIT 1
";

const INSERT_QUERY: &str = "
    INSERT INTO stocks (symbol, stock, likes)
    VALUES ($1, $2, $3)
    RETURNING symbol, stock, likes
";

// Appends only the addresses missing from the stored array, each once, in the
// order of their first appearance.
const SAVE_QUERY: &str = "
    UPDATE stocks
    SET stock = $2,
        likes = likes || ARRAY(
            SELECT liker
            FROM (
                SELECT liker, MIN(position) AS position
                FROM unnest($3::TEXT[]) WITH ORDINALITY AS pending(liker, position)
                WHERE liker <> ALL(likes)
                GROUP BY liker
            ) AS missing
            ORDER BY position
        )
    WHERE symbol = $1
    RETURNING symbol, stock, likes
";

impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(database_error) = &error {
            if database_error.is_unique_violation() {
                return Error::Conflict(database_error.message().to_string());
            }
        }

        if matches!(
            error,
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
        ) {
            return Error::Unavailable(error.to_string());
        }

        Error::Database(error.to_string())
    }
}

pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Opens the pool and creates the `stocks` table when missing.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;

        info!("Connected to PostgreSQL stock store");

        Ok(PostgresRepository { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed PostgreSQL stock store");
    }
}

#[async_trait]
impl Interface for PostgresRepository {
    async fn find(&self, symbol: &str) -> Result<Option<StockRecord>, Error> {
        let record = sqlx::query_as::<_, StockRecord>(FIND_QUERY)
            .bind(symbol)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn insert(&self, record: StockRecord) -> Result<StockRecord, Error> {
        let created = sqlx::query_as::<_, StockRecord>(INSERT_QUERY)
            .bind(&record.symbol)
            .bind(&record.alias_label)
            .bind(&record.likes)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn save(&self, record: StockRecord) -> Result<StockRecord, Error> {
        sqlx::query_as::<_, StockRecord>(SAVE_QUERY)
            .bind(&record.symbol)
            .bind(&record.alias_label)
            .bind(&record.likes)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(record.symbol.clone()))
    }
}
