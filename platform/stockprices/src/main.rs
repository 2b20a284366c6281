use std::net::TcpListener;
use std::sync::Arc;

use stockchecker::logger::init_tracing;
use stockchecker::prices::Checker;
use stockchecker::quote::Client as QuoteClient;
use stockchecker::store::{
    Interface as StoreInterface, MemoryRepository, PostgresRepository, Store,
};
use stockprices::config::Config;
use stockprices::{run, AppState};
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;

    let quotes = QuoteClient::new(config.quote_base_url.clone(), config.quote_timeout)?;

    let postgres = match &config.database_url {
        Some(database_url) => Some(Arc::new(
            PostgresRepository::connect(database_url, config.database_max_connections).await?,
        )),
        None => None,
    };

    let repository: Arc<dyn StoreInterface> = match &postgres {
        Some(postgres) => postgres.clone(),
        None => {
            info!("DATABASE_URL not set, keeping stock records in memory");
            Arc::new(MemoryRepository::new())
        }
    };

    let state = AppState {
        checker: Checker::new(Arc::new(quotes), Store::new(repository)),
        trust_proxy: config.trust_proxy,
    };

    let listener = TcpListener::bind((config.host.as_str(), config.port))?;
    info!("Listening on {}", listener.local_addr()?);

    run(listener, state)?.await?;

    if let Some(postgres) = postgres {
        postgres.close().await;
    }

    Ok(())
}
