use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use stockchecker::prices::Checker;
use stockchecker::quote::Client as QuoteClient;
use stockchecker::store::{MemoryRepository, Store};
use stockprices::AppState;

#[allow(dead_code)]
pub struct TestApp {
    pub address: String,
    pub repository: Arc<MemoryRepository>,
}

/// Starts the service on a free local port, quoting from `quote_base_url`.
pub fn spawn_app(quote_base_url: String, trust_proxy: bool) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let repository = Arc::new(MemoryRepository::new());
    let quotes = QuoteClient::new(quote_base_url, Duration::from_millis(500)).unwrap();

    let state = AppState {
        checker: Checker::new(Arc::new(quotes), Store::new(repository.clone())),
        trust_proxy,
    };

    let server = stockprices::run(listener, state).unwrap();
    tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        repository,
    }
}
