use crate::error::Error;
use crate::AppState;
use actix_web::{get, web, HttpRequest, HttpResponse};
use std::net::SocketAddr;
use tracing::error;
use url::form_urlencoded;

/// Query of `/api/stock-prices`. `stock` may be repeated.
#[derive(Debug, Default, PartialEq)]
pub struct StockQuery {
    pub stocks: Vec<String>,
    pub like: bool,
}

impl StockQuery {
    pub fn parse(query: &str) -> Self {
        let mut parsed = StockQuery::default();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "stock" => parsed.stocks.push(value.into_owned()),
                "like" => parsed.like = is_truthy(&value),
                _ => {}
            }
        }

        parsed
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "false" | "0"
    )
}

fn strip_port(address: &str) -> String {
    address
        .parse::<SocketAddr>()
        .map(|socket| socket.ip().to_string())
        .unwrap_or_else(|_| address.to_string())
}

pub fn requester_ip(request: &HttpRequest, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(address) = request.connection_info().realip_remote_addr() {
            return strip_port(address);
        }
    }

    request
        .peer_addr()
        .map(|address| address.ip().to_string())
        .unwrap_or_default()
}

#[get("/api/stock-prices")]
pub async fn handler(
    request: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let query = StockQuery::parse(request.query_string());
    let ip = requester_ip(&request, state.trust_proxy);

    let result = match query.stocks.as_slice() {
        [first, second, ..] => {
            state
                .checker
                .handle_pair(first, second, query.like, &ip)
                .await
        }
        [single] => state.checker.handle_single(single, query.like, &ip).await,
        [] => state.checker.handle_single("", query.like, &ip).await,
    };

    let prices = result.map_err(|err| {
        error!("Error in /api/stock-prices handler: {}", err);
        Error::from(err)
    })?;

    Ok(HttpResponse::Ok().json(prices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use stockchecker::prices::Checker;
    use stockchecker::quote::{Error as QuoteError, MockInterface as MockQuoteInterface, Quote};
    use stockchecker::store::{
        Error as StoreError, MemoryRepository, MockInterface as MockStoreInterface, Store,
    };

    fn quotes() -> MockQuoteInterface {
        let mut quotes = MockQuoteInterface::new();

        quotes.expect_get_quote().returning(|symbol| match symbol {
            "GOOG" | "MSFT" => Ok(Quote {
                symbol: Some(symbol.to_string()),
                price: Some(100.0),
            }),
            _ => Err(QuoteError::Status(404)),
        });

        quotes
    }

    fn state(trust_proxy: bool) -> AppState {
        AppState {
            checker: Checker::new(
                Arc::new(quotes()),
                Store::new(Arc::new(MemoryRepository::new())),
            ),
            trust_proxy,
        }
    }

    fn get(uri: &str, peer: &str) -> actix_web::test::TestRequest {
        test::TestRequest::get()
            .uri(uri)
            .peer_addr(peer.parse().unwrap())
    }

    #[actix_web::test]
    async fn test_parse_query() {
        assert_eq!(
            StockQuery::parse("stock=GOOG&stock=MSFT&like=true"),
            StockQuery {
                stocks: vec!["GOOG".to_string(), "MSFT".to_string()],
                like: true,
            }
        );
        assert_eq!(
            StockQuery::parse("stock=GOOG"),
            StockQuery {
                stocks: vec!["GOOG".to_string()],
                like: false,
            }
        );
        assert!(!StockQuery::parse("stock=GOOG&like=false").like);
        assert!(!StockQuery::parse("stock=GOOG&like=0").like);
        assert!(StockQuery::parse("stock=GOOG&like=on").like);
        assert_eq!(StockQuery::parse("stock=BRK%2EB").stocks, vec!["BRK.B"]);
    }

    #[actix_web::test]
    async fn test_single_stock_likes() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(false)))
                .service(handler),
        )
        .await;

        let body: Value = test::call_and_read_body_json(
            &app,
            get("/api/stock-prices?stock=GOOG&like=true", "1.2.3.4:40000").to_request(),
        )
        .await;
        assert_eq!(
            body,
            json!({"stockData": {"stock": "GOOG", "price": 100.0, "likes": 1}})
        );

        let body: Value = test::call_and_read_body_json(
            &app,
            get("/api/stock-prices?stock=GOOG&like=true", "1.2.3.4:40001").to_request(),
        )
        .await;
        assert_eq!(body["stockData"]["likes"], json!(1));

        let body: Value = test::call_and_read_body_json(
            &app,
            get("/api/stock-prices?stock=GOOG&like=true", "5.6.7.8:40000").to_request(),
        )
        .await;
        assert_eq!(body["stockData"]["likes"], json!(2));
    }

    #[actix_web::test]
    async fn test_unresolved_and_missing_stock() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(false)))
                .service(handler),
        )
        .await;

        let body: Value = test::call_and_read_body_json(
            &app,
            get("/api/stock-prices?stock=NOPE&like=true", "1.2.3.4:40000").to_request(),
        )
        .await;
        assert_eq!(body, json!({"stockData": {"likes": 1}}));

        let body: Value = test::call_and_read_body_json(
            &app,
            get("/api/stock-prices", "1.2.3.4:40000").to_request(),
        )
        .await;
        assert_eq!(body, json!({"stockData": {"likes": 0}}));
    }

    #[actix_web::test]
    async fn test_stock_pair() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(false)))
                .service(handler),
        )
        .await;

        for peer in ["1.1.1.1:1000", "2.2.2.2:1000"] {
            test::call_service(
                &app,
                get("/api/stock-prices?stock=GOOG&like=true", peer).to_request(),
            )
            .await;
        }

        let body: Value = test::call_and_read_body_json(
            &app,
            get("/api/stock-prices?stock=GOOG&stock=MSFT", "3.3.3.3:1000").to_request(),
        )
        .await;

        assert_eq!(
            body,
            json!({"stockData": [
                {"stock": "GOOG", "price": 100.0, "rel_likes": 2},
                {"stock": "MSFT", "price": 100.0, "rel_likes": -2}
            ]})
        );
    }

    #[actix_web::test]
    async fn test_forwarded_address_when_trusted() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(true)))
                .service(handler),
        )
        .await;

        for forwarded in ["9.9.9.9", "8.8.8.8", "9.9.9.9"] {
            test::call_service(
                &app,
                get("/api/stock-prices?stock=MSFT&like=true", "127.0.0.1:5000")
                    .insert_header(("X-Forwarded-For", forwarded))
                    .to_request(),
            )
            .await;
        }

        let body: Value = test::call_and_read_body_json(
            &app,
            get("/api/stock-prices?stock=MSFT", "127.0.0.1:5000").to_request(),
        )
        .await;
        assert_eq!(body["stockData"]["likes"], json!(2));
    }

    #[actix_web::test]
    async fn test_store_failure_is_opaque_server_error() {
        let mut repository = MockStoreInterface::new();
        repository.expect_find().returning(|_| {
            Err(StoreError::Unavailable(
                "connection refused at 10.0.0.5:5432".to_string(),
            ))
        });

        let state = AppState {
            checker: Checker::new(Arc::new(quotes()), Store::new(Arc::new(repository))),
            trust_proxy: false,
        };

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(handler),
        )
        .await;

        let response = test::call_service(
            &app,
            get("/api/stock-prices?stock=GOOG&like=true", "1.2.3.4:40000").to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(response).await;
        assert_eq!(body, json!({"error": "Server error"}));
    }
}
