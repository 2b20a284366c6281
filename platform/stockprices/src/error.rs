use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use stockchecker::prices::Error as PricesError;
use thiserror::Error as ThisError;

/// Request failure. Every variant renders as the same opaque 500 body.
#[derive(ThisError, Debug)]
pub enum Error {
    #[error(transparent)]
    Prices(#[from] PricesError),
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": "Server error" }))
    }
}
