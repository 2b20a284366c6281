pub mod config;
pub mod error;
pub mod routes;

use actix_web::dev::Server;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use stockchecker::prices::Checker;
use std::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub checker: Checker,
    pub trust_proxy: bool,
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .service(routes::health::check)
            .service(routes::stock_prices::handler)
            .default_service(web::to(routes::not_found))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
