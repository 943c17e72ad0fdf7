use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::{error, info};
use std::io;
use vehicle_auctions::config::Config;
use vehicle_auctions::persistence::json_file;
use vehicle_auctions::scheduler::Sweeper;
use vehicle_auctions::web::app::{configure_app, init_app_state};
use vehicle_auctions::Repository;

fn startup_error(e: impl std::fmt::Display) -> io::Error {
    error!("{:<12} --> {}", "Startup", e);
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

pub async fn run_app(config: Config) -> io::Result<()> {
    let repository = match &config.data_file {
        Some(path) => {
            let repository = json_file::load(path).map_err(startup_error)?;
            info!(
                "Replayed {} with {} auctions and {} contact queries",
                path.display(),
                repository.auctions.len(),
                repository.contact_queries.len()
            );
            repository
        }
        None => Repository::default(),
    };
    let app_state = init_app_state(&config, repository).map_err(startup_error)?;
    Sweeper::new(app_state.marketplace.clone(), config.sweep_interval_secs).start();

    info!("Starting server on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(Logger::default())
            .configure(configure_app)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info,actix_web=info")).init();
    let config = Config::from_env().map_err(startup_error)?;
    run_app(config).await
}
