use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info, warn};

use vibecheck_api::config::AppConfig;
use vibecheck_api::db::mongo::create_mongo_client;
use vibecheck_api::db::trip_store::TripStore;
use vibecheck_api::routes;
use vibecheck_api::services::catalog_service::load_catalog;
use vibecheck_api::state::{narrative_from_env, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    env_logger::init_from_env(Env::default().default_filter_or("info"));
    info!("Application starting...");

    let config = AppConfig::from_env();

    let catalog = match load_catalog(&config.venues_path) {
        Ok(venues) => venues,
        Err(e) => {
            error!("Failed to load venue catalog from {}: {}", config.venues_path, e);
            Vec::new()
        }
    };

    let store = match &config.mongo_uri {
        Some(uri) => match create_mongo_client(uri).await {
            Ok(client) => TripStore::mongo(&client),
            Err(e) => {
                warn!("MongoDB unavailable, keeping trips in memory: {}", e);
                TripStore::in_memory()
            }
        },
        None => {
            info!("MONGODB_URI not set, keeping trips in memory");
            TripStore::in_memory()
        }
    };

    let narrative = narrative_from_env(&config);
    let state = web::Data::new(AppState::new(catalog, store, narrative));

    info!("Attempting to bind to {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind((config.host.clone(), config.port))?
    .run()
    .await
}
