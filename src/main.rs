mod api;
mod config;
mod database;
mod jobs;
mod middleware;
mod models;
mod seeds;
mod services;
mod state;
#[cfg(test)]
mod testing;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Config, StorageKind};
use crate::database::{ListingRepository, MemoryStore, UserRepository};
use crate::services::{auth_service::AuthSettings, geocoding_service, LocalImageStore};
use crate::state::AppState;

const DEFAULT_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

fn startup_error(message: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, message.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;

    log::info!("🚀 Starting Wanderlust Service...");

    let (listings, users): (Arc<dyn ListingRepository>, Arc<dyn UserRepository>) =
        match config.storage {
            StorageKind::Mongo => {
                log::info!("📊 Database: {}", config.database_url);
                let db = Arc::new(
                    database::MongoDB::new(&config.database_url)
                        .await
                        .map_err(|e| startup_error(format!("Failed to connect to MongoDB: {}", e)))?,
                );
                log::info!("✅ MongoDB connected successfully");
                let listings: Arc<dyn ListingRepository> = db.clone();
                let users: Arc<dyn UserRepository> = db;
                (listings, users)
            }
            StorageKind::Memory => {
                log::warn!("⚠️  STORAGE=memory - data is lost on restart");
                let store = Arc::new(MemoryStore::new());
                let listings: Arc<dyn ListingRepository> = store.clone();
                let users: Arc<dyn UserRepository> = store;
                (listings, users)
            }
        };

    let state = AppState {
        listings,
        users,
        geocoder: geocoding_service::from_token(
            config.map_token.as_deref(),
            config.map_api_url.as_deref(),
        ),
        images: Arc::new(LocalImageStore::new(&config.upload_dir)),
        auth: Arc::new(AuthSettings::new(
            config.secret.clone(),
            config.jwt_issuer.clone(),
            config.jwt_audience.clone(),
        )),
    };

    // 🌱 Sample data
    if config.seed_sample_data {
        if let Err(e) = seeds::listings_seed::seed_sample_listings(
            state.listings.as_ref(),
            state.users.as_ref(),
            state.geocoder.as_ref(),
        )
        .await
        {
            log::error!("❌ Failed to seed sample listings: {}", e);
        }
    }

    // 🔧 Maintenance jobs
    if let Some(owner_id) = config.orphan_owner_id.as_deref() {
        if let Err(e) =
            jobs::orphan_repair::repair_orphans(state.listings.as_ref(), state.users.as_ref(), owner_id).await
        {
            log::error!("❌ Orphaned listing repair failed: {}", e);
        }
    }
    if config.geocode_backfill {
        jobs::geocode_backfill::spawn_geocode_backfill(state.clone());
    }

    let (host, port) = config.bind_address();
    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    let state_data = web::Data::new(state);
    let origins = config.cors_origins.clone();

    // Start HTTP server
    HttpServer::new(move || {
        let mut cors = Cors::default();
        if origins.is_empty() {
            for origin in DEFAULT_ORIGINS {
                cors = cors.allowed_origin(origin);
            }
        } else {
            for origin in &origins {
                cors = cors.allowed_origin(origin);
            }
        }
        let cors = cors
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::LOCATION,
            ])
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(state_data.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(middleware::RequestMetrics)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .configure(api::configure)
            .default_service(web::to(api::not_found))
    })
    .bind((host, port))?
    .run()
    .await
}
