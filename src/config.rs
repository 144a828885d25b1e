use std::env;

use crate::utils::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Mongo,
    Memory,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub storage: StorageKind,
    pub map_token: Option<String>,
    /// Geocoding endpoint override (Mapbox-compatible).
    pub map_api_url: Option<String>,
    pub secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub upload_dir: String,
    pub seed_sample_data: bool,
    pub geocode_backfill: bool,
    pub cors_origins: Vec<String>,
    pub orphan_owner_id: Option<String>,
}

const DEV_SECRET: &str = "thisshouldbeabettersecret";

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let flag = |key: &str| {
            get(key)
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false)
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::InvalidRequest(format!("PORT must be a port number, got '{}'", raw)))?,
            None => 8080,
        };

        let storage = match get("STORAGE").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("mongo") | Some("mongodb") => StorageKind::Mongo,
            Some("memory") => StorageKind::Memory,
            Some(other) => {
                return Err(AppError::InvalidRequest(format!(
                    "STORAGE must be 'mongo' or 'memory', got '{}'",
                    other
                )))
            }
        };

        let secret = get("SECRET").unwrap_or_else(|| {
            log::warn!("⚠️  SECRET not set - using the development signing secret");
            DEV_SECRET.to_string()
        });

        Ok(Config {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "mongodb://127.0.0.1:27017/wanderlust".to_string()),
            storage,
            map_token: get("MAP_TOKEN"),
            map_api_url: get("MAP_API_URL"),
            secret,
            jwt_issuer: get("JWT_ISSUER").unwrap_or_else(|| "wanderlust-service".to_string()),
            jwt_audience: get("JWT_AUDIENCE").unwrap_or_else(|| "wanderlust-web".to_string()),
            upload_dir: get("UPLOAD_DIR").unwrap_or_else(|| "public/uploads".to_string()),
            seed_sample_data: flag("SEED_SAMPLE_DATA"),
            geocode_backfill: flag("GEOCODE_BACKFILL"),
            cors_origins: get("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            orphan_owner_id: get("ORPHAN_OWNER_ID"),
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
