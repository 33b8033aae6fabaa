//! Configuration module
//!
//! This module provides configuration structures for the API, including
//! database, storage, and authentication settings. Everything is sourced
//! from environment variables (with `.env` support via dotenvy).

use std::env;

use crate::constants::{DOWNLOAD_URL_TTL_SECS, MAX_FILE_SIZE_BYTES, PREVIEW_URL_TTL_SECS};
use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRY_HOURS: i64 = 24;

/// Service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    // Database configuration
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Authentication configuration
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    /// Ordered, comma-separated credential sources ("bearer,cookie").
    pub auth_token_sources: Vec<String>,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Upload limits and URL lifetimes
    pub max_file_size_bytes: usize,
    pub download_url_ttl_secs: u64,
    pub preview_url_ttl_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn inner(&self) -> &ServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.inner().server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().environment
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().jwt_secret
    }

    pub fn jwt_expiry_hours(&self) -> i64 {
        self.inner().jwt_expiry_hours
    }

    pub fn auth_token_sources(&self) -> &[String] {
        &self.inner().auth_token_sources
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.inner().max_file_size_bytes
    }

    pub fn download_url_ttl_secs(&self) -> u64 {
        self.inner().download_url_ttl_secs
    }

    pub fn preview_url_ttl_secs(&self) -> u64 {
        self.inner().preview_url_ttl_secs
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        // Upload cap: MAX_FILE_SIZE_MB can tighten the limit but not exceed
        // the hard 5 MiB ceiling.
        let max_file_size_bytes = env::var("MAX_FILE_SIZE_MB")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .map(|mb| (mb * 1024 * 1024).min(MAX_FILE_SIZE_BYTES))
            .unwrap_or(MAX_FILE_SIZE_BYTES);

        let auth_token_sources: Vec<String> = env::var("AUTH_TOKEN_SOURCES")
            .unwrap_or_else(|_| "bearer,cookie".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let storage_backend =
            env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|s| match s.to_lowercase().as_str() {
                    "s3" => Some(StorageBackend::S3),
                    "local" => Some(StorageBackend::Local),
                    _ => None,
                });

        let config = ServiceConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| JWT_EXPIRY_HOURS.to_string())
                .parse()
                .unwrap_or(JWT_EXPIRY_HOURS),
            auth_token_sources,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            max_file_size_bytes,
            download_url_ttl_secs: env::var("DOWNLOAD_URL_TTL_SECS")
                .unwrap_or_else(|_| DOWNLOAD_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(DOWNLOAD_URL_TTL_SECS),
            preview_url_ttl_secs: env::var("PREVIEW_URL_TTL_SECS")
                .unwrap_or_else(|_| PREVIEW_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(PREVIEW_URL_TTL_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        for source in &self.auth_token_sources {
            if source != "bearer" && source != "cookie" {
                return Err(anyhow::anyhow!(
                    "AUTH_TOKEN_SOURCES contains unknown source '{}' (expected 'bearer' or 'cookie')",
                    source
                ));
            }
        }
        if self.auth_token_sources.is_empty() {
            return Err(anyhow::anyhow!(
                "AUTH_TOKEN_SOURCES must name at least one credential source"
            ));
        }

        // Validate storage backend configuration
        let backend = self.storage_backend.unwrap_or(StorageBackend::S3);
        match backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ServiceConfig {
        ServiceConfig {
            server_port: 4000,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            database_url: "postgresql://localhost/filevault".to_string(),
            db_max_connections: 20,
            db_timeout_seconds: 30,
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            jwt_expiry_hours: 24,
            auth_token_sources: vec!["bearer".to_string(), "cookie".to_string()],
            storage_backend: Some(StorageBackend::Local),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: Some("/tmp/filevault".to_string()),
            local_storage_base_url: Some("http://localhost:4000/files".to_string()),
            max_file_size_bytes: MAX_FILE_SIZE_BYTES,
            download_url_ttl_secs: DOWNLOAD_URL_TTL_SECS,
            preview_url_ttl_secs: PREVIEW_URL_TTL_SECS,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validate_short_jwt_secret() {
        let mut config = base_config();
        config.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_s3_requires_bucket() {
        let mut config = base_config();
        config.storage_backend = Some(StorageBackend::S3);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unknown_token_source() {
        let mut config = base_config();
        config.auth_token_sources = vec!["query".to_string()];
        assert!(config.validate().is_err());
    }
}
