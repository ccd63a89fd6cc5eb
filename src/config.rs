use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub minio_endpoint: String,
    pub minio_bucket: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
}

impl AppConfig {
    /// Loads configuration from the environment. JWT_SECRET and DATABASE_URL
    /// are hard requirements; refusing to start without a signing secret is
    /// what keeps us from ever issuing unsigned tokens.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            ttl_hours: std::env::var("JWT_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };
        Ok(Self {
            database_url,
            jwt,
            minio_endpoint: std::env::var("MINIO_ENDPOINT")
                .context("MINIO_ENDPOINT must be set")?,
            minio_bucket: std::env::var("MINIO_BUCKET").context("MINIO_BUCKET must be set")?,
            minio_access_key: std::env::var("MINIO_ACCESS_KEY")
                .context("MINIO_ACCESS_KEY must be set")?,
            minio_secret_key: std::env::var("MINIO_SECRET_KEY")
                .context("MINIO_SECRET_KEY must be set")?,
        })
    }
}
