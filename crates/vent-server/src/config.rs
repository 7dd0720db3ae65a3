use std::env;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Unset runs against the in-memory store.
    pub database_url: Option<String>,
    /// HS256 secret shared with the auth provider that issues bearer tokens.
    pub jwt_secret: String,
    pub db_max_connections: u32,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DB_MAX_CONNECTIONS must be a number")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a port number")?,
        })
    }
}
