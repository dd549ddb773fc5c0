use anyhow::{Context, Result};
use std::env;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:4200",
    "http://localhost:8100",
    "http://localhost:3000",
];

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Postgres connection string; drinks live in memory when unset.
    pub database_url: Option<String>,
    /// Drop and reseed the drink table at startup.
    pub reset_on_start: bool,
    pub cors_allowed_origins: Vec<String>,
}

impl ServiceConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

pub fn load_service_config() -> Result<ServiceConfig> {
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let host: IpAddr = host
        .trim()
        .parse()
        .with_context(|| format!("HOST must be an IP address, got '{host}'"))?;

    let port = match env::var("PORT") {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("PORT must be a port number, got '{value}'"))?,
        Err(_) => 8090,
    };

    let database_url = env::var("DATABASE_URL")
        .ok()
        .and_then(|value| normalize_optional(&value));
    let reset_on_start = bool_from_env("DRINKS_RESET_ON_START").unwrap_or(false);

    let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .map(|value| parse_list(&value))
        .filter(|origins| !origins.is_empty())
        .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect());

    Ok(ServiceConfig {
        host,
        port,
        database_url,
        reset_on_start,
        cors_allowed_origins,
    })
}

fn bool_from_env(key: &str) -> Option<bool> {
    env::var(key).ok().map(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(|c| c == ',' || c == ';' || c == ' ')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
