use std::env;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_DB_NAME: &str = "finance_tracker";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub storage: StorageBackend,
    /// Only required for [`StorageBackend::Mongo`].
    pub database_url: Option<String>,
    pub database_name: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
}

fn parse_var<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

impl Settings {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let storage = match get("STORAGE") {
            None => StorageBackend::Mongo,
            Some(value) => parse_var("STORAGE", value)?,
        };

        let database_url = get("DB_URL");
        if storage == StorageBackend::Mongo && database_url.is_none() {
            return Err(ConfigError::Missing("DB_URL"));
        }

        let jwt_secret = get("SECRET_KEY").ok_or(ConfigError::Missing("SECRET_KEY"))?;

        let port = match get("PORT") {
            None => DEFAULT_PORT,
            Some(value) => parse_var("PORT", value)?,
        };

        Ok(Self {
            storage,
            database_url,
            database_name: get("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            jwt_secret,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
