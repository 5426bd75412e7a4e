use std::env;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be a number, got '{value}'")]
    NotANumber { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_register_maxage: i64,
    pub jwt_login_maxage: i64,
    pub port: u16,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source; `init` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = var("JWT_SECRET_KEY").ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;

        let allowed_origins = var("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Config {
            database_url: var("DATABASE_URL"),
            jwt_secret,
            jwt_register_maxage: number(&var, "JWT_REGISTER_MAXAGE", 10080)?,
            jwt_login_maxage: number(&var, "JWT_LOGIN_MAXAGE", 1440)?,
            port: number(&var, "PORT", 5000)?,
            upload_dir: var("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()),
            max_upload_bytes: number(&var, "MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            allowed_origins,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Config {
        Config {
            database_url: None,
            jwt_secret: "test-secret".to_string(),
            jwt_register_maxage: 10080,
            jwt_login_maxage: 1440,
            port: 0,
            upload_dir: std::env::temp_dir()
                .join("fundifix-test-uploads")
                .to_string_lossy()
                .into_owned(),
            max_upload_bytes: 1024 * 1024,
            allowed_origins: vec![],
        }
    }
}

fn number<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::NotANumber { name, value }),
    }
}
