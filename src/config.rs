use std::env;
use std::str::FromStr;

use dotenvy::dotenv;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind host (e.g., 0.0.0.0)
    pub app_host: String,
    /// HTTP bind port (e.g., 8080)
    pub app_port: u16,

    /// SQLite connection string (e.g., sqlite://ops-console.db?mode=rwc)
    pub database_url: String,

    /// Directory where uploaded audio/photo files are written.
    /// Files are served from `/uploads/...` by the reverse proxy.
    pub upload_dir: String,

    /// City stored on customers created by the intake form when the form
    /// does not carry one.
    pub default_city: String,

    /// Transcription service base URL. Unset disables transcription; it is
    /// a best-effort side effect either way.
    pub transcribe_base_url: Option<Url>,
    /// Path for the transcription endpoint on that service.
    pub transcribe_path: String,

    /// Base URL to POST new-message notifications to. Unset disables the
    /// notification side effect.
    pub notify_base_url: Option<Url>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid URL for {name}: {value}")]
    InvalidUrl { name: &'static str, value: String },
    #[error("Invalid number for {name}: {value}")]
    InvalidNumber { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env if present
        let _ = dotenv();

        let app_host = env_or_default("APP_HOST", "0.0.0.0");
        let app_port = parse_or_default::<u16>("APP_PORT", 8080)?;

        let database_url = env_or_default("DATABASE_URL", "sqlite://ops-console.db?mode=rwc");
        let upload_dir = env_or_default("UPLOAD_DIR", "public/uploads");
        let default_city = env_or_default("DEFAULT_CITY", "Bouaké");

        let transcribe_base_url = parse_url_optional("TRANSCRIBE_BASE_URL")?;
        let transcribe_path = env_or_default("TRANSCRIBE_PATH", "/transcriptions");

        let notify_base_url = parse_url_optional("NOTIFY_BASE_URL")?;

        Ok(Self {
            app_host,
            app_port,
            database_url,
            upload_dir,
            default_city,
            transcribe_base_url,
            transcribe_path,
            notify_base_url,
        })
    }
}

/* --------------------------- helpers --------------------------- */

fn env_or_default(key: &'static str, default: &'static str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or_default<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(v) => v.parse::<T>().map_err(|_| ConfigError::InvalidNumber {
            name: key,
            value: v,
        }),
        Err(_) => Ok(default),
    }
}

fn parse_url_optional(key: &'static str) -> Result<Option<Url>, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => Url::parse(&raw)
            .map(Some)
            .map_err(|_| ConfigError::InvalidUrl {
                name: key,
                value: raw,
            }),
        _ => Ok(None),
    }
}
