//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use tracing::Level;
use url::Url;

use super::error::{GalleryError, GalleryResult};

/// Backend address used when running against a local stack
const DEVELOPMENT_API_URL: &str = "http://localhost:3000";
/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Maximum number of idle connections to maintain per host
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (local backend)
    Development {
        /// Optional override for the request timeout in seconds
        request_timeout_override: Option<u64>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => {
                let request_timeout_override = env::var("REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|val| val.parse::<u64>().ok());

                Self::Development {
                    request_timeout_override,
                }
            }
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Returns the gallery backend base address
    ///
    /// # Panics
    ///
    /// Panics if the `API_URL` environment variable is not set in production/staging
    #[must_use]
    pub fn api_url(&self) -> String {
        match self {
            Self::Production | Self::Staging => {
                env::var("API_URL").expect("API_URL environment variable is not set")
            }
            Self::Development { .. } => {
                env::var("API_URL").unwrap_or_else(|_| DEVELOPMENT_API_URL.to_string())
            }
        }
    }

    /// Request timeout applied by the HTTP transport
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        match self {
            Self::Production | Self::Staging => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            Self::Development {
                request_timeout_override,
            } => Duration::from_secs(
                request_timeout_override.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
        }
    }

    /// Whether logs should be emitted as JSON
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// Log level, from `TRACING_LEVEL` or the environment's default
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development { .. } => Level::DEBUG,
            })
    }

    /// Builds the HTTP client configuration for this environment
    ///
    /// `api_url_override` takes precedence over `API_URL`.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::Config` if the base address is not a valid URL
    pub fn client_config(&self, api_url_override: Option<&str>) -> GalleryResult<ClientConfig> {
        let api_url = api_url_override.map_or_else(|| self.api_url(), str::to_string);
        ClientConfig::new(&api_url, self.request_timeout())
    }
}

/// Settings shared by the backend and storage HTTP clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base address
    pub api_url: Url,
    /// Transport timeout for a single request
    pub request_timeout: Duration,
    /// Idle connection pool size per host
    pub max_idle_per_host: usize,
}

impl ClientConfig {
    /// Validates `api_url` and builds a configuration around it
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::Config` if `api_url` cannot serve as a base address
    pub fn new(api_url: &str, request_timeout: Duration) -> GalleryResult<Self> {
        let parsed = Url::parse(api_url.trim())
            .map_err(|e| GalleryError::Config(format!("Invalid API url {api_url}: {e}")))?;

        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(GalleryError::Config(format!(
                "API url must be an http(s) base address: {api_url}"
            )));
        }

        Ok(Self {
            api_url: parsed,
            request_timeout,
            max_idle_per_host: MAX_IDLE_CONNECTIONS_PER_HOST,
        })
    }
}
