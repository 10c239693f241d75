use serde::{Deserialize, Serialize, Serializer};
use std::env;
use thiserror::Error;

/// Google's published JWK set for Firebase ID token signing keys.
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Sentinel database name meaning "use whatever DATABASE_URL points at".
pub const DEFAULT_DATABASE: &str = "(default)";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Allowed CORS origins; a single `*` means any origin.
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub project: String,
    /// `None` when the configured name is `(default)`.
    pub database: Option<String>,
    #[serde(serialize_with = "serialize_redacted_url")]
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthProvider {
    Firebase,
    NextAuth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub provider: AuthProvider,
    #[serde(skip_serializing)]
    pub nextauth_secret: Option<String>,
    pub firebase_project_id: String,
    pub jwks_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match get("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let project = get("GOOGLE_CLOUD_PROJECT").ok_or(ConfigError::Missing("GOOGLE_CLOUD_PROJECT"))?;

        // Set defaults based on environment, then override with specific env vars
        let mut config = Self::defaults(environment, project);

        if let Some(v) = get("PORT") {
            config.server.port = parse("PORT", &v)?;
        }
        if let Some(v) = get("CORS_ORIGINS") {
            config.server.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(v) = get("STORE_BACKEND") {
            config.store.backend = match v.to_ascii_lowercase().as_str() {
                "postgres" | "postgresql" => StoreBackend::Postgres,
                "memory" | "in-memory" => StoreBackend::Memory,
                _ => return Err(ConfigError::Invalid { key: "STORE_BACKEND", value: v }),
            };
        }
        config.store.database = match get("DOCUMENT_DATABASE") {
            Some(name) if name == DEFAULT_DATABASE => None,
            other => other,
        };
        config.store.database_url = get("DATABASE_URL");
        if let Some(v) = get("DATABASE_MAX_CONNECTIONS") {
            config.store.max_connections = parse("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = get("DATABASE_CONNECTION_TIMEOUT") {
            config.store.connect_timeout_secs = parse("DATABASE_CONNECTION_TIMEOUT", &v)?;
        }
        if config.store.backend == StoreBackend::Postgres && config.store.database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        if let Some(v) = get("AUTH_PROVIDER") {
            config.auth.provider = match v.to_ascii_lowercase().as_str() {
                "firebase" => AuthProvider::Firebase,
                "nextauth" => AuthProvider::NextAuth,
                _ => return Err(ConfigError::Invalid { key: "AUTH_PROVIDER", value: v }),
            };
        }
        config.auth.nextauth_secret = get("NEXTAUTH_SECRET");
        if let Some(v) = get("FIREBASE_PROJECT_ID") {
            config.auth.firebase_project_id = v;
        }
        if let Some(v) = get("FIREBASE_JWKS_URL") {
            config.auth.jwks_url = v;
        }
        if config.auth.provider == AuthProvider::NextAuth && config.auth.nextauth_secret.is_none() {
            return Err(ConfigError::Missing("NEXTAUTH_SECRET"));
        }

        if let Some(v) = get("LOG_FORMAT") {
            config.logging.format = match v.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                _ => return Err(ConfigError::Invalid { key: "LOG_FORMAT", value: v }),
            };
        }

        Ok(config)
    }

    fn defaults(environment: Environment, project: String) -> Self {
        let (max_connections, connect_timeout_secs, format) = match environment {
            Environment::Development => (10, 30, LogFormat::Pretty),
            Environment::Staging => (20, 10, LogFormat::Json),
            Environment::Production => (50, 5, LogFormat::Json),
        };

        Self {
            environment,
            server: ServerConfig {
                port: 8080,
                cors_origins: vec!["*".to_string()],
            },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                project: project.clone(),
                database: None,
                database_url: None,
                max_connections,
                connect_timeout_secs,
            },
            auth: AuthConfig {
                provider: AuthProvider::Firebase,
                nextauth_secret: None,
                firebase_project_id: project,
                jwks_url: FIREBASE_JWKS_URL.to_string(),
            },
            logging: LoggingConfig { format },
        }
    }

    pub fn cors_allows_any(&self) -> bool {
        self.server.cors_origins.iter().any(|o| o == "*")
    }

    /// Log the effective configuration at startup. Secrets are never printed.
    pub fn log_summary(&self) {
        tracing::info!("Environment: {:?}", self.environment);
        tracing::info!("Listening port: {}", self.server.port);
        tracing::info!("CORS origins: {}", self.server.cors_origins.join(","));
        tracing::info!("GOOGLE_CLOUD_PROJECT: {}", self.store.project);
        tracing::info!(
            "Document store: {:?} (database: {})",
            self.store.backend,
            self.store.database.as_deref().unwrap_or(DEFAULT_DATABASE)
        );
        match self.auth.provider {
            AuthProvider::Firebase => tracing::info!(
                "Auth provider: Firebase (project: {})",
                self.auth.firebase_project_id
            ),
            AuthProvider::NextAuth => tracing::info!("Auth provider: NextAuth (shared secret set)"),
        }
    }
}

/// Connection URLs are printed without their password.
fn serialize_redacted_url<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        None => serializer.serialize_none(),
        Some(raw) => match url::Url::parse(raw) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("REDACTED"));
                }
                serializer.serialize_some(url.as_str())
            }
            Err(_) => serializer.serialize_some("<unparseable>"),
        },
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
