//! Typed runtime configuration assembled from the process environment.

pub mod env;

use secrecy::SecretString;

/// Postgres connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: usize,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            url: env::get_or("DATABASE_URL", "postgres://localhost:5432/codecritic"),
            pool_size: 16,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// LLM provider settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier sent with every completion request.
    pub model: String,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Bearer API key; absent means the provider cannot be constructed.
    pub api_key: Option<SecretString>,
    /// Natural language the suggestions must be written in.
    pub language: String,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            model: env::get_or("LLM_MODEL", "gpt-4"),
            base_url: env::get_or("LLM_BASE_URL", "https://api.openai.com/v1"),
            api_key: env::get("LLM_API_KEY").map(SecretString::from),
            language: env::get_or("LANGUAGE_RESPONSE", "Brazilian Portuguese"),
        }
    }
}

/// Settings for the HTTP surface.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Public URL of this deployment, when known.
    pub application_url: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            application_url: env::get("APPLICATION_URL"),
        }
    }

    /// Allowed CORS origins.
    ///
    /// `APP_ORIGINS` (split on ", ") replaces the whole list when present;
    /// otherwise the application URL alone is allowed.
    pub fn allowed_origins(&self) -> Vec<String> {
        match env::get("APP_ORIGINS") {
            Some(origins) => origins.split(", ").map(str::to_string).collect(),
            None => self
                .application_url
                .as_ref()
                .map(|url| vec![url.clone()])
                .unwrap_or_default(),
        }
    }
}

/// Everything the binary needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig::from_env(),
            llm: LlmConfig::from_env(),
            server: ServerConfig::from_env(),
        }
    }
}
