//! API configuration: LLM credentials, storage backend selection, quality
//! defaults, cache tier sizing, and HTTP bind address. Loaded once at process
//! start from environment variables with sensible defaults for development.

use std::time::Duration;

/// Top-level configuration for the Cardforge API process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Required: API key for the configured LLM provider.
    pub llm_api_key: String,

    /// `provider:model` identifier, e.g. `openai:gpt-4o-mini`.
    pub llm_model_id: String,

    /// Path to a catalog snapshot used to seed the in-memory catalog store
    /// when no database is configured.
    pub catalog_path: Option<String>,

    /// Path to a persisted vector index snapshot.
    pub vector_store_path: Option<String>,

    /// Default quality threshold passed to the orchestrator.
    pub quality_threshold: f32,

    /// Default max refinement iterations passed to the orchestrator.
    pub max_iterations: u32,

    pub cache_l1_size: usize,
    pub cache_l2_size: usize,
    pub cache_l3_size: usize,
    pub cache_promotion_threshold: u32,

    pub host: String,
    pub port: u16,

    /// Full Postgres connection string. When absent, discrete `db_*` fields
    /// are tried; when all are absent, the API falls back to in-memory
    /// catalog/deck stores.
    pub database_url: Option<String>,
    pub db_host: Option<String>,
    pub db_port: Option<u16>,
    pub db_name: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,

    pub cors_origins: Vec<String>,
    pub cors_allow_credentials: bool,
    pub cors_max_age_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_model_id: "openai:gpt-4o-mini".to_string(),
            catalog_path: None,
            vector_store_path: None,
            quality_threshold: 0.7,
            max_iterations: 5,
            cache_l1_size: 200,
            cache_l2_size: 1000,
            cache_l3_size: 10_000,
            cache_promotion_threshold: 5,
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: None,
            db_host: None,
            db_port: None,
            db_name: None,
            db_user: None,
            db_password: None,
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables. `LLM_API_KEY` is the
    /// only field with no usable default; callers should fail fast if it's
    /// empty.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or_default(),
            llm_model_id: std::env::var("LLM_MODEL_ID").unwrap_or(defaults.llm_model_id),
            catalog_path: std::env::var("CATALOG_PATH").ok(),
            vector_store_path: std::env::var("VECTOR_STORE_PATH").ok(),
            quality_threshold: std::env::var("QUALITY_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.quality_threshold),
            max_iterations: std::env::var("MAX_ITERATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_iterations),
            cache_l1_size: std::env::var("CACHE_L1_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cache_l1_size),
            cache_l2_size: std::env::var("CACHE_L2_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cache_l2_size),
            cache_l3_size: std::env::var("CACHE_L3_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cache_l3_size),
            cache_promotion_threshold: std::env::var("CACHE_PROMOTION_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cache_promotion_threshold),
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            database_url: std::env::var("DATABASE_URL").ok(),
            db_host: std::env::var("DB_HOST").ok(),
            db_port: std::env::var("DB_PORT").ok().and_then(|s| s.parse().ok()),
            db_name: std::env::var("DB_NAME").ok(),
            db_user: std::env::var("DB_USER").ok(),
            db_password: std::env::var("DB_PASSWORD").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|o| o.trim().to_string()).filter(|o| !o.is_empty()).collect())
                .unwrap_or_default(),
            cors_allow_credentials: std::env::var("CORS_ALLOW_CREDENTIALS")
                .ok()
                .map(|s| s.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            cors_max_age_secs: std::env::var("CORS_MAX_AGE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cors_max_age_secs),
        }
    }

    /// True when enough discrete or combined connection info is present to
    /// attempt a Postgres-backed deployment; false falls back to in-memory
    /// stores.
    pub fn has_database(&self) -> bool {
        self.database_url.is_some() || (self.db_host.is_some() && self.db_name.is_some())
    }

    pub fn cors_max_age(&self) -> Duration {
        Duration::from_secs(self.cors_max_age_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.llm_model_id, "openai:gpt-4o-mini");
        assert_eq!(config.quality_threshold, 0.7);
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.cache_l1_size, 200);
        assert_eq!(config.cache_l2_size, 1000);
        assert_eq!(config.cache_l3_size, 10_000);
        assert_eq!(config.cache_promotion_threshold, 5);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert!(!config.has_database());
    }

    #[test]
    fn has_database_true_with_database_url() {
        let config = AppConfig {
            database_url: Some("postgres://localhost/cardforge".to_string()),
            ..AppConfig::default()
        };
        assert!(config.has_database());
    }

    #[test]
    fn has_database_true_with_discrete_host_and_name() {
        let config = AppConfig {
            db_host: Some("localhost".to_string()),
            db_name: Some("cardforge".to_string()),
            ..AppConfig::default()
        };
        assert!(config.has_database());
    }

    #[test]
    fn has_database_false_with_host_but_no_name() {
        let config = AppConfig {
            db_host: Some("localhost".to_string()),
            ..AppConfig::default()
        };
        assert!(!config.has_database());
    }

    #[test]
    fn bind_addr_combines_host_and_port() {
        let config = AppConfig { host: "127.0.0.1".to_string(), port: 9000, ..AppConfig::default() };
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
    }
}
