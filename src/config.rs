use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Documind server.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the Qdrant instance that stores chunk embeddings.
    pub qdrant_url: String,
    /// Optional API key required to access Qdrant.
    pub qdrant_api_key: Option<String>,
    /// Base URL of the Ollama runtime serving embeddings and completions.
    pub ollama_url: Option<String>,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Completion model used to synthesize answers.
    pub completion_model: String,
    /// Target word count per chunk.
    pub chunk_size: usize,
    /// Word count shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Maximum token budget for synthesized answers.
    pub answer_max_tokens: usize,
    /// Sampling temperature for answer synthesis.
    pub answer_temperature: f32,
    /// Default number of chunks retrieved per query.
    pub query_top_k: usize,
    /// Upper bound applied to caller-supplied `top_k` values.
    pub query_max_top_k: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

const DEFAULT_CHUNK_SIZE: usize = 500;
const DEFAULT_CHUNK_OVERLAP: usize = 50;
const DEFAULT_ANSWER_MAX_TOKENS: usize = 500;
const DEFAULT_ANSWER_TEMPERATURE: f32 = 0.2;
const DEFAULT_QUERY_TOP_K: usize = 5;
const DEFAULT_QUERY_MAX_TOP_K: usize = 20;

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let chunk_size = load_env_parsed("CHUNK_SIZE")?.unwrap_or(DEFAULT_CHUNK_SIZE);
        let chunk_overlap = load_env_parsed("CHUNK_OVERLAP")?.unwrap_or(DEFAULT_CHUNK_OVERLAP);
        if chunk_size == 0 {
            return Err(ConfigError::InvalidValue(
                "CHUNK_SIZE must be greater than zero".to_string(),
            ));
        }
        // The chunker requires overlap < chunk_size; the cursor stalls otherwise.
        if chunk_overlap >= chunk_size {
            return Err(ConfigError::InvalidValue(
                "CHUNK_OVERLAP must be smaller than CHUNK_SIZE".to_string(),
            ));
        }

        Ok(Self {
            qdrant_url: load_env("QDRANT_URL")?,
            qdrant_api_key: load_env_optional("QDRANT_API_KEY"),
            ollama_url: load_env_optional("OLLAMA_URL"),
            embedding_model: load_env("EMBEDDING_MODEL")?,
            embedding_dimension: load_env("EMBEDDING_DIMENSION")?
                .parse()
                .map_err(|_| ConfigError::InvalidValue("EMBEDDING_DIMENSION".to_string()))?,
            completion_model: load_env("COMPLETION_MODEL")?,
            chunk_size,
            chunk_overlap,
            answer_max_tokens: load_env_parsed("ANSWER_MAX_TOKENS")?
                .unwrap_or(DEFAULT_ANSWER_MAX_TOKENS),
            answer_temperature: load_env_parsed("ANSWER_TEMPERATURE")?
                .unwrap_or(DEFAULT_ANSWER_TEMPERATURE),
            query_top_k: load_env_parsed("QUERY_TOP_K")?.unwrap_or(DEFAULT_QUERY_TOP_K),
            query_max_top_k: load_env_parsed("QUERY_MAX_TOP_K")?
                .unwrap_or(DEFAULT_QUERY_MAX_TOP_K),
            server_port: load_env_parsed("SERVER_PORT")?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        qdrant_url = %config.qdrant_url,
        embedding_model = %config.embedding_model,
        completion_model = %config.completion_model,
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
