use serde::{Deserialize, Serialize};

/// Main configuration structure loaded from cx_lab.toml and environment variables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub pipeline: PipelineConfig,
    pub sessions: SessionConfig,
    pub client: ClientConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// HTTP listener and CORS settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind: std::net::SocketAddr,
    /// Empty list means any origin
    pub allowed_origins: Vec<String>,
    pub request_timeout_ms: u64,
}

/// Analysis pipeline pacing and limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub stage_delay_ms: u64,
    pub stage_timeout_ms: u64,
    /// Used only for the "N seconds remaining" estimate in status responses
    pub seconds_per_agent: u64,
}

/// In-memory session store sizing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    pub capacity: usize,
    pub ttl_sec: u64,
}

/// Settings for the polling client used by casectl
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub request_timeout_ms: u64,
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub log_level: String,
    pub bearer_token: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: "cx_lab=info,tower_http=info".to_string(),
            bearer_token: None,
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(level) = std::env::var("RUST_LOG") {
            cfg.log_level = level;
        }
        cfg.bearer_token = std::env::var("CXLAB_BEARER_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        cfg
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: std::net::SocketAddr::from(([127, 0, 0, 1], 8000)),
                allowed_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ],
                request_timeout_ms: 10_000,
            },
            pipeline: PipelineConfig {
                stage_delay_ms: 250,
                stage_timeout_ms: 30_000,
                seconds_per_agent: 20,
            },
            sessions: SessionConfig {
                capacity: 1024,
                ttl_sec: 24 * 60 * 60,
            },
            client: ClientConfig {
                base_url: "http://127.0.0.1:8000".to_string(),
                poll_interval_ms: 2_000,
                max_poll_attempts: 60,
                request_timeout_ms: 10_000,
            },
            runtime: RuntimeConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses CX_LAB_CONFIG environment variable or defaults to "cx_lab.toml"
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(None)
    }

    /// Like [`Config::load`], with an explicit config path taking precedence
    pub fn load_from(path: Option<&str>) -> anyhow::Result<Self> {
        load_dotenv();

        let config_path = match path {
            Some(p) => p.to_string(),
            None => std::env::var("CX_LAB_CONFIG").unwrap_or_else(|_| "cx_lab.toml".to_string()),
        };

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            Self::from_toml_str(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML document; missing sections fall back to defaults
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        #[derive(Deserialize)]
        struct PartialConfig {
            server: Option<ServerConfig>,
            pipeline: Option<PipelineConfig>,
            sessions: Option<SessionConfig>,
            client: Option<ClientConfig>,
        }

        let partial: PartialConfig = toml::from_str(content)?;
        let defaults = Self::default();
        Ok(Self {
            server: partial.server.unwrap_or(defaults.server),
            pipeline: partial.pipeline.unwrap_or(defaults.pipeline),
            sessions: partial.sessions.unwrap_or(defaults.sessions),
            client: partial.client.unwrap_or(defaults.client),
            runtime: defaults.runtime,
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CXLAB_HTTP_BIND") {
            match v.parse::<std::net::SocketAddr>() {
                Ok(bind) => self.server.bind = bind,
                Err(_) => tracing::warn!("Ignoring invalid CXLAB_HTTP_BIND '{}'", v),
            }
        }
        if let Ok(v) = std::env::var("CXLAB_ALLOWED_ORIGINS") {
            self.server.allowed_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(ms) = env_parse::<u64>("CXLAB_HTTP_REQUEST_TIMEOUT_MS") {
            self.server.request_timeout_ms = ms;
        }
        if let Some(ms) = env_parse::<u64>("CXLAB_STAGE_DELAY_MS") {
            self.pipeline.stage_delay_ms = ms;
        }
        if let Some(ms) = env_parse::<u64>("CXLAB_STAGE_TIMEOUT_MS") {
            self.pipeline.stage_timeout_ms = ms;
        }
        if let Some(cap) = env_parse::<usize>("CXLAB_SESSION_CAPACITY") {
            self.sessions.capacity = cap;
        }
        if let Some(ttl) = env_parse::<u64>("CXLAB_SESSION_TTL_SEC") {
            self.sessions.ttl_sec = ttl;
        }
        if let Ok(url) = std::env::var("CXLAB_API_URL") {
            self.client.base_url = url;
        }
        if let Some(ms) = env_parse::<u64>("CXLAB_POLL_INTERVAL_MS") {
            self.client.poll_interval_ms = ms;
        }
        if let Some(n) = env_parse::<u32>("CXLAB_MAX_POLL_ATTEMPTS") {
            self.client.max_poll_attempts = n;
        }
    }

    /// Clamp out-of-range values and reject configurations that cannot run
    pub fn validate(&mut self) -> anyhow::Result<()> {
        if self.sessions.capacity == 0 {
            tracing::warn!("sessions.capacity 0 is invalid, clamping to 1");
            self.sessions.capacity = 1;
        }
        if self.sessions.ttl_sec == 0 {
            anyhow::bail!("sessions.ttl_sec must be > 0");
        }
        if self.pipeline.stage_timeout_ms == 0 {
            tracing::warn!("pipeline.stage_timeout_ms 0 is invalid, using 30000");
            self.pipeline.stage_timeout_ms = 30_000;
        }
        if self.pipeline.stage_delay_ms > 60_000 {
            tracing::warn!(
                "pipeline.stage_delay_ms {} exceeds max 60000, clamping",
                self.pipeline.stage_delay_ms
            );
            self.pipeline.stage_delay_ms = 60_000;
        }
        if self.client.max_poll_attempts == 0 {
            tracing::warn!("client.max_poll_attempts 0 is invalid, clamping to 1");
            self.client.max_poll_attempts = 1;
        }
        if !self.client.base_url.starts_with("http://")
            && !self.client.base_url.starts_with("https://")
        {
            anyhow::bail!(
                "client.base_url '{}' must start with http:// or https://",
                self.client.base_url
            );
        }
        Ok(())
    }
}

/// Load environment files without overriding variables already set:
/// 1) CXLAB_ENV_FILE if set
/// 2) ./.env
/// 3) ../.env (repo root when running from a subdirectory)
///
/// Binaries call this before installing the tracing subscriber so RUST_LOG
/// from .env applies to config loading; `Config::load_from` calls it again.
pub fn load_dotenv() {
    if let Ok(env_path) = std::env::var("CXLAB_ENV_FILE") {
        let _ = dotenvy::from_path(env_path);
    } else if dotenvy::from_path(".env").is_err() {
        let _ = dotenvy::from_path("../.env");
    }
}

/// Filter for the tracing subscriber, available before the config is read
pub fn log_filter() -> String {
    load_dotenv();
    RuntimeConfig::load_from_env().log_level
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
