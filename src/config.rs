use std::time::Duration;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
    pub bootstrap: BootstrapConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub sentinel_enabled: bool,
    pub sentinel_url: Option<String>,
}

impl RedisConfig {
    /// The URL the store should connect to, honouring the sentinel switch.
    pub fn effective_url(&self) -> Option<&str> {
        if self.sentinel_enabled {
            self.sentinel_url.as_deref()
        } else {
            Some(self.url.as_str())
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub token_ttl_secs: u64,  // 7 days by default
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaginationConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapConfig {
    pub admin_name: String,
    pub admin_email: String,
    pub admin_password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub poll_interval_secs: u64,
}

impl ClientConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::Environment::with_prefix("APP").prefix_separator("_").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Settings suitable for tests and throwaway local runs: in-memory store,
    /// cheap bcrypt cost, fixed secret.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
                max_body_bytes: 1024 * 1024,
                allowed_origins: Vec::new(),
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
            },
            redis: RedisConfig {
                url: "redis://127.0.0.1:6379".into(),
                sentinel_enabled: false,
                sentinel_url: None,
            },
            auth: AuthConfig {
                jwt_secret: "test-secret".into(),
                issuer: "role-tasks-test".into(),
                token_ttl_secs: 3600,
                bcrypt_cost: 4,
            },
            pagination: PaginationConfig {
                default_limit: 10,
                max_limit: 100,
            },
            bootstrap: BootstrapConfig {
                admin_name: "System Admin".into(),
                admin_email: "admin@org.com".into(),
                admin_password: "admin123".into(),
            },
            client: ClientConfig {
                base_url: "http://localhost:5000".into(),
                poll_interval_secs: 10,
            },
        }
    }
}
