use anyhow::{Context, Result, bail};
use casting_authz::AuthConfig;
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_METRICS_BIND: &str = "0.0.0.0:9090";
pub const DEFAULT_PG_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_PG_ACQUIRE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_JWKS_TIMEOUT_MS: u64 = 5_000;

// Service configuration sourced from environment variables and an optional
// YAML override file.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

/// Token verification settings. Issuer and audience may be absent; protected
/// routes then answer `misconfigured` instead of the service failing to start.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSettings {
    pub issuer_domain: Option<String>,
    pub audience: Option<String>,
    pub allowed_algorithms: Vec<Algorithm>,
    pub jwks_url: Option<String>,
    pub jwks_timeout_ms: u64,
    /// Zero disables key-set caching.
    pub jwks_cache_ttl_secs: u64,
    pub leeway_secs: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            issuer_domain: None,
            audience: None,
            allowed_algorithms: vec![Algorithm::RS256],
            jwks_url: None,
            jwks_timeout_ms: DEFAULT_JWKS_TIMEOUT_MS,
            jwks_cache_ttl_secs: 0,
            leeway_secs: 0,
        }
    }
}

impl AuthSettings {
    pub fn verifier_config(&self) -> AuthConfig {
        AuthConfig {
            issuer_domain: self.issuer_domain.clone(),
            audience: self.audience.clone(),
            allowed_algorithms: self.allowed_algorithms.clone(),
            leeway_secs: self.leeway_secs,
        }
    }

    pub fn jwks_timeout(&self) -> Duration {
        Duration::from_millis(self.jwks_timeout_ms)
    }

    pub fn jwks_cache_ttl(&self) -> Option<Duration> {
        (self.jwks_cache_ttl_secs > 0).then(|| Duration::from_secs(self.jwks_cache_ttl_secs))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ServiceConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<String>,
    postgres: Option<PostgresOverride>,
    auth: Option<AuthOverride>,
}

#[derive(Debug, Default, Deserialize)]
struct PostgresOverride {
    url: Option<String>,
    max_connections: Option<u32>,
    acquire_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthOverride {
    issuer_domain: Option<String>,
    audience: Option<String>,
    allowed_algorithms: Option<Vec<String>>,
    jwks_url: Option<String>,
    jwks_timeout_ms: Option<u64>,
    jwks_cache_ttl_secs: Option<u64>,
    leeway_secs: Option<u64>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_or("CASTING_BIND", DEFAULT_BIND)
            .parse()
            .with_context(|| "parse CASTING_BIND")?;
        let metrics_bind = env_or("CASTING_METRICS_BIND", DEFAULT_METRICS_BIND)
            .parse()
            .with_context(|| "parse CASTING_METRICS_BIND")?;
        let storage = env_or("CASTING_STORAGE", "memory")
            .parse()
            .with_context(|| "parse CASTING_STORAGE")?;

        let postgres = match env_opt("DATABASE_URL") {
            Some(url) => Some(PostgresConfig {
                url: normalize_database_url(&url),
                max_connections: env_parse(
                    "CASTING_PG_MAX_CONNECTIONS",
                    DEFAULT_PG_MAX_CONNECTIONS,
                )?,
                acquire_timeout_ms: env_parse(
                    "CASTING_PG_ACQUIRE_TIMEOUT_MS",
                    DEFAULT_PG_ACQUIRE_TIMEOUT_MS,
                )?,
            }),
            None => None,
        };

        let allowed_algorithms = match env_opt("ALGORITHMS") {
            Some(raw) => parse_algorithms(&raw).with_context(|| "parse ALGORITHMS")?,
            None => vec![Algorithm::RS256],
        };
        let auth = AuthSettings {
            issuer_domain: env_opt("AUTH0_DOMAIN"),
            audience: env_opt("API_AUDIENCE").or_else(|| env_opt("AUTH0_AUDIENCE")),
            allowed_algorithms,
            jwks_url: env_opt("CASTING_JWKS_URL"),
            jwks_timeout_ms: env_parse("CASTING_JWKS_TIMEOUT_MS", DEFAULT_JWKS_TIMEOUT_MS)?,
            jwks_cache_ttl_secs: env_parse("CASTING_JWKS_CACHE_TTL_SECS", 0)?,
            leeway_secs: env_parse("CASTING_LEEWAY_SECS", 0)?,
        };

        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            postgres,
            auth,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("CASTING_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read CASTING_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        Ok(config)
    }

    fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: ServiceConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse service config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.storage {
            self.storage = value.parse().with_context(|| "parse storage")?;
        }
        if let Some(pg) = override_cfg.postgres {
            let current = self.postgres.take();
            let url = pg
                .url
                .map(|url| normalize_database_url(&url))
                .or_else(|| current.as_ref().map(|c| c.url.clone()));
            if let Some(url) = url {
                self.postgres = Some(PostgresConfig {
                    url,
                    max_connections: pg
                        .max_connections
                        .or(current.as_ref().map(|c| c.max_connections))
                        .unwrap_or(DEFAULT_PG_MAX_CONNECTIONS),
                    acquire_timeout_ms: pg
                        .acquire_timeout_ms
                        .or(current.as_ref().map(|c| c.acquire_timeout_ms))
                        .unwrap_or(DEFAULT_PG_ACQUIRE_TIMEOUT_MS),
                });
            }
        }
        if let Some(auth) = override_cfg.auth {
            if let Some(value) = auth.issuer_domain {
                self.auth.issuer_domain = Some(value);
            }
            if let Some(value) = auth.audience {
                self.auth.audience = Some(value);
            }
            if let Some(values) = auth.allowed_algorithms {
                self.auth.allowed_algorithms = parse_algorithms(&values.join(","))
                    .with_context(|| "parse auth.allowed_algorithms")?;
            }
            if let Some(value) = auth.jwks_url {
                self.auth.jwks_url = Some(value);
            }
            if let Some(value) = auth.jwks_timeout_ms {
                self.auth.jwks_timeout_ms = value;
            }
            if let Some(value) = auth.jwks_cache_ttl_secs {
                self.auth.jwks_cache_ttl_secs = value;
            }
            if let Some(value) = auth.leeway_secs {
                self.auth.leeway_secs = value;
            }
        }
        Ok(())
    }
}

/// Parse a comma-separated algorithm list such as `RS256,PS256`.
///
/// Symmetric algorithms are refused: keys come from a public JWKS.
pub fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>> {
    let mut algorithms = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let alg = Algorithm::from_str(name)
            .map_err(|_| anyhow::anyhow!("unknown algorithm: {name}"))?;
        if matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            bail!("symmetric algorithm not allowed: {name}");
        }
        if !algorithms.contains(&alg) {
            algorithms.push(alg);
        }
    }
    if algorithms.is_empty() {
        bail!("at least one algorithm is required");
    }
    Ok(algorithms)
}

/// Accept the legacy `postgres://` scheme alongside `postgresql://`.
pub fn normalize_database_url(url: &str) -> String {
    match url.strip_prefix("postgres://") {
        Some(rest) => format!("postgresql://{rest}"),
        None => url.to_string(),
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env_opt(key) {
        Some(value) => value.parse().with_context(|| format!("parse {key}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::set_var(key, value);
            }
            Self { key, prev }
        }

        fn unset(key: &'static str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::remove_var(key);
            }
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.prev {
                Some(value) => unsafe {
                    std::env::set_var(self.key, value);
                },
                None => unsafe {
                    std::env::remove_var(self.key);
                },
            }
        }
    }

    fn clear_env() -> Vec<EnvGuard> {
        [
            "CASTING_BIND",
            "CASTING_METRICS_BIND",
            "CASTING_STORAGE",
            "CASTING_CONFIG",
            "DATABASE_URL",
            "CASTING_PG_MAX_CONNECTIONS",
            "CASTING_PG_ACQUIRE_TIMEOUT_MS",
            "AUTH0_DOMAIN",
            "API_AUDIENCE",
            "AUTH0_AUDIENCE",
            "ALGORITHMS",
            "CASTING_JWKS_URL",
            "CASTING_JWKS_TIMEOUT_MS",
            "CASTING_JWKS_CACHE_TTL_SECS",
            "CASTING_LEEWAY_SECS",
        ]
        .into_iter()
        .map(EnvGuard::unset)
        .collect()
    }

    #[test]
    #[serial]
    fn defaults_without_env() {
        let _guards = clear_env();
        let config = ServiceConfig::from_env().expect("config");
        assert_eq!(config.bind_addr, DEFAULT_BIND.parse::<SocketAddr>().expect("addr"));
        assert_eq!(config.metrics_bind, DEFAULT_METRICS_BIND.parse::<SocketAddr>().expect("addr"));
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.postgres.is_none());
        assert_eq!(config.auth, AuthSettings::default());
        assert!(!config.auth.verifier_config().is_configured());
        assert!(config.auth.jwks_cache_ttl().is_none());
    }

    #[test]
    #[serial]
    fn reads_auth_settings() {
        let _guards = clear_env();
        let _g1 = EnvGuard::set("AUTH0_DOMAIN", "casting.eu.auth0.com");
        let _g2 = EnvGuard::set("AUTH0_AUDIENCE", "casting-fallback");
        let _g3 = EnvGuard::set("ALGORITHMS", "RS256, PS256");
        let _g4 = EnvGuard::set("CASTING_JWKS_CACHE_TTL_SECS", "600");
        let config = ServiceConfig::from_env().expect("config");
        assert_eq!(
            config.auth.issuer_domain.as_deref(),
            Some("casting.eu.auth0.com")
        );
        assert_eq!(config.auth.audience.as_deref(), Some("casting-fallback"));
        assert_eq!(
            config.auth.allowed_algorithms,
            vec![Algorithm::RS256, Algorithm::PS256]
        );
        assert_eq!(config.auth.jwks_cache_ttl(), Some(Duration::from_secs(600)));
        assert!(config.auth.verifier_config().is_configured());
    }

    #[test]
    #[serial]
    fn api_audience_wins_over_fallback() {
        let _guards = clear_env();
        let _g1 = EnvGuard::set("API_AUDIENCE", "primary");
        let _g2 = EnvGuard::set("AUTH0_AUDIENCE", "fallback");
        let config = ServiceConfig::from_env().expect("config");
        assert_eq!(config.auth.audience.as_deref(), Some("primary"));
    }

    #[test]
    #[serial]
    fn database_url_is_normalized() {
        let _guards = clear_env();
        let _g1 = EnvGuard::set("DATABASE_URL", "postgres://u:p@db:5432/capstone");
        let _g2 = EnvGuard::set("CASTING_STORAGE", "postgres");
        let config = ServiceConfig::from_env().expect("config");
        assert_eq!(config.storage, StorageBackend::Postgres);
        let pg = config.postgres.expect("postgres");
        assert_eq!(pg.url, "postgresql://u:p@db:5432/capstone");
        assert_eq!(pg.max_connections, DEFAULT_PG_MAX_CONNECTIONS);
    }

    #[test]
    #[serial]
    fn invalid_values_are_reported() {
        let _guards = clear_env();
        let _g1 = EnvGuard::set("CASTING_BIND", "not-an-addr");
        let err = ServiceConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("CASTING_BIND"));
        drop(_g1);

        let _g2 = EnvGuard::set("ALGORITHMS", "HS256");
        let err = ServiceConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("ALGORITHMS"));
        drop(_g2);

        let _g3 = EnvGuard::set("CASTING_STORAGE", "sqlite");
        assert!(ServiceConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn yaml_override_applies_on_top_of_env() {
        let _guards = clear_env();
        let _g1 = EnvGuard::set("AUTH0_DOMAIN", "from-env.example");
        let mut config = ServiceConfig::from_env().expect("config");
        config
            .apply_yaml(
                r#"
bind_addr: "127.0.0.1:18080"
storage: postgres
postgres:
  url: "postgres://localhost:5432/capstone"
  max_connections: 3
auth:
  audience: casting
  allowed_algorithms: ["RS384"]
  jwks_timeout_ms: 250
"#,
            )
            .expect("apply yaml");
        assert_eq!(config.bind_addr, "127.0.0.1:18080".parse::<SocketAddr>().expect("addr"));
        assert_eq!(config.storage, StorageBackend::Postgres);
        let pg = config.postgres.as_ref().expect("postgres");
        assert_eq!(pg.url, "postgresql://localhost:5432/capstone");
        assert_eq!(pg.max_connections, 3);
        assert_eq!(pg.acquire_timeout_ms, DEFAULT_PG_ACQUIRE_TIMEOUT_MS);
        assert_eq!(config.auth.issuer_domain.as_deref(), Some("from-env.example"));
        assert_eq!(config.auth.audience.as_deref(), Some("casting"));
        assert_eq!(config.auth.allowed_algorithms, vec![Algorithm::RS384]);
        assert_eq!(config.auth.jwks_timeout(), Duration::from_millis(250));
    }

    #[test]
    #[serial]
    fn from_env_or_yaml_reads_file() {
        let _guards = clear_env();
        let path = std::env::temp_dir().join(format!("casting-config-{}.yaml", std::process::id()));
        fs::write(&path, "metrics_bind: \"127.0.0.1:19090\"\n").expect("write yaml");
        let _g1 = EnvGuard::set("CASTING_CONFIG", path.to_str().expect("path"));
        let config = ServiceConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.metrics_bind, "127.0.0.1:19090".parse::<SocketAddr>().expect("addr"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn parse_algorithms_rules() {
        assert_eq!(
            parse_algorithms("RS256,RS256").expect("dedup"),
            vec![Algorithm::RS256]
        );
        assert!(parse_algorithms("").is_err());
        assert!(parse_algorithms("HS512").is_err());
        assert!(parse_algorithms("XX999").is_err());
    }
}
