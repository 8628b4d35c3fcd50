use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_backend")]
    pub backend: String,
    #[serde(default = "default_cache_url")]
    pub url: String,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            url: default_cache_url(),
            ttl_secs: default_ttl_secs(),
            op_timeout_ms: default_op_timeout_ms(),
        }
    }
}

fn default_cache_backend() -> String {
    "memory".to_string()
}
fn default_cache_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}
fn default_ttl_secs() -> u64 {
    3600
}
fn default_op_timeout_ms() -> u64 {
    250
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            store_timeout_ms: default_store_timeout_ms(),
        }
    }
}

fn default_page_size() -> i64 {
    20
}
fn default_max_page_size() -> i64 {
    100
}
fn default_store_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            csv_path: default_csv_path(),
        }
    }
}

fn default_batch_size() -> usize {
    1000
}
fn default_csv_path() -> PathBuf {
    PathBuf::from("data/products.csv")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    match config.cache.backend.as_str() {
        "memory" | "redis" => {}
        other => anyhow::bail!(
            "Unknown cache backend: '{}'. Must be memory or redis.",
            other
        ),
    }

    if config.cache.ttl_secs == 0 {
        anyhow::bail!("cache.ttl_secs must be > 0");
    }

    if config.search.default_page_size < 1 {
        anyhow::bail!("search.default_page_size must be >= 1");
    }

    if config.search.max_page_size < config.search.default_page_size {
        anyhow::bail!("search.max_page_size must be >= search.default_page_size");
    }

    if config.ingest.batch_size == 0 {
        anyhow::bail!("ingest.batch_size must be > 0");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let file = write_config(
            r#"
[db]
path = "data/catalog.sqlite"

[server]
bind = "127.0.0.1:7600"
"#,
        );
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.cache.backend, "memory");
        assert_eq!(cfg.cache.ttl_secs, 3600);
        assert_eq!(cfg.search.default_page_size, 20);
        assert_eq!(cfg.ingest.batch_size, 1000);
    }

    #[test]
    fn unknown_cache_backend_rejected() {
        let file = write_config(
            r#"
[db]
path = "data/catalog.sqlite"

[cache]
backend = "memcached"

[server]
bind = "127.0.0.1:7600"
"#,
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("cache backend"));
    }

    #[test]
    fn page_size_bounds_validated() {
        let file = write_config(
            r#"
[db]
path = "data/catalog.sqlite"

[search]
default_page_size = 50
max_page_size = 10

[server]
bind = "127.0.0.1:7600"
"#,
        );
        assert!(load_config(file.path()).is_err());
    }
}
