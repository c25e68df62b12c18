use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub source: SourceConfig,
    pub index: IndexConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Help-center API root, e.g. `https://acme.zendesk.com/api/v2/help_center`.
    pub base_url: String,
    #[serde(default = "default_max_articles")]
    pub max_articles: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_articles() -> usize {
    40
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Vector store name; resolved (or created) by name at sync time.
    pub store_name: String,
    #[serde(default = "default_index_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_index_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_max_retries() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_segment_chars")]
    pub segment_chars: usize,
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,
    /// How far back from a hard cut the chunker may move to land on a
    /// paragraph, sentence, or whitespace boundary.
    #[serde(default = "default_boundary_window")]
    pub boundary_window: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            segment_chars: default_segment_chars(),
            overlap_chars: default_overlap_chars(),
            boundary_window: default_boundary_window(),
        }
    }
}

fn default_segment_chars() -> usize {
    1000
}
fn default_overlap_chars() -> usize {
    150
}
fn default_boundary_window() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
        }
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from("log/runs.jsonl")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.source.base_url.is_empty() {
        anyhow::bail!("source.base_url must not be empty");
    }

    if config.source.max_articles == 0 {
        anyhow::bail!("source.max_articles must be > 0");
    }

    if config.index.store_name.is_empty() {
        anyhow::bail!("index.store_name must not be empty");
    }

    if config.chunking.segment_chars == 0 {
        anyhow::bail!("chunking.segment_chars must be > 0");
    }

    if config.chunking.overlap_chars >= config.chunking.segment_chars {
        anyhow::bail!("chunking.overlap_chars must be smaller than chunking.segment_chars");
    }

    // The boundary search must never reach back past the start of the
    // fresh (non-overlapped) part of a segment, or the cursor would
    // stop advancing.
    if config.chunking.boundary_window + config.chunking.overlap_chars
        >= config.chunking.segment_chars
    {
        anyhow::bail!(
            "chunking.boundary_window + chunking.overlap_chars must be smaller than chunking.segment_chars"
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_minimal_config_defaults() {
        let f = write_config(
            r#"
[store]
path = "data/helpsync.sqlite"

[source]
base_url = "https://acme.zendesk.com/api/v2/help_center"

[index]
store_name = "acme-help-center"
"#,
        );
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.source.max_articles, 40);
        assert_eq!(cfg.chunking.segment_chars, 1000);
        assert_eq!(cfg.chunking.overlap_chars, 150);
        assert_eq!(cfg.index.base_url, "https://api.openai.com/v1");
        assert_eq!(cfg.log.path, PathBuf::from("log/runs.jsonl"));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_segment() {
        let f = write_config(
            r#"
[store]
path = "data/helpsync.sqlite"

[source]
base_url = "https://acme.zendesk.com/api/v2/help_center"

[index]
store_name = "acme-help-center"

[chunking]
segment_chars = 100
overlap_chars = 100
"#,
        );
        assert!(load_config(f.path()).is_err());
    }
}
