//! TOML configuration parsing and validation.
//!
//! Every path, credential location, and tuning knob lives in one file
//! (default `./config/desk.toml`). The credential itself is never stored
//! in the file; `[llm].api_key_env` names the environment variable that
//! holds it.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Notification spreadsheet (xlsx, xls, ods).
    pub spreadsheet: PathBuf,
    /// Worksheet to read; the first sheet when absent.
    #[serde(default)]
    pub sheet: Option<String>,
    /// Building code document (pdf, txt, md).
    pub document: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            api_key_env: default_api_key_env(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_api_key_env() -> String {
    "API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResolverConfig {
    /// How many records go into the context block of a general query.
    #[serde(default = "default_record_limit")]
    pub record_limit: usize,
    /// Minimum similarity (0–100) for an address lookup to select a record.
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            record_limit: default_record_limit(),
            match_threshold: default_match_threshold(),
        }
    }
}

fn default_record_limit() -> usize {
    10
}
fn default_match_threshold() -> f64 {
    60.0
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content)?;
    Ok(config)
}

/// Parses and validates configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.resolver.record_limit == 0 {
        anyhow::bail!("resolver.record_limit must be >= 1");
    }

    if !(0.0..=100.0).contains(&config.resolver.match_threshold) {
        anyhow::bail!("resolver.match_threshold must be in [0, 100]");
    }

    if config.llm.timeout_secs == 0 {
        anyhow::bail!("llm.timeout_secs must be > 0");
    }

    if config.llm.api_key_env.trim().is_empty() {
        anyhow::bail!("llm.api_key_env must not be empty");
    }

    match config.llm.provider.as_str() {
        "gemini" | "openai" => {}
        other => anyhow::bail!(
            "Unknown llm provider: '{}'. Must be gemini or openai.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[data]
spreadsheet = "planilha_notif.xlsx"
document = "codigo_obras.pdf"
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg = parse_config(MINIMAL).unwrap();
        assert_eq!(cfg.llm.provider, "gemini");
        assert_eq!(cfg.llm.api_key_env, "API_KEY");
        assert_eq!(cfg.resolver.record_limit, 10);
        assert_eq!(cfg.resolver.match_threshold, 60.0);
        assert_eq!(cfg.server.bind, "127.0.0.1:8501");
        assert!(cfg.data.sheet.is_none());
    }

    #[test]
    fn rejects_unknown_provider() {
        let text = format!("{}\n[llm]\nprovider = \"bard\"\n", MINIMAL);
        let err = parse_config(&text).unwrap_err();
        assert!(err.to_string().contains("Unknown llm provider"));
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        let text = format!("{}\n[resolver]\nmatch_threshold = 120.0\n", MINIMAL);
        assert!(parse_config(&text).is_err());
    }

    #[test]
    fn rejects_zero_record_limit() {
        let text = format!("{}\n[resolver]\nrecord_limit = 0\n", MINIMAL);
        assert!(parse_config(&text).is_err());
    }

    #[test]
    fn missing_data_section_is_an_error() {
        assert!(parse_config("[llm]\nprovider = \"openai\"\n").is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/desk.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/desk.toml"));
    }
}
