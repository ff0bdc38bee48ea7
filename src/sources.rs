//! Health of the three inputs: spreadsheet, document, and model client.

use anyhow::Result;
use serde::Serialize;
use std::fmt::Display;

use crate::config::Config;
use crate::resolver::QueryResolver;

#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub name: String,
    /// File path or provider name; empty when built from in-memory parts.
    pub location: String,
    pub healthy: bool,
    /// Record/page count or model name when healthy, failure reason otherwise.
    pub detail: String,
}

impl SourceStatus {
    pub fn ok(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            location: String::new(),
            healthy: true,
            detail: detail.into(),
        }
    }

    pub fn unavailable(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            location: String::new(),
            healthy: false,
            detail: detail.into(),
        }
    }

    pub fn from_result<E: Display>(name: &str, location: &str, result: Result<String, E>) -> Self {
        let mut status = match result {
            Ok(detail) => Self::ok(name, detail),
            Err(e) => Self::unavailable(name, e.to_string()),
        };
        status.location = location.to_string();
        status
    }
}

/// `desk sources`: loads every input and prints a status table.
pub fn list_sources(config: &Config) -> Result<()> {
    let resolver = QueryResolver::from_config(config);
    print_sources(resolver.sources());
    Ok(())
}

pub fn print_sources(sources: &[SourceStatus]) {
    println!("{:<12} {:<8} {:<32} DETAIL", "SOURCE", "HEALTHY", "LOCATION");
    for s in sources {
        println!(
            "{:<12} {:<8} {:<32} {}",
            s.name, s.healthy, s.location, s.detail
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_result_keeps_reason() {
        let status = SourceStatus::from_result::<String>(
            "document",
            "/data/codigo_obras.pdf",
            Err("file not found".to_string()),
        );
        assert!(!status.healthy);
        assert_eq!(status.detail, "file not found");
        assert_eq!(status.location, "/data/codigo_obras.pdf");
    }
}
