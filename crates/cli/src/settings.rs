use anyhow::{Context as AnyhowContext, Result};
use ktest_minimize::Limits;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Defaults loaded from a TOML file; command-line flags take precedence.
///
/// ```toml
/// expect_status = 0
/// seed_parts = 4
///
/// [limits]
/// pred_limit = 500
/// max_chunks = 64
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub limits: Limits,
    pub expect_status: Option<i32>,
    pub seed_parts: Option<usize>,
    pub keep: Option<String>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let settings: Self = toml::from_str(raw)?;
        if settings.seed_parts == Some(0) {
            anyhow::bail!("seed_parts must be > 0");
        }
        Ok(settings)
    }
}
