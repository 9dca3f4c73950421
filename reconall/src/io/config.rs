//! Wrapper configuration stored in `reconall.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "reconall.toml";

/// Wrapper configuration (TOML).
///
/// Every field is optional in the file; values given on the command line take
/// precedence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReconallConfig {
    /// Default `SUBJECTS_DIR` when `--subjects-dir` is not given.
    pub subjects_dir: Option<PathBuf>,

    /// Wall-clock budget for one tool run in seconds.
    pub timeout_secs: u64,

    /// Truncate captured stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,

    /// Directory receiving `<tool>.log` files.
    pub log_dir: PathBuf,
}

impl Default for ReconallConfig {
    fn default() -> Self {
        Self {
            subjects_dir: None,
            // A full `recon-all -all` takes many hours.
            timeout_secs: 48 * 60 * 60,
            output_limit_bytes: 1_000_000,
            log_dir: PathBuf::from("."),
        }
    }
}

impl ReconallConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.log_dir.as_os_str().is_empty() {
            return Err(anyhow!("log_dir must not be empty"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ReconallConfig::default()`.
pub fn load_config(path: &Path) -> Result<ReconallConfig> {
    if !path.exists() {
        return Ok(ReconallConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ReconallConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ReconallConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let tmp_path = path.with_extension("toml.tmp");
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
