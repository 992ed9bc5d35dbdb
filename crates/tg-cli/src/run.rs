//! Run configuration for `toygen generate`.

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tg_core::FitKind;
use tg_toys::PseudoDataConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Ledger (JSON array of rows). Its directory anchors relative `source_filename`s.
    pub ledger: PathBuf,
    /// Histogram file holding the postfit transfer functions.
    pub transfer_file: PathBuf,
    /// Transfer-function names in chain order, with or without the fit prefix.
    pub transfers: Vec<String>,
    /// Which fit the transfer functions come from.
    #[serde(default)]
    pub fit: FitKind,
    /// Regions, substitutions, blinding, Poisson count and seed.
    #[serde(flatten)]
    pub toys: PseudoDataConfig,
    /// Output histogram file for the toys.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl RunConfig {
    /// Qualified transfer-function names (`b_...` / `s_...`).
    pub fn transfer_names(&self) -> Vec<String> {
        self.transfers.iter().map(|n| self.fit.qualify(n)).collect()
    }

    /// Output path, defaulting to `toys.json` next to the config.
    pub fn output_or_default(&self, base: &Path) -> PathBuf {
        self.output.clone().unwrap_or_else(|| base.join("toys.json"))
    }

    fn resolve_paths(mut self, base: &Path) -> Self {
        let rel = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.ledger = rel(self.ledger);
        self.transfer_file = rel(self.transfer_file);
        self.output = self.output.map(rel);
        self
    }
}

/// Directory relative config paths resolve against.
pub fn config_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

pub fn read_run_config(path: &Path) -> Result<RunConfig> {
    let bytes = std::fs::read(path)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let cfg: RunConfig = if ext == "json" {
        serde_json::from_slice(&bytes)?
    } else {
        // Default: YAML (serde_yaml_ng).
        serde_yaml_ng::from_slice(&bytes)?
    };
    if cfg.transfers.is_empty() && cfg.toys.regions.is_empty() {
        anyhow::bail!("run config {} lists no regions and no transfers", path.display());
    }
    Ok(cfg.resolve_paths(&config_dir(path)))
}
