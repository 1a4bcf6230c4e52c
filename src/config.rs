use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::synth::DEFAULT_SAMPLE_SIZE;

pub const ENV_CONFIG: &str = "GRAD_EXPLORER_CONFIG";
pub const ENV_DATA: &str = "GRAD_EXPLORER_DATA";
pub const ENV_SEED: &str = "GRAD_EXPLORER_SEED";
pub const ENV_SAMPLE_SIZE: &str = "GRAD_EXPLORER_SAMPLE_SIZE";

/// Majors shown when the dashboard first opens.
const DEFAULT_MAJORS: [&str; 11] = [
    "Biological Sciences",
    "Chemical Engineering",
    "Computer Science and Math",
    "Economics",
    "Management & Administration",
    "Mechanical Engineering",
    "Information Services and Systems",
    "Oceanography",
    "Political Science and Government",
    "Public Policy Studies",
    "Statistics",
];

// ---------------------------------------------------------------------------
// ExplorerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Survey table (`.csv`, `.json` or `.parquet`).
    pub data_path: PathBuf,
    /// Salary samples drawn per major.
    pub sample_size: usize,
    /// Fixed seed for reproducible salary charts; OS entropy when absent.
    pub seed: Option<u64>,
    pub default_majors: Vec<String>,
    pub histogram_bins: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("graduates.csv"),
            sample_size: DEFAULT_SAMPLE_SIZE,
            seed: None,
            default_majors: DEFAULT_MAJORS.iter().map(|m| m.to_string()).collect(),
            histogram_bins: 40,
        }
    }
}

impl ExplorerConfig {
    /// Defaults, then the JSON file named by `GRAD_EXPLORER_CONFIG`, then
    /// individual environment overrides.
    pub fn load() -> Result<Self> {
        let base = match std::env::var(ENV_CONFIG) {
            Ok(path) => Self::from_json_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        let config = base.with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Apply `GRAD_EXPLORER_*` overrides looked up through `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(path) = lookup(ENV_DATA) {
            self.data_path = PathBuf::from(path);
        }
        if let Some(seed) = lookup(ENV_SEED) {
            self.seed = Some(
                seed.trim()
                    .parse()
                    .with_context(|| format!("{ENV_SEED}: '{seed}' is not an unsigned integer"))?,
            );
        }
        if let Some(size) = lookup(ENV_SAMPLE_SIZE) {
            self.sample_size = size
                .trim()
                .parse()
                .with_context(|| format!("{ENV_SAMPLE_SIZE}: '{size}' is not an unsigned integer"))?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_size == 0 {
            bail!("sample_size must be greater than zero");
        }
        if self.histogram_bins == 0 {
            bail!("histogram_bins must be greater than zero");
        }
        Ok(())
    }
}
