use crate::error::{CliError, Result};
use poregrid::engine::config::ExecutionMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileExecutionMode {
    Serial,
    Parallel,
}

impl From<FileExecutionMode> for ExecutionMode {
    fn from(mode: FileExecutionMode) -> Self {
        match mode {
            FileExecutionMode::Serial => ExecutionMode::Serial,
            FileExecutionMode::Parallel => ExecutionMode::Parallel,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileGridConfig {
    pub spacing: Option<f64>,
    pub cutoff: Option<f64>,
    pub execution: Option<FileExecutionMode>,
}

/// Run configuration as written in a TOML file. Every key is optional.
///
/// ```toml
/// structure = "frameworks/IRMOF-1.cif"
/// forcefield = "uff.toml"
/// adsorbate = "CH4"
/// output = "IRMOF-1_CH4.cube"
///
/// [grid]
/// spacing = 0.5
/// cutoff = 12.8
/// execution = "parallel"
/// ```
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub structure: Option<PathBuf>,
    pub forcefield: Option<PathBuf>,
    pub adsorbate: Option<String>,
    pub output: Option<PathBuf>,
    pub grid: Option<FileGridConfig>,
}

impl FileConfig {
    /// Reads a config file; relative paths in it are taken relative to the
    /// directory containing the file.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;

        if let Some(base) = path.parent() {
            for entry in [
                &mut config.structure,
                &mut config.forcefield,
                &mut config.output,
            ] {
                if let Some(p) = entry.as_mut().filter(|p| p.is_relative()) {
                    *p = base.join(&*p);
                }
            }
        }
        Ok(config)
    }
}
