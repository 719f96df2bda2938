use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// How the grid is distributed over compute resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// One slab after another on the calling thread.
    Serial,
    /// Slabs dispatched in batches to the rayon worker pool.
    #[default]
    Parallel,
}

/// Complete description of one energy-grid run.
///
/// This is the only payload a run needs: every worker reads the data derived
/// from it through a shared, immutable context.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    pub structure_path: PathBuf,
    pub forcefield_path: PathBuf,
    pub adsorbate: String,
    pub output_path: PathBuf,
    /// Target distance between grid points (Å).
    pub spacing: f64,
    /// Overrides the forcefield cutoff when set (Å).
    pub cutoff: Option<f64>,
    pub execution: ExecutionMode,
}

#[derive(Default)]
pub struct GridConfigBuilder {
    structure_path: Option<PathBuf>,
    forcefield_path: Option<PathBuf>,
    adsorbate: Option<String>,
    output_path: Option<PathBuf>,
    spacing: Option<f64>,
    cutoff: Option<f64>,
    execution: Option<ExecutionMode>,
}

impl GridConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn structure_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.structure_path = Some(path.into());
        self
    }
    pub fn forcefield_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.forcefield_path = Some(path.into());
        self
    }
    pub fn adsorbate(mut self, name: impl Into<String>) -> Self {
        self.adsorbate = Some(name.into());
        self
    }
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }
    pub fn spacing(mut self, spacing: f64) -> Self {
        self.spacing = Some(spacing);
        self
    }
    pub fn cutoff(mut self, cutoff: Option<f64>) -> Self {
        self.cutoff = cutoff;
        self
    }
    pub fn execution(mut self, mode: ExecutionMode) -> Self {
        self.execution = Some(mode);
        self
    }

    pub fn build(self) -> Result<GridConfig, ConfigError> {
        let spacing = self
            .spacing
            .ok_or(ConfigError::MissingParameter("spacing"))?;
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(ConfigError::InvalidValue {
                name: "spacing",
                reason: format!("must be positive and finite, got {spacing}"),
            });
        }
        if let Some(cutoff) = self.cutoff {
            if !(cutoff.is_finite() && cutoff > 0.0) {
                return Err(ConfigError::InvalidValue {
                    name: "cutoff",
                    reason: format!("must be positive and finite, got {cutoff}"),
                });
            }
        }
        let adsorbate = self
            .adsorbate
            .ok_or(ConfigError::MissingParameter("adsorbate"))?;
        if adsorbate.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "adsorbate",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(GridConfig {
            structure_path: self
                .structure_path
                .ok_or(ConfigError::MissingParameter("structure_path"))?,
            forcefield_path: self
                .forcefield_path
                .ok_or(ConfigError::MissingParameter("forcefield_path"))?,
            adsorbate,
            output_path: self
                .output_path
                .ok_or(ConfigError::MissingParameter("output_path"))?,
            spacing,
            cutoff: self.cutoff,
            execution: self.execution.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_builder() -> GridConfigBuilder {
        GridConfigBuilder::new()
            .structure_path("IRMOF-1.cif")
            .forcefield_path("uff.toml")
            .adsorbate("CH4")
            .output_path("out/grid.cube")
            .spacing(1.0)
    }

    #[test]
    fn build_succeeds_with_all_required_parameters() {
        let config = complete_builder().build().unwrap();
        assert_eq!(config.structure_path, PathBuf::from("IRMOF-1.cif"));
        assert_eq!(config.adsorbate, "CH4");
        assert_eq!(config.spacing, 1.0);
        assert_eq!(config.cutoff, None);
        assert_eq!(config.execution, ExecutionMode::Parallel);
    }

    #[test]
    fn build_keeps_explicit_execution_mode_and_cutoff() {
        let config = complete_builder()
            .cutoff(Some(14.0))
            .execution(ExecutionMode::Serial)
            .build()
            .unwrap();
        assert_eq!(config.cutoff, Some(14.0));
        assert_eq!(config.execution, ExecutionMode::Serial);
    }

    #[test]
    fn build_fails_when_required_parameter_is_missing() {
        let result = GridConfigBuilder::new()
            .forcefield_path("uff.toml")
            .adsorbate("CH4")
            .output_path("grid.cube")
            .spacing(1.0)
            .build();
        assert_eq!(
            result,
            Err(ConfigError::MissingParameter("structure_path"))
        );
    }

    #[test]
    fn build_rejects_non_positive_spacing() {
        let result = complete_builder().spacing(0.0).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "spacing", .. })
        ));
    }

    #[test]
    fn build_rejects_non_positive_cutoff_override() {
        let result = complete_builder().cutoff(Some(-3.0)).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "cutoff", .. })
        ));
    }

    #[test]
    fn build_rejects_blank_adsorbate() {
        let result = complete_builder().adsorbate("  ").build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                name: "adsorbate",
                ..
            })
        ));
    }
}
