use poregrid::engine::config::ExecutionMode;
use std::path::PathBuf;

pub struct DefaultsConfig {
    pub spacing: f64,
    pub output: PathBuf,
    pub execution: ExecutionMode,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            spacing: 1.0,
            output: PathBuf::from("energy_grid.cube"),
            execution: ExecutionMode::Parallel,
        }
    }
}
