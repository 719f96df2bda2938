use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileExecutionMode};
use crate::cli::GridArgs;
use crate::error::{CliError, Result};
use poregrid::engine::config::{ExecutionMode, GridConfig, GridConfigBuilder};
use std::path::PathBuf;
use std::str::FromStr;

/// Merges CLI arguments, the optional config file (after `--set` overrides)
/// and built-in defaults, in that order of precedence.
pub fn build_config(args: &GridArgs) -> Result<GridConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;
    let grid_file = file_config.grid.take().unwrap_or_default();

    let structure = args
        .structure
        .clone()
        .or(file_config.structure)
        .ok_or_else(|| required("structure", "--structure"))?;
    let forcefield = args
        .forcefield
        .clone()
        .or(file_config.forcefield)
        .ok_or_else(|| required("forcefield", "--forcefield"))?;
    let adsorbate = args
        .adsorbate
        .clone()
        .or(file_config.adsorbate)
        .ok_or_else(|| required("adsorbate", "--adsorbate"))?;
    let output = args
        .output
        .clone()
        .or(file_config.output)
        .unwrap_or(defaults.output);

    let spacing = args
        .spacing
        .or(grid_file.spacing)
        .unwrap_or(defaults.spacing);
    let cutoff = args.cutoff.or(grid_file.cutoff);
    let execution = if args.serial {
        ExecutionMode::Serial
    } else {
        grid_file
            .execution
            .map(ExecutionMode::from)
            .unwrap_or(defaults.execution)
    };

    GridConfigBuilder::new()
        .structure_path(structure)
        .forcefield_path(forcefield)
        .adsorbate(adsorbate)
        .output_path(output)
        .spacing(spacing)
        .cutoff(cutoff)
        .execution(execution)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

fn required(key: &str, flag: &str) -> CliError {
    CliError::Config(format!(
        "A value for '{}' is required either in the config file or via the {} argument.",
        key, flag
    ))
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "structure" => config.structure = Some(PathBuf::from(value_str)),
            "forcefield" => config.forcefield = Some(PathBuf::from(value_str)),
            "adsorbate" => config.adsorbate = Some(value_str.to_string()),
            "output" => config.output = Some(PathBuf::from(value_str)),
            "grid.spacing" => {
                config.grid.get_or_insert_with(Default::default).spacing =
                    Some(parse_value(key, value_str, "float")?);
            }
            "grid.cutoff" => {
                config.grid.get_or_insert_with(Default::default).cutoff =
                    Some(parse_value(key, value_str, "float")?);
            }
            "grid.execution" => {
                let mode = match value_str {
                    "serial" => FileExecutionMode::Serial,
                    "parallel" => FileExecutionMode::Parallel,
                    _ => {
                        return Err(CliError::Config(format!(
                            "Invalid value for {}: '{}' (expected 'serial' or 'parallel')",
                            key, value_str
                        )));
                    }
                };
                config.grid.get_or_insert_with(Default::default).execution = Some(mode);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
