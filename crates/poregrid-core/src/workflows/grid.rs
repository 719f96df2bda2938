use crate::core::forcefield::params::Forcefield;
use crate::core::io::cif::CifFile;
use crate::core::io::cube::{CubeHeader, CubeWriter};
use crate::core::io::traits::FrameworkFile;
use crate::core::utils::geometry::ReplicationFactors;
use crate::engine::config::GridConfig;
use crate::engine::driver::{GridContext, GridSummary, compute_grid};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::sampling::SamplingGrid;
use crate::engine::table::AtomTable;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct GridResult {
    pub output_path: PathBuf,
    pub framework_name: String,
    pub adsorbate: String,
    pub counts: [usize; 3],
    pub replication: ReplicationFactors,
    /// Cutoff actually used (Å), after any override.
    pub cutoff: f64,
    /// Point statistics; energies in K.
    pub summary: GridSummary,
}

#[instrument(skip_all, name = "grid_workflow")]
pub fn run(config: &GridConfig, reporter: &ProgressReporter) -> Result<GridResult, EngineError> {
    // === Phase 1: Load inputs and resolve parameters ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    info!(
        "Preparing energy grid for '{}' from '{}'.",
        config.adsorbate,
        config.structure_path.display()
    );

    let framework = CifFile::read_from_path(&config.structure_path)?;
    let forcefield = Forcefield::load(&config.forcefield_path)?;

    let cutoff = match config.cutoff {
        Some(cutoff) => {
            info!(
                "Overriding forcefield cutoff {} Å with {} Å.",
                forcefield.cutoff(),
                cutoff
            );
            cutoff
        }
        None => forcefield.cutoff(),
    };

    let table = AtomTable::build(&framework, &forcefield, &config.adsorbate)?;
    let grid = SamplingGrid::new(framework.edge_lengths(), config.spacing)?;
    let context = GridContext::new(table, grid, cutoff)?;
    let counts = context.grid().counts();
    debug!(?counts, spacing = config.spacing, "Sampling grid ready.");

    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Compute and stream the grid ===
    reporter.report(Progress::PhaseStart {
        name: "Energy Grid",
    });
    let header = CubeHeader::for_unit_cell(
        [
            format!(
                "poregrid Lennard-Jones energy grid: {} in {}",
                config.adsorbate,
                framework.name()
            ),
            format!(
                "spacing {} A, cutoff {} A, energies in kJ/mol",
                config.spacing, cutoff
            ),
        ],
        framework.lattice(),
        counts,
    );
    let summary = write_grid(&context, config, &header, reporter)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        points = summary.points,
        non_finite = summary.non_finite,
        "Energy grid written to '{}'.",
        config.output_path.display()
    );

    Ok(GridResult {
        output_path: config.output_path.clone(),
        framework_name: framework.name().to_string(),
        adsorbate: config.adsorbate.clone(),
        counts,
        replication: *context.factors(),
        cutoff,
        summary,
    })
}

/// Streams the grid into a temporary file next to the output path, which
/// replaces the output only once every slab has been written and flushed.
fn write_grid(
    context: &GridContext,
    config: &GridConfig,
    header: &CubeHeader,
    reporter: &ProgressReporter,
) -> Result<GridSummary, EngineError> {
    let output = config.output_path.as_path();
    let io_error = |source: std::io::Error| EngineError::Io {
        path: output.to_path_buf(),
        source,
    };

    let directory = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(directory).map_err(io_error)?;
    debug!("Writing grid to temporary file '{}'.", temp.path().display());

    let writer = CubeWriter::new(BufWriter::new(temp), header)?;
    let mut sinks = (writer, GridSummary::default());
    compute_grid(context, config.execution, &mut sinks, reporter)?;

    let (writer, summary) = sinks;
    let temp = writer
        .finish()?
        .into_inner()
        .map_err(|e| io_error(e.into_error()))?;
    temp.persist(output).map_err(|e| io_error(e.error))?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{ExecutionMode, GridConfigBuilder};
    use std::fs;
    use std::io::{BufRead, BufReader};
    use tempfile::{TempDir, tempdir};

    const CUBIC_CIF: &str = "\
data_toy
_cell_length_a    10.0
_cell_length_b    10.0
_cell_length_c    10.0
_cell_angle_alpha 90
_cell_angle_beta  90
_cell_angle_gamma 90
loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
C1 C 0.0 0.0 0.0
";

    const FORCEFIELD: &str = r#"
[globals]
cutoff = 12.5

[framework]
C = { epsilon = 100.0, sigma = 3.0 }

[adsorbates]
Ar = { epsilon = 100.0, sigma = 3.0 }
"#;

    fn workspace() -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("toy.cif"), CUBIC_CIF).unwrap();
        fs::write(dir.path().join("ff.toml"), FORCEFIELD).unwrap();
        dir
    }

    fn config(dir: &TempDir, adsorbate: &str, mode: ExecutionMode) -> GridConfig {
        GridConfigBuilder::new()
            .structure_path(dir.path().join("toy.cif"))
            .forcefield_path(dir.path().join("ff.toml"))
            .adsorbate(adsorbate)
            .output_path(dir.path().join("out.cube"))
            .spacing(2.5)
            .execution(mode)
            .build()
            .unwrap()
    }

    #[test]
    fn run_writes_cube_file_matching_grid() {
        let dir = workspace();
        let config = config(&dir, "Ar", ExecutionMode::Serial);
        let result = run(&config, &ProgressReporter::new()).unwrap();

        assert_eq!(result.counts, [5, 5, 5]);
        assert_eq!(result.replication, ReplicationFactors::new(2, 2, 2));
        assert_eq!(result.cutoff, 12.5);
        assert_eq!(result.framework_name, "toy");
        assert_eq!(result.summary.points, 125);
        assert_eq!(result.summary.non_finite, 8);

        let file = fs::File::open(&result.output_path).unwrap();
        let mut reader = BufReader::new(file);
        let header = CubeHeader::read_from(&mut reader).unwrap();
        assert_eq!(header.counts, [5, 5, 5]);
        assert!(header.comments[0].contains("Ar in toy"));

        let body_values: usize = reader
            .lines()
            .map(|line| line.unwrap().split_whitespace().count())
            .sum();
        assert_eq!(body_values, 125);
    }

    #[test]
    fn run_applies_cutoff_override() {
        let dir = workspace();
        let mut config = config(&dir, "Ar", ExecutionMode::Parallel);
        config.cutoff = Some(8.0);
        let result = run(&config, &ProgressReporter::new()).unwrap();
        assert_eq!(result.cutoff, 8.0);
        assert_eq!(result.replication, ReplicationFactors::new(1, 1, 1));
    }

    #[test]
    fn unknown_adsorbate_fails_without_writing_output() {
        let dir = workspace();
        let config = config(&dir, "Kr", ExecutionMode::Serial);
        let result = run(&config, &ProgressReporter::new());

        assert!(matches!(result, Err(EngineError::UnknownAdsorbate(name)) if name == "Kr"));
        assert!(!config.output_path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn missing_structure_is_reported() {
        let dir = workspace();
        let mut config = config(&dir, "Ar", ExecutionMode::Serial);
        config.structure_path = dir.path().join("missing.cif");
        let result = run(&config, &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::Framework { .. })));
    }

    #[test]
    fn run_reports_phases_in_order() {
        let dir = workspace();
        let config = config(&dir, "Ar", ExecutionMode::Serial);
        let phases = std::sync::Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::PhaseStart { name } = event {
                phases.lock().unwrap().push(name);
            }
        }));
        run(&config, &reporter).unwrap();
        drop(reporter);
        assert_eq!(
            phases.into_inner().unwrap(),
            vec!["Preparation", "Energy Grid"]
        );
    }
}
