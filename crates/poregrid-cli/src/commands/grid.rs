use crate::cli::GridArgs;
use crate::config::build_config;
use crate::error::Result;
use crate::ui::{CliProgressHandler, UiEvent};
use poregrid::core::io::cube::KELVIN_TO_KJ_PER_MOL;
use poregrid::engine::progress::ProgressReporter;
use poregrid::workflows::{self, grid::GridResult};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn run(args: GridArgs, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let config = build_config(&args)?;

    let progress_handler = CliProgressHandler::new(ui_sender);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the core grid workflow...");
    let result = tokio::task::block_in_place(|| workflows::grid::run(&config, &reporter))?;

    print_summary(&result);
    Ok(())
}

fn print_summary(result: &GridResult) {
    let [nx, ny, nz] = result.counts;
    let summary = &result.summary;
    println!(
        "✓ Energy grid for {} in {} written to: {}",
        result.adsorbate,
        result.framework_name,
        result.output_path.display()
    );
    println!(
        "  Grid: {} x {} x {} = {} points, cutoff {} Å, images {} x {} x {}",
        nx,
        ny,
        nz,
        summary.points,
        result.cutoff,
        2 * result.replication.nx + 1,
        2 * result.replication.ny + 1,
        2 * result.replication.nz + 1,
    );
    if let (Some(min), Some(max)) = (summary.min, summary.max) {
        println!(
            "  Energy range: {:.4} to {:.4} kJ/mol",
            min * KELVIN_TO_KJ_PER_MOL,
            max * KELVIN_TO_KJ_PER_MOL
        );
    }
    if summary.non_finite > 0 {
        warn!(
            "{} grid point(s) coincide with framework atoms and have non-finite energies.",
            summary.non_finite
        );
        println!(
            "  Warning: {} grid point(s) have non-finite energies.",
            summary.non_finite
        );
    }
}
