use crate::cli::InspectArgs;
use crate::error::{CliError, Result};
use poregrid::core::io::cif::CifFile;
use poregrid::core::io::cube::CubeHeader;
use poregrid::core::io::traits::FrameworkFile;
use poregrid::core::models::framework::Framework;
use poregrid::core::utils::geometry::replication_factors;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

pub async fn run(args: InspectArgs) -> Result<()> {
    let is_cube = args
        .path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("cube"));

    let report = if is_cube {
        if args.cutoff.is_some() {
            return Err(CliError::Argument(
                "--cutoff only applies to framework (CIF) files".to_string(),
            ));
        }
        describe_cube(&args.path)?
    } else {
        describe_framework(&args.path, args.cutoff)?
    };
    println!("{}", report);
    Ok(())
}

fn describe_framework(path: &Path, cutoff: Option<f64>) -> Result<String> {
    info!("Reading framework from {:?}", path);
    let framework = CifFile::read_from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    framework_report(&framework, cutoff)
}

fn framework_report(framework: &Framework, cutoff: Option<f64>) -> Result<String> {
    let lattice = framework.lattice();
    let [a, b, c] = lattice.edge_lengths();
    let [alpha, beta, gamma] = lattice.angles();
    let [wa, wb, wc] = lattice.perpendicular_widths();

    let mut composition: BTreeMap<&str, usize> = BTreeMap::new();
    for atom in framework.atoms() {
        *composition.entry(atom.label.as_str()).or_default() += 1;
    }
    let composition = composition
        .iter()
        .map(|(label, count)| format!("{label}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut lines = vec![
        format!("Framework: {}", framework.name()),
        format!("  Cell lengths (Å):      {a:.4} {b:.4} {c:.4}"),
        format!("  Cell angles (°):       {alpha:.3} {beta:.3} {gamma:.3}"),
        format!("  Volume (Å³):           {:.3}", lattice.volume()),
        format!("  Perpendicular widths:  {wa:.4} {wb:.4} {wc:.4}"),
        format!("  Atoms:                 {} ({})", framework.len(), composition),
    ];

    if let Some(cutoff) = cutoff {
        let factors = replication_factors(lattice, cutoff)
            .map_err(|e| CliError::Argument(e.to_string()))?;
        lines.push(format!(
            "  Replication for {cutoff} Å: ±{} ±{} ±{} ({} images)",
            factors.nx,
            factors.ny,
            factors.nz,
            factors.image_count()
        ));
    }
    Ok(lines.join("\n"))
}

fn describe_cube(path: &Path) -> Result<String> {
    info!("Reading cube header from {:?}", path);
    let file = File::open(path)?;
    let header =
        CubeHeader::read_from(&mut BufReader::new(file)).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;

    let [nx, ny, nz] = header.counts;
    let mut lines = vec![
        format!("Energy grid: {}", path.display()),
        format!("  {}", header.comments[0].trim()),
        format!("  {}", header.comments[1].trim()),
        format!("  Points: {nx} x {ny} x {nz} = {}", nx * ny * nz),
    ];
    for (axis, voxel) in ["x", "y", "z"].iter().zip(header.voxel_vectors.iter()) {
        lines.push(format!(
            "  Voxel {axis}: {:.6} {:.6} {:.6}",
            voxel.x, voxel.y, voxel.z
        ));
    }
    Ok(lines.join("\n"))
}
