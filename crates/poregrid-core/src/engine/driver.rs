use super::config::ExecutionMode;
use super::error::EngineError;
use super::potential::PotentialEvaluator;
use super::progress::{Progress, ProgressReporter};
use super::sampling::SamplingGrid;
use super::table::AtomTable;
use crate::core::io::cube::{CubeError, CubeHeader, CubeWriter};
use crate::core::utils::geometry::{ReplicationFactors, replication_factors};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, trace, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Energies (K) of every grid point sharing one x-index, y-major and z-minor.
#[derive(Debug, Clone, PartialEq)]
pub struct Slab {
    x_index: usize,
    ny: usize,
    nz: usize,
    energies: Vec<f64>,
}

impl Slab {
    pub fn new(x_index: usize, ny: usize, nz: usize, energies: Vec<f64>) -> Result<Self, EngineError> {
        if energies.len() != ny * nz {
            return Err(EngineError::SlabShape {
                x_index,
                expected: ny * nz,
                found: energies.len(),
            });
        }
        Ok(Self {
            x_index,
            ny,
            nz,
            energies,
        })
    }

    pub fn x_index(&self) -> usize {
        self.x_index
    }

    /// `(Ny, Nz)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.ny, self.nz)
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// One z-run per y-index.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.energies.chunks(self.nz.max(1))
    }

    /// `(ix, iy, iz, energy)` in enumeration order.
    pub fn points(&self) -> impl Iterator<Item = (usize, usize, usize, f64)> + '_ {
        let nz = self.nz;
        self.energies
            .iter()
            .enumerate()
            .map(move |(i, &energy)| (self.x_index, i / nz, i % nz, energy))
    }

    pub fn non_finite_count(&self) -> usize {
        self.energies.iter().filter(|e| !e.is_finite()).count()
    }
}

/// Consumer of computed slabs. Slabs arrive in ascending x order.
pub trait GridSink {
    fn accept(&mut self, slab: &Slab) -> Result<(), EngineError>;
}

impl<S: GridSink + ?Sized> GridSink for &mut S {
    fn accept(&mut self, slab: &Slab) -> Result<(), EngineError> {
        (**self).accept(slab)
    }
}

impl<A: GridSink, B: GridSink> GridSink for (A, B) {
    fn accept(&mut self, slab: &Slab) -> Result<(), EngineError> {
        self.0.accept(slab)?;
        self.1.accept(slab)
    }
}

impl<W: Write> GridSink for CubeWriter<W> {
    fn accept(&mut self, slab: &Slab) -> Result<(), EngineError> {
        Ok(self.write_slab(slab.x_index(), slab.energies())?)
    }
}

/// In-memory energy field (K), x-major then y, z fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyField {
    counts: [usize; 3],
    values: Vec<f64>,
}

impl EnergyField {
    pub fn new(counts: [usize; 3]) -> Self {
        Self {
            counts,
            values: Vec::with_capacity(counts.iter().product()),
        }
    }

    pub fn counts(&self) -> [usize; 3] {
        self.counts
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    fn slab_len(&self) -> usize {
        self.counts[1] * self.counts[2]
    }

    fn slabs_received(&self) -> usize {
        match self.slab_len() {
            0 => 0,
            len => self.values.len() / len,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.values.len() == self.counts.iter().product::<usize>()
    }

    pub fn get(&self, ix: usize, iy: usize, iz: usize) -> Option<f64> {
        let [nx, ny, nz] = self.counts;
        if ix >= nx || iy >= ny || iz >= nz {
            return None;
        }
        self.values.get((ix * ny + iy) * nz + iz).copied()
    }

    /// Writes the complete field to `path` as a cube file.
    ///
    /// The file is staged next to `path` and renamed into place once fully
    /// written, so a failed write leaves any existing file untouched.
    pub fn write_cube(&self, path: &Path, header: &CubeHeader) -> Result<(), EngineError> {
        if !self.is_complete() {
            return Err(CubeError::Incomplete {
                expected: self.counts[0],
                written: self.slabs_received(),
            }
            .into());
        }
        let io_error = |source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        };
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(directory).map_err(io_error)?;
        let mut writer = CubeWriter::new(BufWriter::new(temp), header)?;
        for (x_index, slab) in self.values.chunks(self.slab_len().max(1)).enumerate() {
            writer.write_slab(x_index, slab)?;
        }
        let temp = writer
            .finish()?
            .into_inner()
            .map_err(|e| io_error(e.into_error()))?;
        temp.persist(path).map_err(|e| io_error(e.error))?;
        Ok(())
    }
}

impl GridSink for EnergyField {
    fn accept(&mut self, slab: &Slab) -> Result<(), EngineError> {
        let expected = self.slabs_received();
        if slab.x_index() != expected || expected >= self.counts[0] {
            return Err(EngineError::SlabOutOfOrder {
                expected,
                found: slab.x_index(),
            });
        }
        if slab.energies().len() != self.slab_len() {
            return Err(EngineError::SlabShape {
                x_index: slab.x_index(),
                expected: self.slab_len(),
                found: slab.energies().len(),
            });
        }
        self.values.extend_from_slice(slab.energies());
        Ok(())
    }
}

/// Running statistics over every delivered grid point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridSummary {
    pub points: usize,
    pub non_finite: usize,
    /// Lowest finite energy (K).
    pub min: Option<f64>,
    /// Highest finite energy (K).
    pub max: Option<f64>,
}

impl GridSink for GridSummary {
    fn accept(&mut self, slab: &Slab) -> Result<(), EngineError> {
        for &energy in slab.energies() {
            self.points += 1;
            if !energy.is_finite() {
                self.non_finite += 1;
                continue;
            }
            self.min = Some(self.min.map_or(energy, |m| m.min(energy)));
            self.max = Some(self.max.map_or(energy, |m| m.max(energy)));
        }
        Ok(())
    }
}

/// Immutable per-run data shared by every worker.
#[derive(Debug, Clone)]
pub struct GridContext {
    table: AtomTable,
    grid: SamplingGrid,
    factors: ReplicationFactors,
    cutoff: f64,
}

impl GridContext {
    /// Derives the replication factors for `cutoff` from the table's lattice.
    pub fn new(table: AtomTable, grid: SamplingGrid, cutoff: f64) -> Result<Self, EngineError> {
        let factors = replication_factors(table.lattice(), cutoff)?;
        debug!(
            nx = factors.nx,
            ny = factors.ny,
            nz = factors.nz,
            images = factors.image_count(),
            "Derived replication factors for cutoff {} Å.",
            cutoff
        );
        Ok(Self {
            table,
            grid,
            factors,
            cutoff,
        })
    }

    pub fn table(&self) -> &AtomTable {
        &self.table
    }

    pub fn grid(&self) -> &SamplingGrid {
        &self.grid
    }

    pub fn factors(&self) -> &ReplicationFactors {
        &self.factors
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn evaluator(&self) -> PotentialEvaluator<'_> {
        PotentialEvaluator::new(&self.table, &self.factors, self.cutoff)
    }
}

/// Evaluates every point of the y–z slab at `x_index`.
pub fn compute_slab(evaluator: &PotentialEvaluator, grid: &SamplingGrid, x_index: usize) -> Slab {
    let [_, ny, nz] = grid.counts();
    let mut energies = Vec::with_capacity(ny * nz);
    for iy in 0..ny {
        for iz in 0..nz {
            energies.push(evaluator.energy_at(&grid.point(x_index, iy, iz)));
        }
    }
    Slab {
        x_index,
        ny,
        nz,
        energies,
    }
}

struct SlabDelivery<'r, 'a> {
    reporter: &'r ProgressReporter<'a>,
    total: usize,
    delivered: usize,
    next_percent: usize,
}

impl<'r, 'a> SlabDelivery<'r, 'a> {
    fn start(reporter: &'r ProgressReporter<'a>, total: usize) -> Self {
        reporter.report(Progress::TaskStart {
            total: total as u64,
        });
        Self {
            reporter,
            total,
            delivered: 0,
            next_percent: 10,
        }
    }

    fn deliver<S: GridSink + ?Sized>(&mut self, slab: &Slab, sink: &mut S) -> Result<(), EngineError> {
        let non_finite = slab.non_finite_count();
        if non_finite > 0 {
            warn!(
                x_index = slab.x_index(),
                count = non_finite,
                "Slab contains non-finite energies: grid points coincide with framework atoms."
            );
        }
        trace!(x_index = slab.x_index(), "Delivering slab.");

        sink.accept(slab)?;
        self.delivered += 1;
        self.reporter.report(Progress::TaskIncrement { amount: 1 });

        let percent = self.delivered * 100 / self.total.max(1);
        if percent >= self.next_percent {
            info!(
                "Energy grid {}% complete ({}/{} slabs).",
                percent, self.delivered, self.total
            );
            self.next_percent = (percent / 10 + 1) * 10;
        }
        Ok(())
    }

    fn finish(self) {
        self.reporter.report(Progress::TaskFinish);
    }
}

/// Computes the grid slab by slab on the calling thread.
#[instrument(skip_all, name = "grid_serial")]
pub fn compute_grid_serial<S: GridSink + ?Sized>(
    context: &GridContext,
    sink: &mut S,
    reporter: &ProgressReporter,
) -> Result<(), EngineError> {
    let evaluator = context.evaluator();
    let nx = context.grid().counts()[0];

    let mut delivery = SlabDelivery::start(reporter, nx);
    for x_index in 0..nx {
        let slab = compute_slab(&evaluator, context.grid(), x_index);
        delivery.deliver(&slab, sink)?;
    }
    delivery.finish();
    Ok(())
}

/// Computes the grid on the rayon pool.
///
/// Slabs are evaluated in batches of one x-index per worker thread. Each
/// batch is collected in x order before any of its slabs reaches the sink,
/// so the sink sees the same sequence as with [`compute_grid_serial`].
#[cfg(feature = "parallel")]
#[instrument(skip_all, name = "grid_parallel")]
pub fn compute_grid_parallel<S: GridSink + ?Sized>(
    context: &GridContext,
    sink: &mut S,
    reporter: &ProgressReporter,
) -> Result<(), EngineError> {
    let evaluator = context.evaluator();
    let grid = context.grid();
    let nx = grid.counts()[0];
    let batch_size = rayon::current_num_threads().max(1);
    debug!(batch_size, "Dispatching slabs to the worker pool.");

    let batches = nx.div_ceil(batch_size);
    let mut delivery = SlabDelivery::start(reporter, nx);
    for (batch, batch_start) in (0..nx).step_by(batch_size).enumerate() {
        let batch_end = (batch_start + batch_size).min(nx);
        reporter.report(Progress::StatusUpdate {
            text: format!("batch {}/{}", batch + 1, batches),
        });
        let slabs: Vec<Slab> = (batch_start..batch_end)
            .into_par_iter()
            .map(|x_index| compute_slab(&evaluator, grid, x_index))
            .collect();
        for slab in &slabs {
            delivery.deliver(slab, sink)?;
        }
    }
    delivery.finish();
    Ok(())
}

/// Runs the driver selected by `mode`.
pub fn compute_grid<S: GridSink + ?Sized>(
    context: &GridContext,
    mode: ExecutionMode,
    sink: &mut S,
    reporter: &ProgressReporter,
) -> Result<(), EngineError> {
    let [nx, ny, nz] = context.grid().counts();
    info!(
        nx,
        ny,
        nz,
        images = context.factors().image_count(),
        atoms = context.table().len(),
        mode = ?mode,
        "Computing energy grid."
    );

    match mode {
        ExecutionMode::Serial => compute_grid_serial(context, sink, reporter),
        #[cfg(feature = "parallel")]
        ExecutionMode::Parallel => compute_grid_parallel(context, sink, reporter),
        #[cfg(not(feature = "parallel"))]
        ExecutionMode::Parallel => {
            warn!("Built without the `parallel` feature; computing the grid serially.");
            compute_grid_serial(context, sink, reporter)
        }
    }
}
