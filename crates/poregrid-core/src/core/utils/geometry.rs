use crate::core::models::lattice::Lattice;
use thiserror::Error;

/// Smallest cell volume (Å³) accepted as non-degenerate.
pub const MIN_CELL_VOLUME: f64 = 1e-8;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Invalid cell parameter '{name}': {value}")]
    InvalidCellParameter { name: &'static str, value: f64 },

    #[error("Lattice is singular or degenerate (cell volume: {volume})")]
    SingularLattice { volume: f64 },

    #[error("Cutoff radius must be positive and finite, got {0}")]
    InvalidCutoff(f64),
}

/// Number of periodic images considered on each side of the home cell.
///
/// Images along axis `a` run from `-nx` to `+nx` inclusive, so a run visits
/// `(2nx + 1)(2ny + 1)(2nz + 1)` cells in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplicationFactors {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl ReplicationFactors {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    #[inline]
    pub fn as_array(&self) -> [usize; 3] {
        [self.nx, self.ny, self.nz]
    }

    /// Total number of periodic images, the home cell included.
    pub fn image_count(&self) -> usize {
        self.as_array().iter().map(|n| 2 * n + 1).product()
    }
}

/// Derives the replication factors required to see every periodic image
/// of the framework lying within `cutoff` of any point in the unit cell.
///
/// The count along each axis is `ceil(cutoff / w)`, where `w` is the
/// perpendicular distance between the two cell faces spanned by the other
/// two lattice vectors. For skewed cells `w` is shorter than the edge
/// length, which is why the edge itself cannot be used.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidCutoff`] for a non-positive or
/// non-finite cutoff and [`GeometryError::SingularLattice`] if the cell has
/// no volume.
pub fn replication_factors(
    lattice: &Lattice,
    cutoff: f64,
) -> Result<ReplicationFactors, GeometryError> {
    if !(cutoff.is_finite() && cutoff > 0.0) {
        return Err(GeometryError::InvalidCutoff(cutoff));
    }

    let volume = lattice.volume();
    if !volume.is_finite() || volume < MIN_CELL_VOLUME {
        return Err(GeometryError::SingularLattice { volume });
    }

    let widths = lattice.perpendicular_widths();
    let count = |width: f64| (cutoff / width).ceil() as usize;

    Ok(ReplicationFactors {
        nx: count(widths[0]),
        ny: count(widths[1]),
        nz: count(widths[2]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    fn cubic(edge: f64) -> Lattice {
        Lattice::from_parameters(edge, edge, edge, 90.0, 90.0, 90.0).unwrap()
    }

    #[test]
    fn cubic_cell_rounds_cutoff_ratio_up() {
        let factors = replication_factors(&cubic(10.0), 12.5).unwrap();
        assert_eq!(factors, ReplicationFactors::new(2, 2, 2));
    }

    #[test]
    fn exact_multiple_of_width_is_not_rounded_further() {
        let factors = replication_factors(&cubic(10.0), 20.0).unwrap();
        assert_eq!(factors, ReplicationFactors::new(2, 2, 2));
    }

    #[test]
    fn small_cutoff_still_includes_one_image_shell() {
        let factors = replication_factors(&cubic(30.0), 1.0).unwrap();
        assert_eq!(factors, ReplicationFactors::new(1, 1, 1));
    }

    #[test]
    fn orthorhombic_cell_gets_per_axis_factors() {
        let lattice = Lattice::from_parameters(5.0, 10.0, 25.0, 90.0, 90.0, 90.0).unwrap();
        let factors = replication_factors(&lattice, 12.0).unwrap();
        assert_eq!(factors, ReplicationFactors::new(3, 2, 1));
    }

    #[test]
    fn skewed_cell_uses_perpendicular_width_not_edge_length() {
        // a = b = 10 Å at 30°: the face separation is 10 * sin(30°) = 5 Å.
        let lattice = Lattice::from_parameters(10.0, 10.0, 10.0, 90.0, 90.0, 30.0).unwrap();
        let factors = replication_factors(&lattice, 9.0).unwrap();
        assert_eq!(factors.nx, 2);
        assert_eq!(factors.ny, 2);
        assert_eq!(factors.nz, 1);
    }

    #[test]
    fn image_count_includes_home_cell() {
        assert_eq!(ReplicationFactors::new(0, 0, 0).image_count(), 1);
        assert_eq!(ReplicationFactors::new(1, 2, 0).image_count(), 15);
    }

    #[test]
    fn non_positive_cutoff_is_rejected() {
        let lattice = cubic(10.0);
        assert_eq!(
            replication_factors(&lattice, 0.0),
            Err(GeometryError::InvalidCutoff(0.0))
        );
        assert!(matches!(
            replication_factors(&lattice, f64::NAN),
            Err(GeometryError::InvalidCutoff(_))
        ));
    }

    #[test]
    fn singular_lattice_is_rejected() {
        let flat = Lattice::from_matrix_unchecked(Matrix3::new(
            10.0, 0.0, 0.0, //
            0.0, 10.0, 0.0, //
            0.0, 0.0, 0.0,
        ));
        assert!(matches!(
            replication_factors(&flat, 12.0),
            Err(GeometryError::SingularLattice { .. })
        ));
    }

    #[test]
    fn factors_never_under_cover_cutoff_for_random_cells() {
        use rand::{Rng, SeedableRng, rngs::StdRng};

        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..500 {
            let a = rng.gen_range(2.0..40.0);
            let b = rng.gen_range(2.0..40.0);
            let c = rng.gen_range(2.0..40.0);
            let alpha = rng.gen_range(60.0..120.0);
            let beta = rng.gen_range(60.0..120.0);
            let gamma = rng.gen_range(60.0..120.0);
            let Ok(lattice) = Lattice::from_parameters(a, b, c, alpha, beta, gamma) else {
                continue;
            };
            let cutoff = rng.gen_range(0.5..30.0);

            let factors = replication_factors(&lattice, cutoff).unwrap();
            let widths = lattice.perpendicular_widths();
            for (n, width) in factors.as_array().into_iter().zip(widths) {
                assert!(n >= 1);
                assert!(n as f64 * width >= cutoff - 1e-9);
                if cutoff > width / 2.0 {
                    assert!(n > 0);
                }
            }
        }
    }
}
