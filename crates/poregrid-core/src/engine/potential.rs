use super::table::AtomTable;
use crate::core::forcefield::potentials::lennard_jones_12_6;
use crate::core::utils::geometry::ReplicationFactors;
use itertools::iproduct;
use nalgebra::Vector3;

/// Integer lattice offsets `(i, j, k)` of every periodic image considered,
/// with `i ∈ [-nx, nx]`, `j ∈ [-ny, ny]` and `k ∈ [-nz, nz]`.
pub fn image_offsets(factors: &ReplicationFactors) -> impl Iterator<Item = Vector3<f64>> {
    let [nx, ny, nz] = factors.as_array().map(|n| n as i64);
    iproduct!(-nx..=nx, -ny..=ny, -nz..=nz).map(|(i, j, k)| Vector3::new(i as f64, j as f64, k as f64))
}

/// Lennard-Jones energy of a probe at Cartesian `point` with every atom of
/// the table, ignoring pairs at or beyond the cutoff.
pub fn sum_over_atoms(point: &Vector3<f64>, table: &AtomTable, cutoff_sq: f64) -> f64 {
    table
        .cartesian()
        .iter()
        .zip(table.epsilons())
        .zip(table.sigmas())
        .map(|((atom, &epsilon), &sigma)| {
            let dist_sq = (atom - point).norm_squared();
            if dist_sq < cutoff_sq {
                lennard_jones_12_6(dist_sq, epsilon, sigma)
            } else {
                0.0
            }
        })
        .sum()
}

/// Periodic Lennard-Jones evaluator for a single probe position.
///
/// Image translations are converted to Cartesian space once at construction,
/// so an evaluation is a plain double loop over images and atoms. The
/// evaluator only borrows immutable data and can be shared across threads.
///
/// A probe that coincides exactly with a framework atom (or one of its
/// images) has an undefined energy; the returned value is then non-finite.
#[derive(Debug, Clone)]
pub struct PotentialEvaluator<'a> {
    table: &'a AtomTable,
    translations: Vec<Vector3<f64>>,
    cutoff_sq: f64,
}

impl<'a> PotentialEvaluator<'a> {
    pub fn new(table: &'a AtomTable, factors: &ReplicationFactors, cutoff: f64) -> Self {
        let lattice = table.lattice();
        let translations = image_offsets(factors)
            .map(|offset| lattice.to_cartesian(&offset))
            .collect();
        Self {
            table,
            translations,
            cutoff_sq: cutoff * cutoff,
        }
    }

    pub fn image_count(&self) -> usize {
        self.translations.len()
    }

    /// Energy (K) at a probe position given in fractional coordinates.
    pub fn energy_at(&self, point_fractional: &Vector3<f64>) -> f64 {
        let point = self.table.lattice().to_cartesian(point_fractional);
        self.translations
            .iter()
            .map(|translation| sum_over_atoms(&(point + translation), self.table, self.cutoff_sq))
            .sum()
    }
}

/// Total Lennard-Jones energy (K) at `point_fractional`, summed over all atoms
/// and all periodic images selected by `factors`.
pub fn energy_at_point(
    point_fractional: &Vector3<f64>,
    table: &AtomTable,
    factors: &ReplicationFactors,
    cutoff: f64,
) -> f64 {
    PotentialEvaluator::new(table, factors, cutoff).energy_at(point_fractional)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::potentials::lennard_jones_minimum_distance;
    use crate::core::models::lattice::Lattice;
    use crate::core::utils::geometry::replication_factors;

    const TOLERANCE: f64 = 1e-9;

    fn single_atom_table(edge: f64, epsilon: f64, sigma: f64) -> AtomTable {
        let lattice = Lattice::from_parameters(edge, edge, edge, 90.0, 90.0, 90.0).unwrap();
        AtomTable::from_parts(lattice, vec![Vector3::zeros()], vec![epsilon], vec![sigma]).unwrap()
    }

    #[test]
    fn image_offsets_cover_symmetric_ranges() {
        let offsets: Vec<_> = image_offsets(&ReplicationFactors::new(1, 0, 2)).collect();
        assert_eq!(offsets.len(), 15);
        assert!(offsets.contains(&Vector3::new(-1.0, 0.0, -2.0)));
        assert!(offsets.contains(&Vector3::new(1.0, 0.0, 2.0)));
        assert!(offsets.iter().all(|o| o.y == 0.0));
    }

    #[test]
    fn image_offsets_for_zero_factors_is_home_cell_only() {
        let offsets: Vec<_> = image_offsets(&ReplicationFactors::default()).collect();
        assert_eq!(offsets, vec![Vector3::zeros()]);
    }

    #[test]
    fn energy_beyond_cutoff_in_all_directions_is_zero() {
        // Every image of the atom is over 17 Å from the cell centre.
        let table = single_atom_table(20.0, 100.0, 3.0);
        let factors = replication_factors(table.lattice(), 8.0).unwrap();
        let energy = energy_at_point(&Vector3::new(0.5, 0.5, 0.5), &table, &factors, 8.0);
        assert_eq!(energy, 0.0);
    }

    #[test]
    fn energy_at_lennard_jones_minimum_equals_negative_epsilon() {
        let sigma = 3.0;
        let r_min = lennard_jones_minimum_distance(sigma);
        let edge = 40.0;
        // Cutoff below the distance to any other image: only one pair counts.
        let cutoff = 10.0;
        let table = single_atom_table(edge, 100.0, sigma);
        let factors = replication_factors(table.lattice(), cutoff).unwrap();

        let point = Vector3::new(r_min / edge, 0.0, 0.0);
        let energy = energy_at_point(&point, &table, &factors, cutoff);
        assert!((energy + 100.0).abs() < TOLERANCE);
    }

    #[test]
    fn pair_exactly_at_cutoff_contributes_nothing() {
        let table = single_atom_table(40.0, 100.0, 3.0);
        let factors = ReplicationFactors::new(1, 1, 1);
        let point = Vector3::new(0.25, 0.0, 0.0);
        assert_eq!(energy_at_point(&point, &table, &factors, 10.0), 0.0);
        assert!(energy_at_point(&point, &table, &factors, 10.0 + 1e-6) < 0.0);
    }

    #[test]
    fn energy_sums_contributions_from_periodic_images() {
        // Probe halfway between an atom and its +x image: two identical pairs.
        let table = single_atom_table(8.0, 100.0, 3.0);
        let cutoff = 4.5;
        let factors = replication_factors(table.lattice(), cutoff).unwrap();
        let energy = energy_at_point(&Vector3::new(0.5, 0.0, 0.0), &table, &factors, cutoff);
        let expected = 2.0 * lennard_jones_12_6(16.0, 100.0, 3.0);
        assert!((energy - expected).abs() < TOLERANCE);
    }

    #[test]
    fn probe_on_atom_is_non_finite() {
        let table = single_atom_table(10.0, 100.0, 3.0);
        let factors = replication_factors(table.lattice(), 12.5).unwrap();
        let energy = energy_at_point(&Vector3::zeros(), &table, &factors, 12.5);
        assert!(!energy.is_finite());
    }

    #[test]
    fn increasing_replication_beyond_derived_factors_does_not_change_energy() {
        let lattice = Lattice::from_parameters(7.0, 8.0, 9.0, 75.0, 100.0, 110.0).unwrap();
        let table = AtomTable::from_parts(
            lattice,
            vec![
                Vector3::new(0.1, 0.2, 0.3),
                Vector3::new(0.6, 0.7, 0.1),
                Vector3::new(0.9, 0.4, 0.8),
            ],
            vec![50.0, 80.0, 30.0],
            vec![3.0, 3.4, 2.8],
        )
        .unwrap();
        let cutoff = 12.5;
        let factors = replication_factors(&lattice, cutoff).unwrap();
        let wider = ReplicationFactors::new(factors.nx + 2, factors.ny + 2, factors.nz + 2);

        for point in [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.35, 0.55, 0.65),
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(0.5, 0.05, 0.95),
        ] {
            let derived = energy_at_point(&point, &table, &factors, cutoff);
            let reference = energy_at_point(&point, &table, &wider, cutoff);
            assert!(
                (derived - reference).abs() <= 1e-9 * reference.abs().max(1.0),
                "point {point:?}: {derived} vs {reference}"
            );
        }
    }

    #[test]
    fn evaluator_counts_images() {
        let table = single_atom_table(10.0, 1.0, 1.0);
        let evaluator = PotentialEvaluator::new(&table, &ReplicationFactors::new(2, 2, 2), 12.5);
        assert_eq!(evaluator.image_count(), 125);
    }
}
