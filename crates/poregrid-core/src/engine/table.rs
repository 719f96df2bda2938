use super::error::EngineError;
use crate::core::forcefield::params::Forcefield;
use crate::core::models::framework::Framework;
use crate::core::models::lattice::Lattice;
use nalgebra::Vector3;
use tracing::debug;

/// Flattened, order-matched per-atom data consumed by the potential evaluator.
///
/// Entry `i` of every sequence describes the same framework atom. The epsilon
/// and sigma values are already the adsorbate/atom cross parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomTable {
    lattice: Lattice,
    fractional: Vec<Vector3<f64>>,
    cartesian: Vec<Vector3<f64>>,
    epsilons: Vec<f64>,
    sigmas: Vec<f64>,
}

impl AtomTable {
    /// Resolves cross parameters for every framework atom.
    ///
    /// # Errors
    ///
    /// Fails before any energy is computed if the adsorbate is unknown, an
    /// atom type has no parameters, or the framework has no atoms.
    pub fn build(
        framework: &Framework,
        forcefield: &Forcefield,
        adsorbate: &str,
    ) -> Result<Self, EngineError> {
        if !forcefield.has_adsorbate(adsorbate) {
            return Err(EngineError::UnknownAdsorbate(adsorbate.to_string()));
        }
        if framework.is_empty() {
            return Err(EngineError::EmptyFramework(framework.name().to_string()));
        }

        let mut fractional = Vec::with_capacity(framework.len());
        let mut epsilons = Vec::with_capacity(framework.len());
        let mut sigmas = Vec::with_capacity(framework.len());

        for atom in framework.atoms() {
            let param = forcefield
                .cross_parameters(adsorbate, &atom.label)
                .ok_or_else(|| EngineError::MissingParameters {
                    adsorbate: adsorbate.to_string(),
                    atom_type: atom.label.clone(),
                })?;
            fractional.push(atom.fractional);
            epsilons.push(param.epsilon);
            sigmas.push(param.sigma);
        }

        debug!(
            "Built atom table for '{}' in '{}': {} atoms, {} types.",
            adsorbate,
            framework.name(),
            fractional.len(),
            framework.atom_types().len()
        );

        Self::from_parts(*framework.lattice(), fractional, epsilons, sigmas)
    }

    /// Assembles a table from already-resolved sequences.
    pub fn from_parts(
        lattice: Lattice,
        fractional: Vec<Vector3<f64>>,
        epsilons: Vec<f64>,
        sigmas: Vec<f64>,
    ) -> Result<Self, EngineError> {
        if fractional.len() != epsilons.len() || fractional.len() != sigmas.len() {
            return Err(EngineError::Initialization(format!(
                "atom table sequences differ in length (positions: {}, epsilons: {}, sigmas: {})",
                fractional.len(),
                epsilons.len(),
                sigmas.len()
            )));
        }
        if fractional.is_empty() {
            return Err(EngineError::Initialization(
                "atom table must contain at least one atom".to_string(),
            ));
        }

        let cartesian = fractional
            .iter()
            .map(|f| lattice.to_cartesian(f))
            .collect();

        Ok(Self {
            lattice,
            fractional,
            cartesian,
            epsilons,
            sigmas,
        })
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn len(&self) -> usize {
        self.fractional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fractional.is_empty()
    }

    pub fn fractional(&self) -> &[Vector3<f64>] {
        &self.fractional
    }

    /// Cartesian positions, in the same order as [`Self::fractional`].
    pub fn cartesian(&self) -> &[Vector3<f64>] {
        &self.cartesian
    }

    pub fn epsilons(&self) -> &[f64] {
        &self.epsilons
    }

    pub fn sigmas(&self) -> &[f64] {
        &self.sigmas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::framework::FrameworkAtom;

    const FORCEFIELD: &str = r#"
        [globals]
        cutoff = 12.5

        [framework]
        C = { epsilon = 50.0, sigma = 3.4 }
        O = { epsilon = 30.0, sigma = 3.0 }

        [adsorbates]
        Ar = { epsilon = 120.0, sigma = 3.4 }
    "#;

    fn framework(labels: &[&str]) -> Framework {
        let lattice = Lattice::from_parameters(10.0, 10.0, 10.0, 90.0, 90.0, 90.0).unwrap();
        let atoms = labels
            .iter()
            .enumerate()
            .map(|(i, label)| FrameworkAtom::new(*label, Vector3::new(0.1 * i as f64, 0.5, 0.5)))
            .collect();
        Framework::new("toy", lattice, atoms)
    }

    #[test]
    fn build_aligns_positions_and_parameters() {
        let forcefield: Forcefield = FORCEFIELD.parse().unwrap();
        let table = AtomTable::build(&framework(&["C", "O", "C"]), &forcefield, "Ar").unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.epsilons().len(), 3);
        assert_eq!(table.sigmas().len(), 3);

        let c = forcefield.cross_parameters("Ar", "C").unwrap();
        let o = forcefield.cross_parameters("Ar", "O").unwrap();
        assert_eq!(table.epsilons(), &[c.epsilon, o.epsilon, c.epsilon]);
        assert_eq!(table.sigmas(), &[c.sigma, o.sigma, c.sigma]);
        assert_eq!(table.cartesian()[1], Vector3::new(1.0, 5.0, 5.0));
    }

    #[test]
    fn build_rejects_unknown_adsorbate() {
        let forcefield: Forcefield = FORCEFIELD.parse().unwrap();
        let result = AtomTable::build(&framework(&["C"]), &forcefield, "Kr");
        assert!(matches!(result, Err(EngineError::UnknownAdsorbate(name)) if name == "Kr"));
    }

    #[test]
    fn build_rejects_atom_type_without_parameters() {
        let forcefield: Forcefield = FORCEFIELD.parse().unwrap();
        let result = AtomTable::build(&framework(&["C", "Zn"]), &forcefield, "Ar");
        assert!(matches!(
            result,
            Err(EngineError::MissingParameters { atom_type, .. }) if atom_type == "Zn"
        ));
    }

    #[test]
    fn build_rejects_empty_framework() {
        let forcefield: Forcefield = FORCEFIELD.parse().unwrap();
        let result = AtomTable::build(&framework(&[]), &forcefield, "Ar");
        assert!(matches!(result, Err(EngineError::EmptyFramework(name)) if name == "toy"));
    }

    #[test]
    fn from_parts_rejects_mismatched_lengths() {
        let lattice = Lattice::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0).unwrap();
        let result = AtomTable::from_parts(lattice, vec![Vector3::zeros()], vec![1.0, 2.0], vec![3.0]);
        assert!(matches!(result, Err(EngineError::Initialization(_))));
    }
}
