use super::lattice::Lattice;
use nalgebra::Vector3;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameworkAtom {
    /// Force-field type label used to look up Lennard-Jones parameters.
    pub label: String,
    /// Fractional position, wrapped into `[0, 1)`.
    pub fractional: Vector3<f64>,
}

impl FrameworkAtom {
    pub fn new(label: impl Into<String>, fractional: Vector3<f64>) -> Self {
        Self {
            label: label.into(),
            fractional: fractional.map(wrap_fractional),
        }
    }
}

/// A periodic crystal framework: one unit cell and the atoms inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Framework {
    name: String,
    lattice: Lattice,
    atoms: Vec<FrameworkAtom>,
}

impl Framework {
    pub fn new(name: impl Into<String>, lattice: Lattice, atoms: Vec<FrameworkAtom>) -> Self {
        Self {
            name: name.into(),
            lattice,
            atoms,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn atoms(&self) -> &[FrameworkAtom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn edge_lengths(&self) -> [f64; 3] {
        self.lattice.edge_lengths()
    }

    /// Distinct atom type labels, sorted.
    pub fn atom_types(&self) -> BTreeSet<&str> {
        self.atoms.iter().map(|atom| atom.label.as_str()).collect()
    }
}

#[inline]
fn wrap_fractional(value: f64) -> f64 {
    let wrapped = value.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}
