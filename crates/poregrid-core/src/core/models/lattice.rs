use crate::core::utils::geometry::{GeometryError, MIN_CELL_VOLUME};
use nalgebra::{Matrix3, Vector3};

/// Fractional-to-Cartesian transform of a periodic unit cell.
///
/// The columns of the matrix are the Cartesian cell vectors **a**, **b** and
/// **c** (Å), so `cartesian = M * fractional`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    matrix: Matrix3<f64>,
}

impl Lattice {
    /// Builds a lattice from crystallographic cell parameters (lengths in Å,
    /// angles in degrees) in the conventional orientation: **a** along x,
    /// **b** in the xy-plane, **c** completing a right-handed frame.
    pub fn from_parameters(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self, GeometryError> {
        for (name, value) in [("a", a), ("b", b), ("c", c)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeometryError::InvalidCellParameter { name, value });
            }
        }
        for (name, value) in [("alpha", alpha), ("beta", beta), ("gamma", gamma)] {
            if !(value.is_finite() && value > 0.0 && value < 180.0) {
                return Err(GeometryError::InvalidCellParameter { name, value });
            }
        }

        let (cos_alpha, cos_beta, cos_gamma) = (cos_deg(alpha), cos_deg(beta), cos_deg(gamma));
        let sin_gamma = gamma.to_radians().sin();

        let cx = c * cos_beta;
        let cy = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let cz_sq = c * c - cx * cx - cy * cy;
        if cz_sq <= 0.0 {
            return Err(GeometryError::SingularLattice { volume: 0.0 });
        }

        #[rustfmt::skip]
        let matrix = Matrix3::new(
            a,   b * cos_gamma, cx,
            0.0, b * sin_gamma, cy,
            0.0, 0.0,           cz_sq.sqrt(),
        );
        Self::from_matrix(matrix)
    }

    /// Wraps an explicit transform whose columns are the cell vectors.
    pub fn from_matrix(matrix: Matrix3<f64>) -> Result<Self, GeometryError> {
        let lattice = Self { matrix };
        let volume = lattice.volume();
        if !volume.is_finite() || volume < MIN_CELL_VOLUME {
            return Err(GeometryError::SingularLattice { volume });
        }
        Ok(lattice)
    }

    /// Wraps a transform without validating it. Downstream geometry routines
    /// still reject singular cells.
    pub fn from_matrix_unchecked(matrix: Matrix3<f64>) -> Self {
        Self { matrix }
    }

    #[inline]
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Cartesian cell vector for `axis` (0 = a, 1 = b, 2 = c).
    #[inline]
    pub fn column(&self, axis: usize) -> Vector3<f64> {
        self.matrix.column(axis).into_owned()
    }

    #[inline]
    pub fn to_cartesian(&self, fractional: &Vector3<f64>) -> Vector3<f64> {
        self.matrix * fractional
    }

    pub fn edge_lengths(&self) -> [f64; 3] {
        [0, 1, 2].map(|axis| self.matrix.column(axis).norm())
    }

    /// Cell angles (α, β, γ) in degrees.
    pub fn angles(&self) -> [f64; 3] {
        let (a, b, c) = (self.column(0), self.column(1), self.column(2));
        [b.angle(&c), c.angle(&a), a.angle(&b)].map(f64::to_degrees)
    }

    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    /// Distances between opposite faces of the cell, one per axis.
    ///
    /// The width along **a** is `V / |b × c|` and cyclically for the others.
    pub fn perpendicular_widths(&self) -> [f64; 3] {
        let volume = self.volume();
        let (a, b, c) = (self.column(0), self.column(1), self.column(2));
        [
            volume / b.cross(&c).norm(),
            volume / c.cross(&a).norm(),
            volume / a.cross(&b).norm(),
        ]
    }
}

fn cos_deg(angle: f64) -> f64 {
    if (angle - 90.0).abs() < 1e-10 {
        0.0
    } else {
        angle.to_radians().cos()
    }
}
