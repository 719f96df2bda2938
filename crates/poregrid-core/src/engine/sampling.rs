use super::error::EngineError;
use nalgebra::Vector3;

/// Upper bound on the number of samples along one axis.
pub const MAX_AXIS_POINTS: usize = 1 << 20;

/// Number of samples along an edge: `floor(edge / spacing) + 1`.
///
/// The fractional remainder is dropped, so the realised spacing is never
/// smaller than requested by more than one sample's worth. Returns `None`
/// when the count is not finite or exceeds [`MAX_AXIS_POINTS`].
pub fn point_count(edge: f64, spacing: f64) -> Option<usize> {
    let intervals = (edge / spacing).floor();
    if !intervals.is_finite() || intervals < 0.0 || intervals >= MAX_AXIS_POINTS as f64 {
        return None;
    }
    (intervals as usize).checked_add(1)
}

/// `count` evenly spaced values over `[0, 1]`, both ends included.
///
/// A single sample sits at `0.0`.
pub fn linspace(count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let step = 1.0 / (count - 1) as f64;
            (0..count)
                .map(|i| if i + 1 == count { 1.0 } else { i as f64 * step })
                .collect()
        }
    }
}

/// Fractional sampling positions along the three cell axes.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingGrid {
    counts: [usize; 3],
    axes: [Vec<f64>; 3],
    spacing: f64,
}

impl SamplingGrid {
    pub fn new(edge_lengths: [f64; 3], spacing: f64) -> Result<Self, EngineError> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(EngineError::InvalidSpacing(spacing));
        }
        let [nx, ny, nz] = edge_lengths.map(|edge| point_count(edge, spacing));
        let counts = match (nx, ny, nz) {
            (Some(nx), Some(ny), Some(nz)) => [nx, ny, nz],
            _ => return Err(EngineError::InvalidSpacing(spacing)),
        };
        if counts
            .iter()
            .try_fold(1usize, |total, &n| total.checked_mul(n))
            .is_none()
        {
            return Err(EngineError::InvalidSpacing(spacing));
        }
        let axes = counts.map(linspace);
        Ok(Self {
            counts,
            axes,
            spacing,
        })
    }

    pub fn counts(&self) -> [usize; 3] {
        self.counts
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn axis(&self, axis: usize) -> &[f64] {
        &self.axes[axis]
    }

    pub fn total_points(&self) -> usize {
        self.counts.iter().product()
    }

    /// Points in one y–z slab.
    pub fn slab_len(&self) -> usize {
        self.counts[1] * self.counts[2]
    }

    #[inline]
    pub fn point(&self, ix: usize, iy: usize, iz: usize) -> Vector3<f64> {
        Vector3::new(self.axes[0][ix], self.axes[1][iy], self.axes[2][iz])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_count_truncates_and_includes_both_ends() {
        assert_eq!(point_count(10.0, 5.0), Some(3));
        assert_eq!(point_count(10.0, 3.0), Some(4));
        assert_eq!(point_count(25.832, 1.0), Some(26));
        assert_eq!(point_count(0.5, 1.0), Some(1));
    }

    #[test]
    fn point_count_rejects_unbounded_counts() {
        assert_eq!(point_count(10.0, 1e-300), None);
        assert_eq!(point_count(f64::MAX, 1e-10), None);
        assert_eq!(point_count(MAX_AXIS_POINTS as f64, 1.0), None);
        assert_eq!(
            point_count((MAX_AXIS_POINTS - 1) as f64, 1.0),
            Some(MAX_AXIS_POINTS)
        );
    }

    #[test]
    fn linspace_spans_unit_interval() {
        assert_eq!(linspace(3), vec![0.0, 0.5, 1.0]);
        assert_eq!(linspace(5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(1), vec![0.0]);
        assert!(linspace(0).is_empty());
    }

    #[test]
    fn linspace_is_monotonic_and_ends_exactly_at_one() {
        let values = linspace(27);
        assert_eq!(values.first(), Some(&0.0));
        assert_eq!(values.last(), Some(&1.0));
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn grid_over_orthorhombic_cell() {
        let grid = SamplingGrid::new([10.0, 20.0, 0.4], 5.0).unwrap();
        assert_eq!(grid.counts(), [3, 5, 1]);
        assert_eq!(grid.total_points(), 15);
        assert_eq!(grid.slab_len(), 5);
        assert_eq!(grid.axis(2), &[0.0]);
        assert_eq!(grid.point(2, 1, 0), Vector3::new(1.0, 0.25, 0.0));
    }

    #[test]
    fn grid_rejects_invalid_spacing() {
        for spacing in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e-300, f64::MIN_POSITIVE] {
            assert!(matches!(
                SamplingGrid::new([10.0, 10.0, 10.0], spacing),
                Err(EngineError::InvalidSpacing(_))
            ));
        }
    }
}
