//! Provides input/output functionality for crystal structures and volumetric grids.
//!
//! Frameworks are read from P1 CIF files through the [`traits::FrameworkFile`]
//! interface; energy grids are written as Gaussian cube files by [`cube`].

pub mod cif;
pub mod cube;
pub mod traits;
