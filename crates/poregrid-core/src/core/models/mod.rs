//! # Core Models Module
//!
//! Data structures describing the periodic host crystal whose energy landscape
//! is sampled by the grid engine.
//!
//! ## Key Components
//!
//! - [`lattice`] - The fractional-to-Cartesian transform of a unit cell
//! - [`framework`] - A named unit cell together with its labelled atoms
//!
//! ## Usage
//!
//! ```ignore
//! use poregrid::core::models::{framework::{Framework, FrameworkAtom}, lattice::Lattice};
//!
//! let lattice = Lattice::from_parameters(10.0, 10.0, 10.0, 90.0, 90.0, 90.0)?;
//! let atoms = vec![FrameworkAtom::new("C", Vector3::new(0.0, 0.0, 0.0))];
//! let framework = Framework::new("toy", lattice, atoms);
//! ```

pub mod framework;
pub mod lattice;
