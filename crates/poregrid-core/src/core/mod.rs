//! # Core Module
//!
//! Stateless building blocks of the energy-grid engine: the crystal framework
//! model, the Lennard-Jones forcefield, file formats and lattice geometry.
//!
//! ## Architecture
//!
//! - **Crystal Representation** ([`models`]) - Unit-cell lattice and framework atoms
//! - **Interaction Model** ([`forcefield`]) - Lennard-Jones parameters, mixing rules and kernel
//! - **File I/O** ([`io`]) - CIF framework input and cube volumetric output
//! - **Geometry** ([`utils`]) - Periodic replication factors derived from the lattice

pub mod forcefield;
pub mod io;
pub mod models;
pub mod utils;
