//! # poregrid Core Library
//!
//! Periodic Lennard-Jones energy grids for a probe particle in a crystalline
//! framework, written as Gaussian-cube volumetric files.
//!
//! ## Architectural Philosophy
//!
//! The library is split into three layers:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Lattice`, `Framework`),
//!   the forcefield parameters and Lennard-Jones kernel, replication-factor geometry,
//!   and the CIF reader and cube writer.
//!
//! - **[`engine`]: The Computation.** The atom parameter table, sampling grid,
//!   periodic potential evaluator, and the serial and parallel grid drivers that
//!   stream slabs into a sink.
//!
//! - **[`workflows`]: The Public API.** Complete runs from input files to a
//!   finished grid file.

pub mod core;
pub mod engine;
pub mod workflows;
