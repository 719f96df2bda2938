//! # Force Field Module
//!
//! Pairwise Lennard-Jones parameters for adsorbate/framework interactions and
//! the scalar potential kernel evaluated by the grid engine.
//!
//! ## Overview
//!
//! A forcefield file lists Lennard-Jones parameters for every framework atom
//! type and every adsorbate, plus the interaction cutoff. Cross parameters for
//! an adsorbate/atom-type pair come either from an explicit `[pairs]` entry or
//! from the configured mixing rule.
//!
//! ## Key Components
//!
//! - [`params`] - Forcefield file model, mixing rules and loading
//! - [`potentials`] - The Lennard-Jones 12-6 kernel
//!
//! ## Usage
//!
//! ```ignore
//! use poregrid::core::forcefield::params::Forcefield;
//!
//! let forcefield = Forcefield::load(Path::new("uff.toml"))?;
//! let param = forcefield.cross_parameters("CH4", "Zn");
//! ```

pub mod params;
pub mod potentials;
