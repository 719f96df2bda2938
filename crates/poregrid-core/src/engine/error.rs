use std::path::PathBuf;
use thiserror::Error;

use super::config::ConfigError;
use crate::core::forcefield::params::ParamLoadError;
use crate::core::io::cif::CifError;
use crate::core::io::cube::CubeError;
use crate::core::utils::geometry::GeometryError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load forcefield: {source}")]
    Forcefield {
        #[from]
        source: ParamLoadError,
    },

    #[error("Failed to read framework structure: {source}")]
    Framework {
        #[from]
        source: CifError,
    },

    #[error("Adsorbate '{0}' is not defined in the forcefield")]
    UnknownAdsorbate(String),

    #[error("No Lennard-Jones parameters for atom type '{atom_type}' interacting with '{adsorbate}'")]
    MissingParameters {
        adsorbate: String,
        atom_type: String,
    },

    #[error("Framework '{0}' contains no atoms")]
    EmptyFramework(String),

    #[error("Invalid grid spacing {0}: must be positive and finite with a bounded point count")]
    InvalidSpacing(f64),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Slab {found} arrived out of order (expected slab {expected})")]
    SlabOutOfOrder { expected: usize, found: usize },

    #[error("Slab {x_index} has {found} values, expected {expected}")]
    SlabShape {
        x_index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Failed to write energy grid: {0}")]
    Output(#[from] CubeError),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
