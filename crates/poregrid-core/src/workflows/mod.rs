//! # Workflows Module
//!
//! High-level entry points that tie the [`core`](crate::core) data sources and
//! the [`engine`](crate::engine) together.
//!
//! - **Grid Workflow** ([`grid`]) - Loads a framework and forcefield, computes the
//!   energy grid for one adsorbate and writes it atomically as a cube file.

pub mod grid;
