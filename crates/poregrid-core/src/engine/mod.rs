//! # Engine Module
//!
//! The energy-grid computation engine: it turns a framework and its resolved
//! Lennard-Jones parameters into a sampled energy field.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - The typed payload of one run (`GridConfig`) and its builder
//! - **Atom Table** ([`table`]) - Order-matched positions and cross parameters per framework atom
//! - **Sampling** ([`sampling`]) - Per-axis grid counts and fractional sample positions
//! - **Potential** ([`potential`]) - The periodic Lennard-Jones evaluator for a single point
//! - **Drivers** ([`driver`]) - Serial and parallel slab-wise enumeration, feeding a `GridSink`
//! - **Progress Monitoring** ([`progress`]) - Progress events and the reporter callback
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! Everything the workers read during a run lives in an immutable
//! [`driver::GridContext`] shared by reference; the only mutable state is the
//! sink, which is driven from the calling thread.

pub mod config;
pub mod driver;
pub mod error;
pub mod potential;
pub mod progress;
pub mod sampling;
pub mod table;
