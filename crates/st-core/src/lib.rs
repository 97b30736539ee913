//! # st-core
//!
//! Core types for SpecTrack, a toy pixel-spectrometer simulation and
//! Kalman-filter track reconstruction.
//!
//! This crate holds everything the simulator and the reconstruction share:
//! run configuration, telescope geometry, per-event hit containers, fitted
//! track states and the common error type.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Run configuration (geometry, physics, cuts, run settings).
pub mod config;
/// Error type.
pub mod error;
/// Per-event hit containers.
pub mod event;
/// Telescope geometry.
pub mod geometry;
/// Event source seam.
pub mod traits;
/// Track parameters and states.
pub mod types;

pub use config::{CutConfig, GeometryConfig, PhysicsConfig, RunConfig, RunSettings};
pub use error::{Error, Result};
pub use event::{EventHits, Hit, PlaneHits};
pub use geometry::{Geometry, Plane};
pub use traits::{EventSource, SourceEvent};
pub use types::{TrackParameter, TrackState, TrueTrack};

/// Crate version, reported in run artifacts.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
