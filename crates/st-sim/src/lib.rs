//! # st-sim
//!
//! Monte-Carlo simulation of single beam tracks crossing the SpecTrack pixel
//! telescope: multiple scattering, thin-lens bending, two-component hit
//! resolution, detection inefficiency and Poisson noise hits.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Event simulation.
pub mod simulate;

pub use simulate::{Impact, SimulatedEvent, Simulator, simulate_event};
