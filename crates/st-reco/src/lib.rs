//! # st-reco
//!
//! Track reconstruction for the SpecTrack telescope: a Kalman filter in the
//! non-bending projection prunes hit combinations, and a global least-squares
//! fit with the full multiple-scattering covariance selects and measures
//! the track.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Kalman filter step.
pub mod filter;
/// Combinatorial track search.
pub mod finder;
/// Global least-squares fit.
pub mod global_fit;
/// Track-model matrices.
pub mod matrices;
/// Event-level reconstruction.
pub mod reconstruct;
/// Filter seeding.
pub mod seed;

pub use filter::{FilterState, FilterStep, KalmanStepper};
pub use finder::{Candidate, SearchOutcome, StageChi2, TrackFinder};
pub use global_fit::{GlobalFitResult, GlobalFitter};
pub use reconstruct::{AcceptedTrack, EventOutcome, EventReconstruction, reconstruct_event};
pub use seed::{passes_beam_profile, seed_state};
