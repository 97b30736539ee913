//! # st-hist
//!
//! Run bookkeeping for SpecTrack: fixed-binning histograms of residuals,
//! pulls and chi-squares, the event/hit counters, and the JSON run artifact.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// JSON run artifact.
pub mod artifact;
/// Standard histogram set.
pub mod booking;
/// 1D histogram.
pub mod histogram;
/// Run accumulation.
pub mod results;
/// Run counters.
pub mod summary;

pub use artifact::{HistogramArtifact, PullSummary, RunArtifact, RunMeta, SCHEMA_VERSION, run_artifact};
pub use booking::TrackHistograms;
pub use histogram::Histogram1D;
pub use results::RunResults;
pub use summary::RunSummary;
