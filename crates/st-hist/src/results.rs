//! Per-run accumulation of counters and histograms.

use st_core::{EventHits, Result, RunConfig, TrueTrack};
use st_reco::EventReconstruction;

use crate::booking::TrackHistograms;
use crate::summary::RunSummary;

/// Everything a run accumulates over its events.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResults {
    /// Event and hit counters.
    pub summary: RunSummary,
    /// Quality histograms.
    pub histograms: TrackHistograms,
}

impl RunResults {
    /// Empty results for a run configuration.
    pub fn new(config: &RunConfig) -> Result<Self> {
        Ok(Self { summary: RunSummary::default(), histograms: TrackHistograms::book(config)? })
    }

    /// Record one reconstructed event. `hits` is the event after reconstruction.
    pub fn record(&mut self, reco: &EventReconstruction, hits: &EventHits, truth: &TrueTrack) {
        self.summary.record(&reco.outcome, hits);
        self.histograms.fill_stage_chi2(&reco.stage_chi2);
        if let Some(track) = reco.outcome.accepted() {
            self.histograms.fill_accepted(track, truth);
        }
    }

    /// Add the results of another partial run with the same configuration.
    pub fn merge(&mut self, other: &RunResults) -> Result<()> {
        self.summary.merge(&other.summary);
        self.histograms.merge(&other.histograms)
    }
}
