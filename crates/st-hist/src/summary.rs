//! Run counters.

use std::fmt;

use serde::{Deserialize, Serialize};
use st_core::EventHits;
use st_reco::EventOutcome;

/// Event and hit counters of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Simulated events.
    pub generated: u64,
    /// Accepted tracks.
    pub reconstructed: u64,
    /// Accepted tracks made only of signal hits.
    pub reconstructed_without_noise: u64,
    /// Events with at least one plane without hits.
    pub lost_missing_hit: u64,
    /// Events whose best candidate failed the cuts, or had none.
    pub lost_quality_cuts: u64,
    /// Of those, events where every plane held the particle's hit.
    pub good_lost_quality_cuts: u64,
    /// Hits in all events.
    pub total_hits: u64,
    /// Noise hits in all events.
    pub noise_hits: u64,
    /// Noise hits picked up by accepted tracks.
    pub used_noise_hits: u64,
    /// Hits on every accepted track (one per plane).
    pub hits_per_track: usize,
}

impl RunSummary {
    /// Count one reconstructed event.
    pub fn record(&mut self, outcome: &EventOutcome, hits: &EventHits) {
        self.generated += 1;
        self.total_hits += hits.n_hits() as u64;
        self.noise_hits += hits.n_noise_hits() as u64;
        self.hits_per_track = hits.n_planes();

        match outcome {
            EventOutcome::Inefficient => self.lost_missing_hit += 1,
            EventOutcome::Rejected { hit_complete, .. } => {
                self.lost_quality_cuts += 1;
                if *hit_complete {
                    self.good_lost_quality_cuts += 1;
                }
            }
            EventOutcome::Accepted(track) => {
                self.reconstructed += 1;
                if track.all_signal {
                    self.reconstructed_without_noise += 1;
                }
                self.used_noise_hits += track.noise_hits_on_track as u64;
            }
        }
    }

    /// Add the counters of another partial run.
    pub fn merge(&mut self, other: &RunSummary) {
        self.generated += other.generated;
        self.reconstructed += other.reconstructed;
        self.reconstructed_without_noise += other.reconstructed_without_noise;
        self.lost_missing_hit += other.lost_missing_hit;
        self.lost_quality_cuts += other.lost_quality_cuts;
        self.good_lost_quality_cuts += other.good_lost_quality_cuts;
        self.total_hits += other.total_hits;
        self.noise_hits += other.noise_hits;
        self.used_noise_hits += other.used_noise_hits;
        self.hits_per_track = self.hits_per_track.max(other.hits_per_track);
    }

    /// Fraction of generated events with an accepted track.
    pub fn efficiency(&self) -> f64 {
        if self.generated == 0 { 0.0 } else { self.reconstructed as f64 / self.generated as f64 }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Generated tracks                          {}", self.generated)?;
        writeln!(f, "Reconstructed tracks                      {}", self.reconstructed)?;
        writeln!(f, "Reconstructed tracks without noise hits   {}", self.reconstructed_without_noise)?;
        writeln!(f, "Tracks lost due to missing hit            {}", self.lost_missing_hit)?;
        writeln!(f, "Tracks lost to quality cuts               {}", self.lost_quality_cuts)?;
        writeln!(f, "Tracks with all hits lost to quality cuts {}", self.good_lost_quality_cuts)?;
        writeln!(f, "Total hits                                {}", self.total_hits)?;
        writeln!(f, "Noise hits                                {}", self.noise_hits)?;
        writeln!(f, "Used noise hits                           {}", self.used_noise_hits)?;
        write!(f, "Hits per track                            {}", self.hits_per_track)
    }
}
