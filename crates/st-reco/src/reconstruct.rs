//! Per-event reconstruction: search, quality cut, refit and bookkeeping.

use st_core::{EventHits, Result, TrackParameter};

use crate::finder::{StageChi2, TrackFinder};
use crate::global_fit::GlobalFitResult;

/// An accepted track.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedTrack {
    /// Selected hit index in each plane.
    pub hits: Vec<usize>,
    /// Global fit with the scattering error at the beam momentum.
    pub fit: GlobalFitResult,
    /// Same hits refitted with the scattering error at the fitted momentum.
    pub refit: GlobalFitResult,
    /// Every selected hit is signal.
    pub all_signal: bool,
    /// Number of noise hits among the selected hits.
    pub noise_hits_on_track: usize,
}

/// Classification of one event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// At least one plane recorded no hit; the search was not attempted.
    Inefficient,
    /// No candidate survived, or the best one failed the global cut.
    Rejected {
        /// Best global chi-square, `None` when no candidate reached the global fit.
        chi2: Option<f64>,
        /// Every plane held the particle's own hit.
        hit_complete: bool,
    },
    /// A track was reconstructed.
    Accepted(Box<AcceptedTrack>),
}

impl EventOutcome {
    /// The accepted track, if any.
    pub fn accepted(&self) -> Option<&AcceptedTrack> {
        match self {
            EventOutcome::Accepted(track) => Some(track),
            _ => None,
        }
    }
}

/// Outcome plus search diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct EventReconstruction {
    /// Classification.
    pub outcome: EventOutcome,
    /// Filter chi-squares of all-signal partial candidates.
    pub stage_chi2: Vec<StageChi2>,
    /// Combinations that reached the global fit.
    pub n_candidates: usize,
}

/// Reconstruct at most one track in `hits`. Hits of an accepted track are
/// flagged as used.
pub fn reconstruct_event(finder: &TrackFinder, hits: &mut EventHits) -> Result<EventReconstruction> {
    if let Some(plane) = hits.first_empty_plane() {
        tracing::trace!(plane, "no hit in plane");
        return Ok(EventReconstruction {
            outcome: EventOutcome::Inefficient,
            stage_chi2: Vec::new(),
            n_candidates: 0,
        });
    }

    let search = finder.find_best_track(hits)?;
    let best_chi2 = search.best_chi2();
    let stage_chi2 = search.stage_chi2;
    let n_candidates = search.n_candidates;

    let best = match search.best {
        Some(best) if best.fit.chi2 <= finder.global_cut() => best,
        _ => {
            tracing::debug!(chi2 = ?best_chi2, n_candidates, "best track rejected");
            return Ok(EventReconstruction {
                outcome: EventOutcome::Rejected { chi2: best_chi2, hit_complete: hits.is_hit_complete() },
                stage_chi2,
                n_candidates,
            });
        }
    };

    let inv_p = best.fit.state.value(TrackParameter::InvP);
    let refit = finder.refit(hits, &best.hits, inv_p)?;
    let all_signal = hits.all_signal(&best.hits);
    let noise_hits_on_track = hits.noise_count(&best.hits);
    hits.mark_used(&best.hits);

    let track = AcceptedTrack { hits: best.hits, fit: best.fit, refit, all_signal, noise_hits_on_track };
    Ok(EventReconstruction { outcome: EventOutcome::Accepted(Box::new(track)), stage_chi2, n_candidates })
}

#[cfg(test)]
mod tests {
    use super::*;
    use st_core::{Geometry, Hit, RunConfig};

    fn finder() -> TrackFinder {
        let mut cfg = RunConfig::default();
        cfg.physics.mult_scatt_angle = 0.0;
        TrackFinder::new(&cfg).unwrap()
    }

    fn clean_event(finder: &TrackFinder) -> EventHits {
        let g: &Geometry = finder.geometry();
        let bend = finder.physics().bend_angle().tan();
        EventHits::from_planes((0..4).map(|i| vec![Hit::signal(bend * g.bend_lever_arm(i), 0.0)]).collect())
    }

    #[test]
    fn test_empty_plane_is_inefficient() {
        let finder = finder();
        let mut hits = clean_event(&finder);
        hits.planes[2].hits.clear();
        let reco = reconstruct_event(&finder, &mut hits).unwrap();
        assert_eq!(reco.outcome, EventOutcome::Inefficient);
        assert_eq!(reco.n_candidates, 0);
    }

    #[test]
    fn test_clean_event_is_accepted_and_marked() {
        let finder = finder();
        let mut hits = clean_event(&finder);
        let reco = reconstruct_event(&finder, &mut hits).unwrap();
        let track = reco.outcome.accepted().unwrap();
        assert!(track.all_signal);
        assert_eq!(track.noise_hits_on_track, 0);
        assert_eq!(track.hits, vec![0, 0, 0, 0]);
        assert!(hits.planes.iter().all(|p| p.hits[0].used));

        // A second pass finds nothing: the hits are taken.
        let again = reconstruct_event(&finder, &mut hits).unwrap();
        assert!(matches!(again.outcome, EventOutcome::Rejected { chi2: None, hit_complete: true }));
    }

    #[test]
    fn test_bad_global_chi2_is_rejected() {
        let finder = finder();
        let mut hits = clean_event(&finder);
        // y does not enter the filter, only the global fit
        hits.planes[1].hits[0].y += 0.01;
        let reco = reconstruct_event(&finder, &mut hits).unwrap();
        match reco.outcome {
            EventOutcome::Rejected { chi2: Some(chi2), hit_complete } => {
                assert!(chi2 > finder.global_cut());
                assert!(hit_complete);
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(hits.planes.iter().all(|p| !p.hits[0].used));
    }
}
