//! Core traits for SpecTrack
//!
//! The run loop only needs "give me event i"; the simulator is one
//! implementation, recorded or handcrafted events are others.

use crate::Result;
use crate::event::EventHits;
use crate::types::TrueTrack;

/// Hits of one event together with the track that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvent {
    /// Hits per plane.
    pub hits: EventHits,
    /// Generated parameters at plane 0.
    pub truth: TrueTrack,
}

/// Source of per-event hit collections.
///
/// Implementations must be deterministic in `event_index` so that events can
/// be produced in any order (or in parallel) with identical results.
pub trait EventSource: Send + Sync {
    /// Produce event `event_index`.
    fn generate(&self, event_index: u64) -> Result<SourceEvent>;

    /// Source name (e.g. "simulation").
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Hit;

    struct FixedSource;

    impl EventSource for FixedSource {
        fn generate(&self, event_index: u64) -> Result<SourceEvent> {
            let y = event_index as f64 * 1e-3;
            Ok(SourceEvent {
                hits: EventHits::from_planes(vec![vec![Hit::signal(y, 0.0)]; 4]),
                truth: TrueTrack { z0: 0.0, dz_dx: 0.0, y0: y, dy_dx: 0.0, inv_p: 20.0 },
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_fixed_source() {
        let src = FixedSource;
        assert_eq!(src.name(), "fixed");
        let ev = src.generate(3).unwrap();
        assert_eq!(ev.hits.n_planes(), 4);
        assert!((ev.hits.hit(0, 0).y - 0.003).abs() < 1e-15);
        assert_eq!(ev.truth.y0, ev.hits.hit(0, 0).y);
    }
}
