//! Per-event hit containers.

use serde::{Deserialize, Serialize};

/// One measured pixel hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Bending-direction coordinate (cm).
    pub y: f64,
    /// Non-bending coordinate (cm).
    pub z: f64,
    /// MC truth: hit comes from noise, not from the particle.
    pub is_noise: bool,
    /// Already assigned to an accepted track.
    #[serde(default)]
    pub used: bool,
}

impl Hit {
    /// A hit produced by the particle.
    pub fn signal(y: f64, z: f64) -> Self {
        Self { y, z, is_noise: false, used: false }
    }

    /// A noise hit.
    pub fn noise(y: f64, z: f64) -> Self {
        Self { y, z, is_noise: true, used: false }
    }
}

/// Hits of one plane, in insertion order (real hit first if present).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaneHits {
    /// The hits.
    pub hits: Vec<Hit>,
}

impl PlaneHits {
    /// Number of hits.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// No hits at all.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Hit `i`.
    pub fn get(&self, i: usize) -> &Hit {
        &self.hits[i]
    }

    /// Append a hit.
    pub fn push(&mut self, hit: Hit) {
        self.hits.push(hit);
    }

    /// Whether the particle left a hit here.
    pub fn has_signal(&self) -> bool {
        self.hits.iter().any(|h| !h.is_noise)
    }

    /// Number of noise hits.
    pub fn n_noise(&self) -> usize {
        self.hits.iter().filter(|h| h.is_noise).count()
    }
}

/// All hits of one event, one entry per plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventHits {
    /// Per-plane hit lists.
    pub planes: Vec<PlaneHits>,
}

impl EventHits {
    /// Empty event with `n_planes` planes.
    pub fn new(n_planes: usize) -> Self {
        Self { planes: vec![PlaneHits::default(); n_planes] }
    }

    /// Build from per-plane hit vectors.
    pub fn from_planes(planes: Vec<Vec<Hit>>) -> Self {
        Self { planes: planes.into_iter().map(|hits| PlaneHits { hits }).collect() }
    }

    /// Number of planes.
    pub fn n_planes(&self) -> usize {
        self.planes.len()
    }

    /// Hits in plane `p`.
    pub fn plane(&self, p: usize) -> &PlaneHits {
        &self.planes[p]
    }

    /// Hit `i` of plane `p`.
    pub fn hit(&self, p: usize, i: usize) -> &Hit {
        self.planes[p].get(i)
    }

    /// Append a hit to plane `p`.
    pub fn push(&mut self, p: usize, hit: Hit) {
        self.planes[p].push(hit);
    }

    /// Total number of hits.
    pub fn n_hits(&self) -> usize {
        self.planes.iter().map(PlaneHits::len).sum()
    }

    /// Total number of noise hits.
    pub fn n_noise_hits(&self) -> usize {
        self.planes.iter().map(PlaneHits::n_noise).sum()
    }

    /// First plane without any hit.
    pub fn first_empty_plane(&self) -> Option<usize> {
        self.planes.iter().position(PlaneHits::is_empty)
    }

    /// Number of planes holding the particle's hit.
    pub fn n_planes_with_signal(&self) -> usize {
        self.planes.iter().filter(|p| p.has_signal()).count()
    }

    /// Every plane holds the particle's hit.
    pub fn is_hit_complete(&self) -> bool {
        self.n_planes_with_signal() == self.n_planes()
    }

    /// Whether every hit selected by `indices` (one per plane) is signal.
    pub fn all_signal(&self, indices: &[usize]) -> bool {
        indices.iter().enumerate().all(|(p, &i)| !self.hit(p, i).is_noise)
    }

    /// Number of noise hits among `indices` (one per plane).
    pub fn noise_count(&self, indices: &[usize]) -> usize {
        indices.iter().enumerate().filter(|&(p, &i)| self.hit(p, i).is_noise).count()
    }

    /// Flag the hits selected by `indices` (one per plane) as used.
    pub fn mark_used(&mut self, indices: &[usize]) {
        for (p, &i) in indices.iter().enumerate() {
            self.planes[p].hits[i].used = true;
        }
    }
}
