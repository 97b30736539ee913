//! Event simulation for the two-arm pixel spectrometer.
//!
//! A beam particle starts at plane 0 with `y = z = 0`, `dy/dx = 0` and
//! `dz/dx = theta_xz`. It travels in straight lines between planes, receives
//! a Gaussian multiple-scattering kick on both slopes at every plane and one
//! thin-lens deflection in y at the magnet centre. Each crossing may leave a
//! smeared hit; every plane also collects Poisson noise around the crossing.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Poisson, StandardNormal};
use serde::Serialize;
use st_core::{
    Error, EventHits, EventSource, Geometry, Hit, PhysicsConfig, Result, SourceEvent, TrueTrack,
};

/// True crossing of the particle with one plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Impact {
    /// Plane index.
    pub plane: usize,
    /// True y at the plane (cm).
    pub y: f64,
    /// True z at the plane (cm).
    pub z: f64,
    /// Whether a real hit was recorded.
    pub detected: bool,
}

/// One simulated event: reconstructable hits plus MC truth.
#[derive(Debug, Clone)]
pub struct SimulatedEvent {
    /// Hits per plane.
    pub hits: EventHits,
    /// Generated parameters at plane 0.
    pub truth: TrueTrack,
    /// True crossing points, one per plane.
    pub impacts: Vec<Impact>,
}

#[derive(Debug, Clone, Copy)]
struct Particle {
    y: f64,
    z: f64,
    dy_dx: f64,
    dz_dx: f64,
}

fn gauss<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}

/// Two-component resolution: wide Gaussian with probability `tail_amplitude`,
/// nominal Gaussian otherwise.
fn smear<R: Rng + ?Sized>(rng: &mut R, physics: &PhysicsConfig) -> f64 {
    let width = if rng.random::<f64>() < physics.tail_amplitude {
        physics.tail_width
    } else {
        physics.resolution
    };
    width * gauss(rng)
}

struct ArmContext<'a> {
    geometry: &'a Geometry,
    physics: &'a PhysicsConfig,
    theta: f64,
    noise: Option<Poisson<f64>>,
}

/// Walk the particle through one arm (`planes_per_side` planes starting at `first`).
fn traverse_arm<R: Rng + ?Sized>(
    ctx: &ArmContext<'_>,
    first: usize,
    particle: &mut Particle,
    rng: &mut R,
    hits: &mut EventHits,
    impacts: &mut Vec<Impact>,
) {
    let d = ctx.geometry.dist_between_planes();
    for j in first..first + ctx.geometry.planes_per_side() {
        if j != first {
            particle.y += d * particle.dy_dx;
            particle.z += d * particle.dz_dx;
        }
        let (y_true, z_true) = (particle.y, particle.z);

        // Scattering in this plane changes the direction towards the next one.
        particle.dy_dx += ctx.theta * gauss(rng);
        particle.dz_dx += ctx.theta * gauss(rng);

        let plane = ctx.geometry.plane(j);
        let detected =
            rng.random::<f64>() < ctx.physics.hit_efficiency && plane.contains(y_true, z_true);
        if detected {
            let y = y_true + smear(rng, ctx.physics);
            let z = z_true + smear(rng, ctx.physics);
            hits.push(j, Hit::signal(y, z));
        }

        if let Some(noise) = &ctx.noise {
            let n_noise: f64 = noise.sample(rng);
            let window = ctx.geometry.noise_window();
            for _ in 0..n_noise as usize {
                let y = y_true + (rng.random::<f64>() - 0.5) * window;
                let z = z_true + (rng.random::<f64>() - 0.5) * window;
                hits.push(j, Hit::noise(y, z));
            }
        }

        tracing::trace!(plane = j, y = y_true, z = z_true, detected, "plane crossing");
        impacts.push(Impact { plane: j, y: y_true, z: z_true, detected });
    }
}

/// Simulate one event.
///
/// The generator is advanced in a fixed order (crossing, kicks, efficiency,
/// smearing, noise, plane by plane), so a seeded generator reproduces the
/// event exactly.
pub fn simulate_event<R: Rng + ?Sized>(
    geometry: &Geometry,
    physics: &PhysicsConfig,
    rng: &mut R,
) -> Result<SimulatedEvent> {
    let n_planes = geometry.n_planes();
    if n_planes == 0 {
        return Err(Error::Validation("geometry has no planes".to_string()));
    }

    let lambda = geometry.noise_window_pixels().powi(2) * physics.noise_occupancy;
    let noise = if lambda > 0.0 {
        Some(Poisson::new(lambda).map_err(|e| {
            Error::Validation(format!("invalid noise mean {lambda}: {e}"))
        })?)
    } else {
        None
    };

    let ctx = ArmContext {
        geometry,
        physics,
        theta: physics.scattering_angle(1.0 / physics.beam_momentum),
        noise,
    };

    let truth = TrueTrack::from_physics(physics);
    let mut particle =
        Particle { y: truth.y0, z: truth.z0, dy_dx: truth.dy_dx, dz_dx: truth.dz_dx };
    let mut hits = EventHits::new(n_planes);
    let mut impacts = Vec::with_capacity(n_planes);

    traverse_arm(&ctx, 0, &mut particle, rng, &mut hits, &mut impacts);

    // Thin lens at the magnet centre, half a plane spacing downstream.
    let d = geometry.dist_between_planes();
    particle.y += particle.dy_dx * d / 2.0;
    let angle = particle.dy_dx.atan() + physics.bend_angle();
    particle.y += angle.tan() * d / 2.0;
    particle.dy_dx = angle.tan();
    particle.z += d * particle.dz_dx;

    traverse_arm(&ctx, geometry.planes_per_side(), &mut particle, rng, &mut hits, &mut impacts);

    Ok(SimulatedEvent { hits, truth, impacts })
}

/// Seeded simulator: event `i` is generated with `StdRng::seed_from_u64(seed + i)`.
#[derive(Debug, Clone)]
pub struct Simulator {
    geometry: Geometry,
    physics: PhysicsConfig,
    seed: u64,
}

impl Simulator {
    /// Create a simulator.
    pub fn new(geometry: Geometry, physics: PhysicsConfig, seed: u64) -> Self {
        Self { geometry, physics, seed }
    }

    /// Geometry used for simulation.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Physics constants used for simulation.
    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    /// Simulate event `event_index` with its own deterministic generator.
    pub fn simulate(&self, event_index: u64) -> Result<SimulatedEvent> {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(event_index));
        simulate_event(&self.geometry, &self.physics, &mut rng)
    }
}

impl EventSource for Simulator {
    fn generate(&self, event_index: u64) -> Result<SourceEvent> {
        let event = self.simulate(event_index)?;
        Ok(SourceEvent { hits: event.hits, truth: event.truth })
    }

    fn name(&self) -> &str {
        "simulation"
    }
}
