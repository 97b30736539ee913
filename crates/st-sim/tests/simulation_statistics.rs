//! Statistical properties of the simulated detector response.

use rand::SeedableRng;
use rand::rngs::StdRng;
use st_core::{Geometry, GeometryConfig, PhysicsConfig};
use st_sim::{Simulator, simulate_event};

fn geometry() -> Geometry {
    Geometry::from_config(&GeometryConfig::default()).unwrap()
}

#[test]
fn hit_efficiency_matches_configuration() {
    let physics = PhysicsConfig {
        mult_scatt_angle: 0.0,
        noise_occupancy: 0.0,
        hit_efficiency: 0.9,
        ..PhysicsConfig::default()
    };
    let sim = Simulator::new(geometry(), physics, 2024);

    let n_events = 2000u64;
    let mut n_hits = 0usize;
    for i in 0..n_events {
        n_hits += sim.simulate(i).unwrap().hits.n_hits();
    }
    let eff = n_hits as f64 / (4 * n_events) as f64;
    assert!((eff - 0.9).abs() < 0.02, "eff={eff}");
}

#[test]
fn nominal_resolution_without_tails() {
    let physics = PhysicsConfig {
        mult_scatt_angle: 0.0,
        noise_occupancy: 0.0,
        hit_efficiency: 1.0,
        tail_amplitude: 0.0,
        ..PhysicsConfig::default()
    };
    let g = geometry();
    let mut rng = StdRng::seed_from_u64(11);

    let mut sum_sq = 0.0;
    let mut n = 0usize;
    for _ in 0..2000 {
        let ev = simulate_event(&g, &physics, &mut rng).unwrap();
        for (p, plane) in ev.hits.planes.iter().enumerate() {
            let dz = plane.hits[0].z - ev.impacts[p].z;
            sum_sq += dz * dz;
            n += 1;
        }
    }
    let rms = (sum_sq / n as f64).sqrt();
    assert!((rms / physics.resolution - 1.0).abs() < 0.05, "rms={rms}");
}

#[test]
fn tails_widen_the_residuals() {
    let base = PhysicsConfig {
        mult_scatt_angle: 0.0,
        noise_occupancy: 0.0,
        hit_efficiency: 1.0,
        ..PhysicsConfig::default()
    };
    let g = geometry();

    let rms_for = |tail_amplitude: f64| {
        let physics = PhysicsConfig { tail_amplitude, ..base.clone() };
        let mut rng = StdRng::seed_from_u64(5);
        let mut sum_sq = 0.0;
        let mut n = 0usize;
        for _ in 0..2000 {
            let ev = simulate_event(&g, &physics, &mut rng).unwrap();
            for (p, plane) in ev.hits.planes.iter().enumerate() {
                let dy = plane.hits[0].y - ev.impacts[p].y;
                sum_sq += dy * dy;
                n += 1;
            }
        }
        (sum_sq / n as f64).sqrt()
    };

    // 10% at 3x the width: rms^2 = 0.9 s^2 + 0.1 * 9 s^2 = 1.8 s^2
    let ratio = rms_for(0.1) / rms_for(0.0);
    assert!((ratio - 1.8f64.sqrt()).abs() < 0.1, "ratio={ratio}");
}

#[test]
fn scattering_spreads_downstream_impacts() {
    let physics = PhysicsConfig {
        noise_occupancy: 0.0,
        hit_efficiency: 1.0,
        tail_amplitude: 0.0,
        ..PhysicsConfig::default()
    };
    let g = geometry();
    let mut rng = StdRng::seed_from_u64(17);

    // z at plane 1 receives one kick from plane 0: sigma = theta0/p * d.
    let theta = physics.mult_scatt_angle / physics.beam_momentum;
    let mut sum_sq = 0.0;
    let n = 4000;
    for _ in 0..n {
        let ev = simulate_event(&g, &physics, &mut rng).unwrap();
        sum_sq += ev.impacts[1].z.powi(2);
    }
    let rms = (sum_sq / n as f64).sqrt();
    let expected = theta * g.dist_between_planes();
    assert!((rms / expected - 1.0).abs() < 0.05, "rms={rms} expected={expected}");
}
