//! End-to-end fluid scenarios
//!
//! Drives the public simulation API through whole frames and checks
//! containment, wall response, neighbor search and reproducibility.

use sph_fluid::prelude::*;

use bevy::prelude::{Vec2, Vec3};

fn all_finite<V: FluidVector>(values: &[V]) -> bool {
    values
        .iter()
        .all(|v| (0..V::DIM).all(|axis| v.axis(axis).is_finite()))
}

/// Gravity shows up in the predicted positions after one tiny substep
#[test]
fn test_prediction_after_single_substep() {
    let params = FluidParams::default()
        .with_particle_count(4)
        .with_particle_radius(0.1)
        .with_gravity(9.81)
        .with_substeps(1)
        .with_bounds(Vec3::splat(10.0))
        .with_spawn(SpawnLayout::Grid { spacing_factor: 0.0 });
    let lookahead = params.lookahead;

    let mut sim = FluidSimulation2d::configure(params).unwrap();
    let initial = sim.positions().to_vec();

    // 2x2 block with spacing 2r + 0.01.
    assert!((initial[1].x - initial[0].x - 0.21).abs() < 1e-6);
    assert!((initial[2].y - initial[0].y - 0.21).abs() < 1e-6);

    sim.advance(0.001);

    let expected_drop = 9.81 * 0.001 * lookahead;
    for (start, predicted) in initial.iter().zip(sim.predicted_positions()) {
        let drop = start.y - predicted.y;
        assert!(
            (drop - expected_drop).abs() < 1e-7,
            "predicted drop {drop}, expected {expected_drop}"
        );
        assert_eq!(start.x, predicted.x);
    }
}

/// A particle hitting the floor keeps only the dampened, reflected velocity
#[test]
fn test_floor_collision_dampening() {
    let params = FluidParams::default()
        .with_substeps(1)
        .with_collision_dampening(0.82);
    let floor = -params.half_extent::<Vec2>().y;

    let mut sim = FluidSimulation2d::from_particles(
        params,
        vec![Vec2::new(0.0, floor + 0.001)],
        vec![Vec2::new(1.0, -3.0)],
    )
    .unwrap();

    let dt = 0.01;
    sim.advance(dt);

    let pre_collision = -3.0 - 9.81 * dt;
    let velocity = sim.velocities()[0];
    assert!(
        (velocity.y - (-pre_collision * 0.82)).abs() < 1e-4,
        "velocity after bounce: {velocity:?}"
    );
    assert_eq!(velocity.x, 1.0);
    assert_eq!(sim.positions()[0].y, floor);
}

/// Random 2D fluid never leaves the box
#[test]
fn test_boundary_containment_2d() {
    let params = FluidParams::default()
        .with_particle_count(300)
        .with_spawn(SpawnLayout::Random { seed: 11 });
    let mut sim = FluidSimulation2d::configure(params).unwrap();

    for frame in 0..120 {
        sim.advance(1.0 / 60.0);
        assert!(all_finite(sim.positions()), "non-finite position at frame {frame}");
        assert!(
            sim.positions().iter().all(|p| sim.boundary().contains(*p)),
            "particle escaped at frame {frame}"
        );
    }
}

/// Random 3D fluid never leaves the box, including the Z walls
#[test]
fn test_boundary_containment_3d() {
    let params = FluidParams::water_3d()
        .with_particle_count(400)
        .with_bounds(Vec3::new(6.0, 6.0, 3.0))
        .with_spawn(SpawnLayout::Random { seed: 12 });
    let mut sim = FluidSimulation3d::configure(params).unwrap();

    for frame in 0..60 {
        sim.advance(1.0 / 60.0);
        assert!(all_finite(sim.positions()), "non-finite position at frame {frame}");
        assert!(
            sim.positions().iter().all(|p| sim.boundary().contains(*p)),
            "particle escaped at frame {frame}"
        );
    }

    let half = sim.boundary().half_extent();
    assert!(sim.positions().iter().all(|p| p.z.abs() <= half.z));
}

/// The grid built during a frame finds exactly the brute-force neighbors
#[test]
fn test_grid_complete_on_simulated_state() {
    let params = FluidParams::default()
        .with_particle_count(250)
        .with_spawn(SpawnLayout::Random { seed: 21 });
    let mut sim = FluidSimulation2d::configure(params).unwrap();
    for _ in 0..10 {
        sim.advance(1.0 / 60.0);
    }

    let h = sim.params().smoothing_radius;
    let predicted = sim.predicted_positions();
    for (i, &origin) in predicted.iter().enumerate() {
        let mut found: Vec<usize> = sim
            .grid()
            .neighbors_within(origin, predicted, h)
            .into_iter()
            .map(|(j, _)| j)
            .collect();
        found.sort_unstable();

        let expected: Vec<usize> = (0..predicted.len())
            .filter(|&j| (predicted[j] - origin).length_squared() < h * h)
            .collect();
        assert_eq!(found, expected, "neighbor mismatch for particle {i}");
    }
}

/// Identical configurations produce identical trajectories
#[test]
fn test_simulation_is_deterministic() {
    let params = FluidParams::default()
        .with_particle_count(200)
        .with_spawn(SpawnLayout::Random { seed: 5 });

    let mut a = FluidSimulation2d::configure(params.clone()).unwrap();
    let mut b = FluidSimulation2d::configure(params).unwrap();
    for _ in 0..30 {
        a.advance(1.0 / 60.0);
        b.advance(1.0 / 60.0);
    }

    assert_eq!(a.positions(), b.positions());
    assert_eq!(a.velocities(), b.velocities());
}

/// A dam break falls and spreads under gravity
#[test]
fn test_dam_break_falls() {
    let params = FluidParams::default()
        .with_particle_count(400)
        .with_bounds(Vec3::new(12.0, 8.0, 0.0));
    let mut sim = FluidSimulation2d::configure(params).unwrap();

    let mean_y = |sim: &FluidSimulation2d| sim.positions().iter().map(|p| p.y).sum::<f32>() / 400.0;
    let start = mean_y(&sim);

    for _ in 0..90 {
        sim.advance(1.0 / 60.0);
    }

    assert!(mean_y(&sim) < start - 0.5, "fluid should have dropped");
    assert!(all_finite(sim.velocities()));
}
