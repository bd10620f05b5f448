//! sph_fluid - headless dam break demo
//!
//! Runs the SPH simulation without a window and logs progress.
//!
//! ```text
//! sph_fluid [2d|3d] [frames]
//! ```

use std::time::Duration;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use sph_fluid::prelude::*;

const FRAME_TIME: f32 = 1.0 / 60.0;
const DEFAULT_FRAMES: u32 = 600;
const REPORT_INTERVAL: u64 = 60;

fn main() {
    let mut args = std::env::args().skip(1);
    let mode = args.next().unwrap_or_else(|| "2d".to_string());
    let frames = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    match mode.as_str() {
        "3d" => run::<Vec3>(dam_break_3d(), frames),
        _ => run::<Vec2>(dam_break_2d(), frames),
    }
}

/// A block of water dropped into a wide tank.
fn dam_break_2d() -> FluidParams {
    FluidParams::water()
        .with_particle_count(1600)
        .with_bounds(Vec3::new(16.0, 9.0, 0.0))
        .with_interaction(2.5, 60.0)
}

fn dam_break_3d() -> FluidParams {
    FluidParams::water_3d()
        .with_particle_count(4096)
        .with_bounds(Vec3::new(12.0, 8.0, 6.0))
        .with_interaction(2.0, 40.0)
}

fn run<V: FluidVector>(params: FluidParams, frames: u32) {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()))
        .add_plugins(FluidPlugin::<V>::new(params))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
            FRAME_TIME,
        )))
        .add_systems(Update, (sweep_pointer::<V>, report_progress));

    app.finish();
    app.cleanup();

    for _ in 0..frames {
        app.update();
    }

    let state = app.world().resource::<FluidState>();
    info!(
        "finished {} frames with {} particles: density error {:.3}, max speed {:.3}",
        state.frame, state.particle_count, state.average_density_error, state.max_speed
    );
}

/// Drags an attractor back and forth through the fluid for the first few
/// seconds, then releases it.
fn sweep_pointer<V: FluidVector>(
    time: Res<Time>,
    params: Res<FluidParams>,
    mut pointer: ResMut<PointerInteraction<V>>,
) {
    let t = time.elapsed_secs();
    if t > 5.0 {
        if pointer.active {
            pointer.active = false;
            info!("pointer released at t = {t:.2}s");
        }
        return;
    }

    let reach = params.bounds_size.x * 0.3;
    let position = Vec3::new(reach * (t * 1.5).sin(), -params.bounds_size.y * 0.25, 0.0);
    *pointer = PointerInteraction::attract(
        V::from_vec3(position),
        params.interaction_radius,
        params.interaction_strength,
    );
}

fn report_progress(state: Res<FluidState>) {
    if state.frame > 0 && state.frame % REPORT_INTERVAL == 0 && state.is_changed() {
        info!(
            "frame {}: density error {:.3}, max speed {:.3}",
            state.frame, state.average_density_error, state.max_speed
        );
    }
}
