//! Bevy plugin for fluid simulation.

use std::marker::PhantomData;

use bevy::prelude::*;

use super::interaction::PointerInteraction;
use super::params::FluidParams;
use super::simulation::FluidSimulation;
use super::vector::FluidVector;

/// Longest frame the simulation will integrate in one update.
pub const MAX_FRAME_TIME: f32 = 1.0 / 30.0;

/// Frame length used for a single step while paused.
pub const SINGLE_STEP_TIME: f32 = 1.0 / 60.0;

/// Plugin that adds an SPH fluid simulation to a Bevy app.
///
/// `V` selects the dimension: [`Vec2`] or [`Vec3`]. The simulation is
/// configured once when the plugin is built; later edits to the
/// [`FluidParams`] resource are pushed into the running simulation.
///
/// # Example
///
/// ```rust,ignore
/// use bevy::prelude::*;
/// use sph_fluid::prelude::*;
///
/// fn main() {
///     App::new()
///         .add_plugins(MinimalPlugins)
///         .add_plugins(FluidPlugin2d::new(FluidParams::water()))
///         .run();
/// }
/// ```
pub struct FluidPlugin<V: FluidVector> {
    params: FluidParams,
    _dimension: PhantomData<fn() -> V>,
}

pub type FluidPlugin2d = FluidPlugin<Vec2>;
pub type FluidPlugin3d = FluidPlugin<Vec3>;

impl<V: FluidVector> FluidPlugin<V> {
    pub fn new(params: FluidParams) -> Self {
        Self {
            params,
            _dimension: PhantomData,
        }
    }
}

impl<V: FluidVector> Default for FluidPlugin<V> {
    fn default() -> Self {
        Self::new(FluidParams::default())
    }
}

impl<V: FluidVector> Plugin for FluidPlugin<V> {
    fn build(&self, app: &mut App) {
        // Register types for reflection
        app.register_type::<FluidParams>()
            .register_type::<FluidState>();

        // Initialize resources
        app.insert_resource(self.params.clone())
            .init_resource::<FluidState>()
            .init_resource::<PointerInteraction<V>>();

        match FluidSimulation::<V>::configure(self.params.clone()) {
            Ok(simulation) => {
                app.insert_resource(simulation);
            }
            Err(err) => error!("fluid simulation disabled: {err}"),
        }

        // Add simulation systems
        app.add_systems(
            Update,
            (sync_params::<V>, sync_interaction::<V>, run_simulation::<V>).chain(),
        );
    }
}

/// Run control and a snapshot of the latest frame, for UIs.
#[derive(Resource, Clone, Debug, Default, Reflect)]
#[reflect(Resource)]
pub struct FluidState {
    pub paused: bool,
    /// Advance exactly one frame while paused.
    pub step_requested: bool,
    pub frame: u64,
    pub particle_count: usize,
    pub average_density_error: f32,
    pub max_speed: f32,
}

impl FluidState {
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn request_step(&mut self) {
        self.step_requested = true;
    }
}

/// System to push edited parameters into the simulation.
fn sync_params<V: FluidVector>(
    params: Res<FluidParams>,
    simulation: Option<ResMut<FluidSimulation<V>>>,
) {
    let Some(mut simulation) = simulation else {
        return;
    };
    if !params.is_changed() || params.is_added() {
        return;
    }
    if let Err(err) = simulation.reconfigure(params.clone()) {
        warn!("rejected fluid parameter change: {err}");
    }
}

/// System to forward the pointer force.
fn sync_interaction<V: FluidVector>(
    interaction: Res<PointerInteraction<V>>,
    simulation: Option<ResMut<FluidSimulation<V>>>,
) {
    let Some(mut simulation) = simulation else {
        return;
    };
    if interaction.is_changed() {
        simulation.set_interaction(*interaction);
    }
}

/// System to run the fluid simulation.
fn run_simulation<V: FluidVector>(
    time: Res<Time>,
    mut state: ResMut<FluidState>,
    simulation: Option<ResMut<FluidSimulation<V>>>,
) {
    let Some(mut simulation) = simulation else {
        return;
    };

    let dt = if state.paused {
        if !state.step_requested {
            return;
        }
        SINGLE_STEP_TIME
    } else {
        // Clamp dt to prevent instability
        time.delta_secs().min(MAX_FRAME_TIME)
    };
    state.step_requested = false;

    if dt > 0.0 {
        simulation.advance(dt);
    }

    let stats = simulation.stats();
    state.frame = stats.frame;
    state.particle_count = simulation.particle_count();
    state.average_density_error = stats.average_density_error;
    state.max_speed = stats.max_speed;
}
