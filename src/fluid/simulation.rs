//! Fluid simulation state and frame stepping.
//!
//! [`FluidSimulation`] owns the particle arrays, the solver scratch and the
//! active parameters. A host calls [`FluidSimulation::advance`] once per frame
//! and reads positions back through the accessors; between frames it may
//! change parameters or the pointer interaction.

use bevy::prelude::*;
use rayon::prelude::*;

use super::boundary::BoxBoundary;
use super::error::FluidError;
use super::interaction::PointerInteraction;
use super::kernels::SphKernels;
use super::params::{FluidParams, ParamField};
use super::particle::{ParticleInstance, ParticleSet};
use super::solver::{SphSolver, StepParams};
use super::spatial::SpatialHashGrid;
use super::vector::FluidVector;

/// Summary of the most recent frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Frames advanced since configuration.
    pub frame: u64,
    /// Substeps run in the last frame.
    pub substeps: u32,
    pub average_density: f32,
    /// Mean |density - target| / |target|, or the absolute error when the
    /// target is zero.
    pub average_density_error: f32,
    pub max_speed: f32,
}

/// Main fluid simulation resource.
#[derive(Resource)]
pub struct FluidSimulation<V: FluidVector> {
    params: FluidParams,
    particles: ParticleSet<V>,
    solver: SphSolver<V>,
    boundary: BoxBoundary<V>,
    interaction: PointerInteraction<V>,
    stats: FrameStats,
}

pub type FluidSimulation2d = FluidSimulation<Vec2>;
pub type FluidSimulation3d = FluidSimulation<Vec3>;

impl<V: FluidVector> FluidSimulation<V> {
    /// Creates a simulation and places particles by `params.spawn`.
    pub fn configure(params: FluidParams) -> Result<Self, FluidError> {
        params.validate(V::DIM)?;
        let positions = params.spawn.generate::<V>(
            params.particle_count,
            params.particle_radius,
            params.half_extent::<V>(),
        );
        Ok(Self::build(params, ParticleSet::at_rest(positions)))
    }

    /// Creates a simulation from explicit initial state.
    ///
    /// `params.particle_count` is replaced by the number of positions.
    pub fn from_particles(
        mut params: FluidParams,
        positions: Vec<V>,
        velocities: Vec<V>,
    ) -> Result<Self, FluidError> {
        if positions.len() != velocities.len() {
            return Err(FluidError::MismatchedLengths {
                positions: positions.len(),
                velocities: velocities.len(),
            });
        }
        params.particle_count = positions.len();
        params.validate(V::DIM)?;

        let is_finite = |v: &V| (0..V::DIM).all(|axis| v.axis(axis).is_finite());
        if let Some(index) = positions
            .iter()
            .zip(&velocities)
            .position(|(p, v)| !is_finite(p) || !is_finite(v))
        {
            return Err(FluidError::NonFiniteInput { index });
        }

        Ok(Self::build(params, ParticleSet::new(positions, velocities)))
    }

    fn build(params: FluidParams, particles: ParticleSet<V>) -> Self {
        info!(
            "configured {}D fluid: {} particles, h = {}, bounds = {:?}, hash table size {}",
            V::DIM,
            particles.len(),
            params.smoothing_radius,
            params.bounds_size,
            particles.len(),
        );

        Self {
            solver: SphSolver::new(params.smoothing_radius),
            boundary: BoxBoundary::from_params(&params),
            interaction: PointerInteraction::default(),
            stats: FrameStats::default(),
            particles,
            params,
        }
    }

    /// Advances one frame of `frame_time` seconds.
    ///
    /// Runs `substeps` substeps of `frame_time / substeps * time_scale`.
    /// A non-positive or non-finite frame time is skipped. Returns the number
    /// of substeps run.
    pub fn advance(&mut self, frame_time: f32) -> u32 {
        if !(frame_time.is_finite() && frame_time > 0.0) {
            warn!("skipping fluid frame with invalid frame time {frame_time}");
            return 0;
        }

        let dt = self.params.substep_dt(frame_time);
        let substeps = self.params.substeps;
        for _ in 0..substeps {
            self.step(dt);
        }

        self.update_stats(substeps);
        debug!(
            "fluid frame {} ({} substeps): avg density {:.3} (error {:.3}), max speed {:.3}",
            self.stats.frame,
            substeps,
            self.stats.average_density,
            self.stats.average_density_error,
            self.stats.max_speed,
        );
        substeps
    }

    /// Runs a single substep of length `dt`.
    pub fn step(&mut self, dt: f32) {
        let step = StepParams::from_params(&self.params, dt);
        self.solver
            .step(&mut self.particles, &step, &self.boundary, &self.interaction);
    }

    fn update_stats(&mut self, substeps: u32) {
        let n = self.particles.len().max(1) as f32;
        let target = self.params.target_density;
        let error_scale = if target.abs() > f32::EPSILON { target.abs() } else { 1.0 };
        let densities = self.particles.densities();

        let density_sum: f32 = densities.par_iter().sum();
        let error_sum: f32 = densities.par_iter().map(|d| (d - target).abs()).sum();
        let max_speed = self
            .particles
            .velocities()
            .par_iter()
            .map(|v| v.length())
            .reduce(|| 0.0, f32::max);

        self.stats = FrameStats {
            frame: self.stats.frame + 1,
            substeps,
            average_density: density_sum / n,
            average_density_error: error_sum / n / error_scale,
            max_speed,
        };
    }

    pub fn params(&self) -> &FluidParams {
        &self.params
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn positions(&self) -> &[V] {
        self.particles.positions()
    }

    pub fn velocities(&self) -> &[V] {
        self.particles.velocities()
    }

    pub fn predicted_positions(&self) -> &[V] {
        self.particles.predicted_positions()
    }

    pub fn densities(&self) -> &[f32] {
        self.particles.densities()
    }

    pub fn near_densities(&self) -> &[f32] {
        self.particles.near_densities()
    }

    pub fn speeds(&self) -> Vec<f32> {
        self.particles.speeds()
    }

    /// Render snapshot: position plus speed per particle.
    pub fn instances(&self) -> Vec<ParticleInstance> {
        let mut instances = Vec::with_capacity(self.particles.len());
        self.particles.write_instances(&mut instances);
        instances
    }

    /// Like [`instances`](Self::instances), reusing `out`'s allocation.
    pub fn write_instances(&self, out: &mut Vec<ParticleInstance>) {
        self.particles.write_instances(out);
    }

    pub fn kernels(&self) -> &SphKernels {
        self.solver.kernels()
    }

    pub fn grid(&self) -> &SpatialHashGrid {
        self.solver.grid()
    }

    pub fn boundary(&self) -> &BoxBoundary<V> {
        &self.boundary
    }

    pub fn set_gravity(&mut self, gravity: f32) {
        self.params.set_field(ParamField::Gravity, gravity);
    }

    pub fn set_viscosity_strength(&mut self, strength: f32) {
        self.params.set_field(ParamField::ViscosityStrength, strength);
    }

    pub fn set_target_density(&mut self, density: f32) {
        self.params.set_field(ParamField::TargetDensity, density);
    }

    pub fn set_pressure_multiplier(&mut self, multiplier: f32) {
        self.params.set_field(ParamField::PressureMultiplier, multiplier);
    }

    pub fn set_near_pressure_multiplier(&mut self, multiplier: f32) {
        self.params.set_field(ParamField::NearPressureMultiplier, multiplier);
    }

    /// Parses and applies a text edit; bad input keeps the old value.
    pub fn apply_text_edit(&mut self, field: ParamField, text: &str) -> bool {
        self.params.apply_text_edit(field, text)
    }

    /// Changes h and recomputes kernel coefficients and the grid cell size.
    pub fn set_smoothing_radius(&mut self, smoothing_radius: f32) -> Result<(), FluidError> {
        let mut params = self.params.clone();
        params.smoothing_radius = smoothing_radius;
        params.validate(V::DIM)?;
        self.params.smoothing_radius = smoothing_radius;
        self.solver.set_smoothing_radius(smoothing_radius);
        Ok(())
    }

    /// Replaces every parameter except the particle count and spawn layout.
    ///
    /// On error the current parameters are left untouched.
    pub fn reconfigure(&mut self, mut params: FluidParams) -> Result<(), FluidError> {
        params.particle_count = self.particles.len();
        params.validate(V::DIM)?;

        if params.smoothing_radius != self.params.smoothing_radius {
            self.solver.set_smoothing_radius(params.smoothing_radius);
        }
        self.boundary = BoxBoundary::from_params(&params);
        self.params = params;
        Ok(())
    }

    pub fn interaction(&self) -> &PointerInteraction<V> {
        &self.interaction
    }

    /// Sets the pointer force used by subsequent substeps.
    pub fn set_interaction(&mut self, interaction: PointerInteraction<V>) {
        self.interaction = interaction;
    }

    pub fn clear_interaction(&mut self) {
        self.interaction.active = false;
    }
}
