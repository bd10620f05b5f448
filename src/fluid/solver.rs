//! Double-density relaxation SPH solver.
//!
//! One substep runs five stages in order, each a fork-join pass over all
//! particles:
//!
//! 1. Apply pointer and gravity accelerations, then predict positions
//! 2. Rebuild the spatial hash from the predicted positions
//! 3. Compute density and near-density
//! 4. Apply pressure, near-pressure and viscosity to velocities
//! 5. Integrate positions and resolve wall collisions
//!
//! Stage 4 reads every neighbor's velocity, so its results go to a scratch
//! buffer and are committed only after the whole pass has finished.

use rayon::prelude::*;

use super::boundary::BoxBoundary;
use super::interaction::PointerInteraction;
use super::kernels::SphKernels;
use super::params::FluidParams;
use super::particle::ParticleSet;
use super::spatial::SpatialHashGrid;
use super::vector::FluidVector;

/// Per-substep constants, read once from [`FluidParams`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepParams<V: FluidVector> {
    pub dt: f32,
    pub lookahead: f32,
    pub gravity: V,
    pub mass: f32,
    pub target_density: f32,
    pub pressure_multiplier: f32,
    pub near_pressure_multiplier: f32,
    pub viscosity_strength: f32,
}

impl<V: FluidVector> StepParams<V> {
    pub fn from_params(params: &FluidParams, dt: f32) -> Self {
        Self {
            dt,
            lookahead: params.lookahead,
            gravity: V::down() * params.gravity,
            mass: params.mass,
            target_density: params.target_density,
            pressure_multiplier: params.pressure_multiplier,
            near_pressure_multiplier: params.near_pressure_multiplier,
            viscosity_strength: params.viscosity_strength,
        }
    }

    /// Pressure from the deviation against the target density.
    #[inline]
    pub fn pressure(&self, density: f32) -> f32 {
        (density - self.target_density) * self.pressure_multiplier
    }

    #[inline]
    pub fn near_pressure(&self, near_density: f32) -> f32 {
        near_density * self.near_pressure_multiplier
    }
}

/// CPU SPH solver. Owns the neighbor grid and per-substep scratch.
#[derive(Clone, Debug)]
pub struct SphSolver<V: FluidVector> {
    kernels: SphKernels,
    grid: SpatialHashGrid,
    velocity_deltas: Vec<V>,
}

impl<V: FluidVector> SphSolver<V> {
    pub fn new(smoothing_radius: f32) -> Self {
        Self {
            kernels: SphKernels::for_dimension::<V>(smoothing_radius),
            grid: SpatialHashGrid::new(smoothing_radius),
            velocity_deltas: Vec::new(),
        }
    }

    pub fn kernels(&self) -> &SphKernels {
        &self.kernels
    }

    /// Grid as built by the most recent substep.
    pub fn grid(&self) -> &SpatialHashGrid {
        &self.grid
    }

    /// Recomputes kernel coefficients and the grid cell size.
    pub fn set_smoothing_radius(&mut self, smoothing_radius: f32) {
        self.kernels = SphKernels::for_dimension::<V>(smoothing_radius);
        self.grid.set_cell_size(smoothing_radius);
    }

    /// Single simulation substep.
    pub fn step(
        &mut self,
        particles: &mut ParticleSet<V>,
        step: &StepParams<V>,
        boundary: &BoxBoundary<V>,
        interaction: &PointerInteraction<V>,
    ) {
        if particles.is_empty() {
            return;
        }

        // 1. External forces and prediction
        Self::predict(particles, step, interaction);

        // 2. Neighbor grid over predicted positions
        self.grid.rebuild(&particles.predicted_positions);

        // 3. Densities
        self.update_densities(particles, step.mass);

        // 4. Pressure and viscosity
        self.apply_pressure_and_viscosity(particles, step);

        // 5. Integration and walls
        Self::integrate(particles, step.dt, boundary);
    }

    fn predict(particles: &mut ParticleSet<V>, step: &StepParams<V>, interaction: &PointerInteraction<V>) {
        let ParticleSet {
            positions,
            predicted_positions,
            velocities,
            ..
        } = particles;

        positions
            .par_iter()
            .zip(velocities.par_iter_mut())
            .zip(predicted_positions.par_iter_mut())
            .for_each(|((&position, velocity), predicted)| {
                *velocity += interaction.force(position, *velocity) * step.dt;
                *velocity += step.gravity * step.dt;
                *predicted = position + *velocity * step.lookahead;
            });
    }

    /// Overwrites density and near-density from the predicted positions.
    fn update_densities(&self, particles: &mut ParticleSet<V>, mass: f32) {
        let kernels = self.kernels;
        let grid = &self.grid;
        let ParticleSet {
            predicted_positions,
            densities,
            near_densities,
            ..
        } = particles;
        let predicted: &[V] = predicted_positions;

        densities
            .par_iter_mut()
            .zip(near_densities.par_iter_mut())
            .enumerate()
            .for_each(|(i, (density, near_density))| {
                let origin = predicted[i];
                let mut sum = 0.0;
                let mut near_sum = 0.0;

                grid.for_each_candidate(origin, |j| {
                    let dst_sq = (predicted[j] - origin).length_squared();
                    if dst_sq >= kernels.radius_sq() {
                        return;
                    }
                    sum += mass * kernels.density_sq(dst_sq);
                    near_sum += mass * kernels.near_density(dst_sq.sqrt());
                });

                *density = sum;
                *near_density = near_sum;
            });
    }

    fn apply_pressure_and_viscosity(&mut self, particles: &mut ParticleSet<V>, step: &StepParams<V>) {
        let kernels = self.kernels;
        let grid = &self.grid;
        let ParticleSet {
            predicted_positions,
            velocities,
            densities,
            near_densities,
            ..
        } = particles;
        let predicted: &[V] = predicted_positions;
        let densities: &[f32] = densities;
        let near_densities: &[f32] = near_densities;

        {
            let current: &[V] = velocities;
            (0..current.len())
                .into_par_iter()
                .map(|i| {
                    let origin = predicted[i];
                    let velocity = current[i];
                    let pressure = step.pressure(densities[i]);
                    let near_pressure = step.near_pressure(near_densities[i]);

                    let mut pressure_force = V::ZERO;
                    let mut viscosity_force = V::ZERO;

                    grid.for_each_candidate(origin, |j| {
                        if j == i {
                            return;
                        }
                        let offset = predicted[j] - origin;
                        let dst_sq = offset.length_squared();
                        if dst_sq >= kernels.radius_sq() {
                            return;
                        }

                        let dst = dst_sq.sqrt();
                        // Coincident pairs take opposite fallbacks so they separate.
                        let dir = if dst > 0.0 {
                            offset / dst
                        } else if j < i {
                            -V::fallback_direction()
                        } else {
                            V::fallback_direction()
                        };
                        let slope = kernels.density_derivative(dst);

                        // Symmetric pressures keep pairwise forces balanced.
                        let shared_pressure = (pressure + step.pressure(densities[j])) * 0.5;
                        let shared_near = (near_pressure + step.near_pressure(near_densities[j])) * 0.5;

                        pressure_force += dir * (step.mass * shared_pressure * slope / densities[j]);
                        // Near term shares the spiky slope so it fades to zero at h.
                        pressure_force += dir * (step.mass * shared_near * slope / near_densities[j]);
                        viscosity_force += (current[j] - velocity) * kernels.viscosity(dst);
                    });

                    pressure_force / densities[i] * step.dt + viscosity_force * step.viscosity_strength
                })
                .collect_into_vec(&mut self.velocity_deltas);
        }

        velocities
            .par_iter_mut()
            .zip(self.velocity_deltas.par_iter())
            .for_each(|(velocity, &delta)| *velocity += delta);
    }

    fn integrate(particles: &mut ParticleSet<V>, dt: f32, boundary: &BoxBoundary<V>) {
        let ParticleSet {
            positions,
            velocities,
            ..
        } = particles;

        positions
            .par_iter_mut()
            .zip(velocities.par_iter_mut())
            .for_each(|(position, velocity)| {
                *position += *velocity * dt;
                boundary.apply_collision(position, velocity);
            });
    }
}
