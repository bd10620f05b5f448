//! Particle field storage and initial placement.
//!
//! Particles are stored as a structure of arrays sized once at configuration
//! time. Predicted positions, densities and near-densities are scratch fields:
//! the solver overwrites them every substep and never blends in old values.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::vector::FluidVector;

/// Per-particle simulation state (SoA layout).
#[derive(Clone, Debug, Default)]
pub struct ParticleSet<V: FluidVector> {
    pub(crate) positions: Vec<V>,
    pub(crate) predicted_positions: Vec<V>,
    pub(crate) velocities: Vec<V>,
    pub(crate) densities: Vec<f32>,
    pub(crate) near_densities: Vec<f32>,
}

impl<V: FluidVector> ParticleSet<V> {
    /// Creates a set from matching position and velocity arrays.
    ///
    /// Lengths are checked by the caller; see
    /// [`FluidSimulation::from_particles`](super::simulation::FluidSimulation::from_particles).
    pub(crate) fn new(positions: Vec<V>, velocities: Vec<V>) -> Self {
        debug_assert_eq!(positions.len(), velocities.len());
        let n = positions.len();
        Self {
            predicted_positions: positions.clone(),
            positions,
            velocities,
            densities: vec![0.0; n],
            near_densities: vec![0.0; n],
        }
    }

    /// Creates a set at rest.
    pub(crate) fn at_rest(positions: Vec<V>) -> Self {
        let velocities = vec![V::ZERO; positions.len()];
        Self::new(positions, velocities)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[V] {
        &self.positions
    }

    /// Lookahead positions from the most recent substep.
    pub fn predicted_positions(&self) -> &[V] {
        &self.predicted_positions
    }

    pub fn velocities(&self) -> &[V] {
        &self.velocities
    }

    pub fn densities(&self) -> &[f32] {
        &self.densities
    }

    pub fn near_densities(&self) -> &[f32] {
        &self.near_densities
    }

    /// Velocity magnitude of every particle.
    pub fn speeds(&self) -> Vec<f32> {
        self.velocities.iter().map(|v| v.length()).collect()
    }

    /// Fills `out` with one render instance per particle.
    pub fn write_instances(&self, out: &mut Vec<ParticleInstance>) {
        out.clear();
        out.extend(
            self.positions
                .iter()
                .zip(&self.velocities)
                .map(|(p, v)| ParticleInstance::new(p.to_vec3(), v.length())),
        );
    }
}

/// Initial particle arrangement.
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub enum SpawnLayout {
    /// Centered square (2D) or cubic (3D) lattice.
    ///
    /// Spacing is `2 * particle_radius + 0.01 + spacing_factor`.
    Grid { spacing_factor: f32 },
    /// Uniformly random inside the domain, reproducible from `seed`.
    Random { seed: u64 },
}

impl Default for SpawnLayout {
    fn default() -> Self {
        SpawnLayout::Grid {
            spacing_factor: 0.1,
        }
    }
}

impl SpawnLayout {
    /// Generates `count` positions inside `[-half_extent, half_extent]`.
    pub fn generate<V: FluidVector>(&self, count: usize, particle_radius: f32, half_extent: V) -> Vec<V> {
        match *self {
            SpawnLayout::Grid { spacing_factor } => {
                let spacing = particle_radius * 2.0 + 0.01 + spacing_factor;
                lattice_positions::<V>(count, spacing)
                    .into_iter()
                    .map(|p| clamp_to_extent(p, half_extent))
                    .collect()
            }
            SpawnLayout::Random { seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                (0..count)
                    .map(|_| {
                        let mut p = V::ZERO;
                        for axis in 0..V::DIM {
                            let h = half_extent.axis(axis);
                            let value = if h > 0.0 { rng.gen_range(-h..=h) } else { 0.0 };
                            p.set_axis(axis, value);
                        }
                        p
                    })
                    .collect()
            }
        }
    }
}

/// Lattice centered on the origin, filled row by row.
fn lattice_positions<V: FluidVector>(count: usize, spacing: f32) -> Vec<V> {
    if count == 0 {
        return Vec::new();
    }

    let per_row = if V::DIM == 2 {
        ((count as f32).sqrt() as usize).max(1)
    } else {
        ((count as f32).cbrt().ceil() as usize).max(1)
    };
    let per_layer = if V::DIM == 2 { count } else { per_row * per_row };

    // Extent of the lattice on each axis, used to center it.
    let rows = (count.min(per_layer) - 1) / per_row + 1;
    let layers = (count - 1) / per_layer + 1;
    let extents = [per_row, rows, layers];

    (0..count)
        .map(|i| {
            let index = [i % per_row, (i % per_layer) / per_row, i / per_layer];
            let mut p = V::ZERO;
            for axis in 0..V::DIM {
                let offset = index[axis] as f32 - extents[axis] as f32 / 2.0 + 0.5;
                p.set_axis(axis, offset * spacing);
            }
            p
        })
        .collect()
}

fn clamp_to_extent<V: FluidVector>(mut p: V, half_extent: V) -> V {
    for axis in 0..V::DIM {
        let h = half_extent.axis(axis);
        p.set_axis(axis, p.axis(axis).clamp(-h, h));
    }
    p
}

/// GPU-compatible per-particle instance data for renderers.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    /// Position (xyz, z = 0 in 2D) + speed (w).
    pub position_speed: [f32; 4],
}

impl ParticleInstance {
    pub fn new(position: Vec3, speed: f32) -> Self {
        Self {
            position_speed: [position.x, position.y, position.z, speed],
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(
            self.position_speed[0],
            self.position_speed[1],
            self.position_speed[2],
        )
    }

    pub fn speed(&self) -> f32 {
        self.position_speed[3]
    }
}

/// Raw bytes of an instance slice, ready for a vertex buffer upload.
pub fn instance_bytes(instances: &[ParticleInstance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}
