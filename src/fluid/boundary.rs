//! Domain boundary handling.
//!
//! The domain is an axis-aligned box centered on the origin. A particle's
//! center may travel up to `bounds / 2 - particle_radius` on each axis; past
//! that it is snapped back onto the wall and its normal velocity is reflected
//! and scaled by the collision dampening.

use super::params::FluidParams;
use super::vector::FluidVector;

/// Box-shaped container (AABB) centered on the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxBoundary<V: FluidVector> {
    /// Largest allowed |coordinate| of a particle center, per axis.
    half_extent: V,
    /// Fraction of the normal velocity kept after a hit (0 = no bounce).
    dampening: f32,
}

impl<V: FluidVector> BoxBoundary<V> {
    /// Create a box of full size `size` for particles of `particle_radius`.
    pub fn new(size: V, particle_radius: f32) -> Self {
        Self {
            half_extent: size * 0.5 - V::splat(particle_radius),
            dampening: 1.0,
        }
    }

    pub fn from_params(params: &FluidParams) -> Self {
        Self {
            half_extent: params.half_extent::<V>(),
            dampening: params.collision_dampening,
        }
    }

    /// Set collision dampening.
    pub fn with_dampening(mut self, dampening: f32) -> Self {
        self.dampening = dampening;
        self
    }

    pub fn half_extent(&self) -> V {
        self.half_extent
    }

    pub fn dampening(&self) -> f32 {
        self.dampening
    }

    /// Check if a particle center is inside the allowed region.
    pub fn contains(&self, point: V) -> bool {
        (0..V::DIM).all(|axis| point.axis(axis).abs() <= self.half_extent.axis(axis))
    }

    /// Apply boundary collision to a particle.
    ///
    /// Axes are resolved independently, so a corner hit flips both
    /// components. Returns whether any axis collided.
    #[inline]
    pub fn apply_collision(&self, position: &mut V, velocity: &mut V) -> bool {
        let mut collided = false;
        for axis in 0..V::DIM {
            let p = position.axis(axis);
            let limit = self.half_extent.axis(axis);
            if p.abs() > limit {
                position.set_axis(axis, limit * p.signum());
                velocity.set_axis(axis, velocity.axis(axis) * -self.dampening);
                collided = true;
            }
        }
        collided
    }
}
