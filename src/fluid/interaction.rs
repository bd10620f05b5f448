//! Pointer-driven attract/repel force.

use bevy::prelude::*;

use super::vector::FluidVector;

/// A radial force field, typically following the mouse.
///
/// Positive strength pulls particles toward `position`, negative strength
/// pushes them away. The pull fades linearly to zero at `radius` and also
/// damps the particle's own velocity so attracted particles settle.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct PointerInteraction<V: FluidVector> {
    pub position: V,
    pub radius: f32,
    pub strength: f32,
    pub active: bool,
}

impl<V: FluidVector> Default for PointerInteraction<V> {
    fn default() -> Self {
        Self {
            position: V::ZERO,
            radius: 0.0,
            strength: 0.0,
            active: false,
        }
    }
}

impl<V: FluidVector> PointerInteraction<V> {
    pub fn attract(position: V, radius: f32, strength: f32) -> Self {
        Self {
            position,
            radius,
            strength: strength.abs(),
            active: true,
        }
    }

    pub fn repel(position: V, radius: f32, strength: f32) -> Self {
        Self {
            position,
            radius,
            strength: -strength.abs(),
            active: true,
        }
    }

    /// Acceleration on a particle at `particle_position`.
    ///
    /// Zero when inactive or outside the radius. Inside, it is
    /// `(dir * strength - velocity) * (1 - d / radius)`, with `dir` the unit
    /// vector toward the pointer (zero at the pointer itself).
    pub fn force(&self, particle_position: V, particle_velocity: V) -> V {
        if !self.active || !(self.radius > 0.0) {
            return V::ZERO;
        }

        let offset = self.position - particle_position;
        let dst_sq = offset.length_squared();
        if dst_sq >= self.radius * self.radius {
            return V::ZERO;
        }

        let dst = dst_sq.sqrt();
        let centre_t = 1.0 - dst / self.radius;
        let dir_to_pointer = if dst > f32::EPSILON {
            offset / dst
        } else {
            V::ZERO
        };

        (dir_to_pointer * self.strength - particle_velocity) * centre_t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_is_zero() {
        let interaction = PointerInteraction {
            active: false,
            ..PointerInteraction::attract(Vec2::ZERO, 5.0, 10.0)
        };
        assert_eq!(interaction.force(Vec2::X, Vec2::ONE), Vec2::ZERO);
        assert_eq!(PointerInteraction::<Vec3>::default().force(Vec3::X, Vec3::ONE), Vec3::ZERO);
    }

    #[test]
    fn test_zero_outside_radius() {
        let interaction = PointerInteraction::attract(Vec2::ZERO, 2.0, 10.0);
        assert_eq!(interaction.force(Vec2::new(2.0, 0.0), Vec2::Y), Vec2::ZERO);
        assert_eq!(interaction.force(Vec2::new(0.0, -3.0), Vec2::Y), Vec2::ZERO);
    }

    #[test]
    fn test_attract_and_repel_directions() {
        let attract = PointerInteraction::attract(Vec2::ZERO, 2.0, 10.0);
        let force = attract.force(Vec2::new(1.0, 0.0), Vec2::ZERO);
        assert!((force - Vec2::new(-5.0, 0.0)).length() < 1e-5);

        let repel = PointerInteraction::repel(Vec3::ZERO, 2.0, 10.0);
        let force = repel.force(Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO);
        assert!((force - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_velocity_damped_inside_radius() {
        let interaction = PointerInteraction::attract(Vec2::ZERO, 4.0, 0.0);
        let force = interaction.force(Vec2::new(0.0, 2.0), Vec2::new(3.0, 0.0));
        assert!((force - Vec2::new(-1.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_particle_at_pointer_gets_no_direction() {
        let interaction = PointerInteraction::attract(Vec2::ONE, 1.0, 10.0);
        assert_eq!(interaction.force(Vec2::ONE, Vec2::ZERO), Vec2::ZERO);
    }
}
