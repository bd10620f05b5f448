//! Fluid simulation parameters.
//!
//! These parameters control the double-density relaxation solver and the
//! simulation domain. They can be modified at runtime through the Bevy
//! resource system or through [`FluidParams::apply_text_edit`], which mirrors
//! a text field in a control panel.

use bevy::prelude::*;

use super::error::FluidError;
use super::kernels::SphKernels;
use super::particle::SpawnLayout;
use super::vector::FluidVector;

/// Parameters controlling the fluid simulation behavior.
///
/// Defaults describe a 10 x 10 (x 10) box of water-like fluid. Modifying them
/// allows simulating thicker or springier fluids.
#[derive(Resource, Clone, Debug, Reflect)]
#[reflect(Resource)]
pub struct FluidParams {
    /// Number of particles. Fixed for the lifetime of a simulation.
    pub particle_count: usize,

    /// Particle radius, used for boundary collision and spawn spacing.
    pub particle_radius: f32,

    /// Smoothing kernel radius (h). Also the spatial hash cell size.
    /// Typical range: 0.2 - 1.0 for a 10 unit domain.
    pub smoothing_radius: f32,

    /// Mass of a single particle.
    pub mass: f32,

    /// Density the pressure term pushes toward.
    pub target_density: f32,

    /// Stiffness of the ordinary pressure term.
    /// Typical range: 1 - 50
    pub pressure_multiplier: f32,

    /// Stiffness of the short-range near-pressure term.
    /// Keeps particles from clumping when pressure is negative.
    /// Typical range: 0.5 - 10
    pub near_pressure_multiplier: f32,

    /// Velocity smoothing strength.
    /// Higher values = more viscous fluid (honey-like).
    /// Typical range: 0.0 - 0.03
    pub viscosity_strength: f32,

    /// Gravity acceleration magnitude along -Y.
    pub gravity: f32,

    /// Fraction of the normal velocity kept after a wall hit.
    /// 0.0 = fully inelastic, 1.0 = fully elastic.
    pub collision_dampening: f32,

    /// Full size of the domain box centered on the origin.
    /// The z component is ignored by the 2D simulation.
    pub bounds_size: Vec3,

    /// Number of substeps per frame.
    /// More substeps = more stable at high speeds.
    /// Typical range: 1 - 5
    pub substeps: u32,

    /// Multiplier applied to the frame time.
    pub time_scale: f32,

    /// Time horizon for predicted positions used by the neighbor search.
    pub lookahead: f32,

    /// Radius of the pointer force.
    pub interaction_radius: f32,

    /// Magnitude of the pointer force.
    pub interaction_strength: f32,

    /// Initial particle arrangement.
    pub spawn: SpawnLayout,
}

impl Default for FluidParams {
    fn default() -> Self {
        Self {
            particle_count: 1024,
            particle_radius: 0.1,
            smoothing_radius: 0.5,
            mass: 1.0,
            target_density: 20.0,
            pressure_multiplier: 8.0,
            near_pressure_multiplier: 2.0,
            viscosity_strength: 0.01,
            gravity: 9.81,
            collision_dampening: 0.82,
            bounds_size: Vec3::splat(10.0),
            substeps: 3,
            time_scale: 1.0,
            lookahead: 1.0 / 120.0,
            interaction_radius: 2.0,
            interaction_strength: 50.0,
            spawn: SpawnLayout::default(),
        }
    }
}

impl FluidParams {
    /// Creates parameters for real-time water simulation.
    pub fn water() -> Self {
        Self::default()
    }

    /// Creates parameters for a thick, slow-settling fluid.
    pub fn viscous() -> Self {
        Self {
            viscosity_strength: 0.03,
            near_pressure_multiplier: 1.0,
            ..Self::default()
        }
    }

    /// Creates parameters for a 3D box; the target density accounts for the
    /// denser packing of a cubic lattice.
    pub fn water_3d() -> Self {
        Self {
            particle_count: 4096,
            target_density: 100.0,
            pressure_multiplier: 4.0,
            near_pressure_multiplier: 1.0,
            viscosity_strength: 0.002,
            ..Self::default()
        }
    }

    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_particle_radius(mut self, radius: f32) -> Self {
        self.particle_radius = radius;
        self
    }

    pub fn with_smoothing_radius(mut self, radius: f32) -> Self {
        self.smoothing_radius = radius;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_target_density(mut self, density: f32) -> Self {
        self.target_density = density;
        self
    }

    /// Sets both pressure stiffnesses.
    pub fn with_pressure(mut self, pressure: f32, near_pressure: f32) -> Self {
        self.pressure_multiplier = pressure;
        self.near_pressure_multiplier = near_pressure;
        self
    }

    pub fn with_viscosity(mut self, strength: f32) -> Self {
        self.viscosity_strength = strength;
        self
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_collision_dampening(mut self, dampening: f32) -> Self {
        self.collision_dampening = dampening;
        self
    }

    pub fn with_bounds(mut self, size: Vec3) -> Self {
        self.bounds_size = size;
        self
    }

    pub fn with_substeps(mut self, substeps: u32) -> Self {
        self.substeps = substeps;
        self
    }

    pub fn with_time_scale(mut self, scale: f32) -> Self {
        self.time_scale = scale;
        self
    }

    pub fn with_interaction(mut self, radius: f32, strength: f32) -> Self {
        self.interaction_radius = radius;
        self.interaction_strength = strength;
        self
    }

    pub fn with_spawn(mut self, spawn: SpawnLayout) -> Self {
        self.spawn = spawn;
        self
    }

    /// Checks every value the solver relies on for finite, non-degenerate
    /// arithmetic. Only the first `dim` bounds axes are considered.
    pub fn validate(&self, dim: usize) -> Result<(), FluidError> {
        if self.particle_count == 0 {
            return Err(FluidError::InvalidParticleCount(self.particle_count));
        }
        if !(self.smoothing_radius.is_finite() && self.smoothing_radius > 0.0) {
            return Err(FluidError::InvalidSmoothingRadius(self.smoothing_radius));
        }
        if !(self.particle_radius.is_finite() && self.particle_radius >= 0.0) {
            return Err(FluidError::InvalidParticleRadius(self.particle_radius));
        }
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(FluidError::InvalidMass(self.mass));
        }
        let kernels = SphKernels::new(self.smoothing_radius, dim);
        let self_density = self.mass * kernels.density(0.0);
        let self_near_density = self.mass * kernels.near_density(0.0);
        if !kernels.is_well_conditioned()
            || !(self_density.is_finite() && self_density > 0.0)
            || !(self_near_density.is_finite() && self_near_density > 0.0)
        {
            return Err(FluidError::DegenerateKernel(self.smoothing_radius));
        }
        if !self.target_density.is_finite() {
            return Err(FluidError::InvalidTargetDensity(self.target_density));
        }
        if !(0.0..=1.0).contains(&self.collision_dampening) {
            return Err(FluidError::InvalidCollisionDampening(self.collision_dampening));
        }
        if self.substeps == 0 {
            return Err(FluidError::InvalidSubsteps(self.substeps));
        }
        if !(self.time_scale.is_finite() && self.time_scale >= 0.0) {
            return Err(FluidError::InvalidTimeScale(self.time_scale));
        }
        if !(self.lookahead.is_finite() && self.lookahead > 0.0) {
            return Err(FluidError::InvalidLookahead(self.lookahead));
        }
        if !(self.interaction_radius.is_finite() && self.interaction_radius > 0.0) {
            return Err(FluidError::InvalidInteractionRadius(self.interaction_radius));
        }

        for (name, value) in [
            ("pressure_multiplier", self.pressure_multiplier),
            ("near_pressure_multiplier", self.near_pressure_multiplier),
            ("viscosity_strength", self.viscosity_strength),
            ("gravity", self.gravity),
            ("interaction_strength", self.interaction_strength),
        ] {
            if !value.is_finite() {
                return Err(FluidError::NonFiniteParameter(name));
            }
        }

        let min = 2.0 * self.particle_radius;
        for axis in 0..dim.min(3) {
            let size = self.bounds_size[axis];
            if !(size.is_finite() && size > min) {
                return Err(FluidError::BoundsTooSmall { axis, size, min });
            }
        }

        Ok(())
    }

    /// Substep length for one frame: `frame_time / substeps * time_scale`.
    pub fn substep_dt(&self, frame_time: f32) -> f32 {
        frame_time / self.substeps.max(1) as f32 * self.time_scale
    }

    /// Domain half-size minus the particle radius, per axis.
    pub fn half_extent<V: FluidVector>(&self) -> V {
        V::from_vec3(self.bounds_size * 0.5 - Vec3::splat(self.particle_radius))
    }

    /// Assigns a scalar parameter. Non-finite values are ignored.
    pub fn set_field(&mut self, field: ParamField, value: f32) -> bool {
        if !value.is_finite() {
            return false;
        }
        match field {
            ParamField::Gravity => self.gravity = value,
            ParamField::ViscosityStrength => self.viscosity_strength = value,
            ParamField::TargetDensity => self.target_density = value,
            ParamField::PressureMultiplier => self.pressure_multiplier = value,
            ParamField::NearPressureMultiplier => self.near_pressure_multiplier = value,
        }
        true
    }

    /// Parses `text` as a number and assigns it to `field`.
    ///
    /// Input that does not parse is ignored and the previous value is kept.
    pub fn apply_text_edit(&mut self, field: ParamField, text: &str) -> bool {
        let applied = text
            .trim()
            .parse::<f32>()
            .is_ok_and(|value| self.set_field(field, value));
        if !applied {
            warn!("ignoring {field:?} input {text:?}: not a finite number");
        }
        applied
    }
}

/// Scalar parameters that can be edited while the simulation runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect)]
pub enum ParamField {
    Gravity,
    ViscosityStrength,
    TargetDensity,
    PressureMultiplier,
    NearPressureMultiplier,
}

impl ParamField {
    pub const ALL: [ParamField; 5] = [
        ParamField::Gravity,
        ParamField::ViscosityStrength,
        ParamField::TargetDensity,
        ParamField::PressureMultiplier,
        ParamField::NearPressureMultiplier,
    ];

    /// Current value of this field in `params`.
    pub fn get(self, params: &FluidParams) -> f32 {
        match self {
            ParamField::Gravity => params.gravity,
            ParamField::ViscosityStrength => params.viscosity_strength,
            ParamField::TargetDensity => params.target_density,
            ParamField::PressureMultiplier => params.pressure_multiplier,
            ParamField::NearPressureMultiplier => params.near_pressure_multiplier,
        }
    }
}
