//! Configuration errors.
//!
//! The solver itself never fails: every per-substep operation is total once
//! the configuration has been accepted. Anything that could push NaNs or a
//! zero density into the simulation is rejected up front with a [`FluidError`].

use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum FluidError {
    /// Particle count must be at least one.
    InvalidParticleCount(usize),
    /// Smoothing radius must be finite and positive.
    InvalidSmoothingRadius(f32),
    /// Particle radius must be finite and non-negative.
    InvalidParticleRadius(f32),
    /// Particle mass must be finite and positive.
    InvalidMass(f32),
    /// Kernel normalization for this smoothing radius over- or underflows.
    DegenerateKernel(f32),
    /// Target density must be finite.
    InvalidTargetDensity(f32),
    /// Collision dampening must lie in `[0, 1]`.
    InvalidCollisionDampening(f32),
    /// At least one substep per frame is required.
    InvalidSubsteps(u32),
    /// Time scale must be finite and non-negative.
    InvalidTimeScale(f32),
    /// Prediction lookahead must be finite and positive.
    InvalidLookahead(f32),
    /// Interaction radius must be finite and positive.
    InvalidInteractionRadius(f32),
    /// A multiplier or strength was NaN or infinite.
    NonFiniteParameter(&'static str),
    /// The domain is not larger than a particle on some axis.
    BoundsTooSmall { axis: usize, size: f32, min: f32 },
    /// Initial position and velocity arrays differ in length.
    MismatchedLengths { positions: usize, velocities: usize },
    /// An initial position or velocity contained NaN or infinity.
    NonFiniteInput { index: usize },
}

impl fmt::Display for FluidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParticleCount(count) => {
                write!(f, "particle count must be positive, got {count}")
            }
            Self::InvalidSmoothingRadius(h) => {
                write!(f, "smoothing radius must be finite and positive, got {h}")
            }
            Self::InvalidParticleRadius(r) => {
                write!(f, "particle radius must be finite and non-negative, got {r}")
            }
            Self::InvalidMass(mass) => write!(f, "particle mass must be finite and positive, got {mass}"),
            Self::DegenerateKernel(h) => {
                write!(f, "smoothing radius {h} gives non-finite or zero kernel weights")
            }
            Self::InvalidTargetDensity(density) => {
                write!(f, "target density must be finite, got {density}")
            }
            Self::InvalidCollisionDampening(d) => {
                write!(f, "collision dampening must be within [0, 1], got {d}")
            }
            Self::InvalidSubsteps(n) => write!(f, "substeps per frame must be at least 1, got {n}"),
            Self::InvalidTimeScale(scale) => {
                write!(f, "time scale must be finite and non-negative, got {scale}")
            }
            Self::InvalidLookahead(t) => {
                write!(f, "prediction lookahead must be finite and positive, got {t}")
            }
            Self::InvalidInteractionRadius(r) => {
                write!(f, "interaction radius must be finite and positive, got {r}")
            }
            Self::NonFiniteParameter(name) => write!(f, "parameter `{name}` must be finite"),
            Self::BoundsTooSmall { axis, size, min } => write!(
                f,
                "bounds size {size} on axis {axis} must exceed twice the particle radius ({min})"
            ),
            Self::MismatchedLengths {
                positions,
                velocities,
            } => write!(
                f,
                "got {positions} positions but {velocities} velocities"
            ),
            Self::NonFiniteInput { index } => {
                write!(f, "particle {index} has a non-finite position or velocity")
            }
        }
    }
}

impl std::error::Error for FluidError {}
