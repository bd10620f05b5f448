//! Smoothed Particle Hydrodynamics (SPH) simulation module for Bevy.
//!
//! This module provides a CPU fluid simulation using double-density
//! relaxation: an ordinary pressure term drives particles toward a target
//! density and a short-range near-pressure term keeps them from clumping.
//! Every stage runs as a parallel pass over all particles.
//!
//! # Architecture
//!
//! The simulation is structured in the following components:
//!
//! - [`vector`]: Dimension abstraction over `Vec2` / `Vec3`
//! - [`kernels`]: Smoothing kernels with precomputed coefficients
//! - [`params`]: Simulation parameters (density, pressure, viscosity, etc.)
//! - [`particle`]: Particle data structures and spawning
//! - [`spatial`]: Spatial hashing for efficient neighbor search
//! - [`boundary`]: Domain walls and collision response
//! - [`interaction`]: Pointer attract/repel force
//! - [`solver`]: Per-substep SPH pipeline
//! - [`simulation`]: Frame stepping and host-facing state
//! - [`plugin`]: Bevy plugin for easy integration
//!
//! # Example
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use sph_fluid::fluid::prelude::*;
//!
//! let mut simulation = FluidSimulation2d::configure(FluidParams::water()).unwrap();
//! simulation.set_interaction(PointerInteraction::attract(Vec2::ZERO, 2.0, 50.0));
//! simulation.advance(1.0 / 60.0);
//!
//! let mut instances = Vec::new();
//! simulation.write_instances(&mut instances);
//! let bytes = instance_bytes(&instances);
//! # let _ = bytes;
//! ```

pub mod vector;
pub mod kernels;
pub mod error;
pub mod params;
pub mod particle;
pub mod spatial;
pub mod boundary;
pub mod interaction;
pub mod solver;
pub mod simulation;
pub mod plugin;

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::vector::FluidVector;
    pub use super::kernels::SphKernels;
    pub use super::error::FluidError;
    pub use super::params::*;
    pub use super::particle::*;
    pub use super::spatial::*;
    pub use super::boundary::*;
    pub use super::interaction::*;
    pub use super::solver::*;
    pub use super::simulation::*;
    pub use super::plugin::*;
}
