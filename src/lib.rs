//! sph_fluid - particle fluid simulation for Bevy
//!
//! This library provides a Smoothed Particle Hydrodynamics (SPH) solver in
//! two and three dimensions, built for interactive use.
//!
//! # Features
//!
//! - **Double-Density Relaxation**: Pressure plus near-pressure for stable, splashy water
//! - **Spatial Hashing**: Sorted hash grid with one key per particle
//! - **Parallel Stages**: Every per-particle pass runs on rayon
//! - **2D and 3D**: One solver, generic over `Vec2` / `Vec3`
//! - **Pointer Interaction**: Attract or repel fluid around a point
//! - **Easy Integration**: Simple Bevy plugin interface
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use sph_fluid::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(MinimalPlugins)
//!         .add_plugins(FluidPlugin2d::new(FluidParams::water().with_particle_count(2000)))
//!         .add_systems(Update, drag_fluid)
//!         .run();
//! }
//!
//! fn drag_fluid(time: Res<Time>, mut pointer: ResMut<PointerInteraction<Vec2>>) {
//!     let x = time.elapsed_secs().sin() * 3.0;
//!     *pointer = PointerInteraction::attract(Vec2::new(x, 0.0), 2.0, 50.0);
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`fluid`]: Core fluid simulation module
//!   - [`fluid::vector`]: 2D/3D vector abstraction
//!   - [`fluid::kernels`]: Smoothing kernels
//!   - [`fluid::params`]: Simulation parameters
//!   - [`fluid::particle`]: Particle data structures
//!   - [`fluid::spatial`]: Spatial hashing for neighbor search
//!   - [`fluid::boundary`]: Boundary handling
//!   - [`fluid::interaction`]: Pointer force
//!   - [`fluid::solver`]: SPH substep pipeline
//!   - [`fluid::simulation`]: Frame stepping
//!   - [`fluid::plugin`]: Bevy plugin

pub mod fluid;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::fluid::prelude::*;
}
