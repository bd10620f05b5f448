//! Dimension abstraction shared by the 2D and 3D simulations.
//!
//! Every stage of the solver is written once against [`FluidVector`] and
//! instantiated for [`Vec2`] and [`Vec3`]. The trait carries everything that
//! depends on dimensionality: the integer cell type used by the spatial hash,
//! the neighbor cell stencil and the per-axis hash primes. Kernel
//! normalization picks its constants from [`FluidVector::DIM`].

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use bevy::prelude::*;

/// Large primes mixed into the cell hash, one per axis.
pub const HASH_PRIMES: [u32; 3] = [15_823, 9_737_333, 440_817_757];

static NEIGHBOR_OFFSETS_2D: [IVec2; 9] = [
    IVec2::new(0, 0),
    IVec2::new(0, 1),
    IVec2::new(0, -1),
    IVec2::new(-1, 0),
    IVec2::new(-1, 1),
    IVec2::new(-1, -1),
    IVec2::new(1, 0),
    IVec2::new(1, 1),
    IVec2::new(1, -1),
];

static NEIGHBOR_OFFSETS_3D: [IVec3; 27] = [
    IVec3::new(0, 0, 0),
    IVec3::new(0, 0, 1),
    IVec3::new(0, 0, -1),
    IVec3::new(0, 1, 0),
    IVec3::new(0, 1, 1),
    IVec3::new(0, 1, -1),
    IVec3::new(0, -1, 0),
    IVec3::new(0, -1, 1),
    IVec3::new(0, -1, -1),
    IVec3::new(-1, 0, 0),
    IVec3::new(-1, 0, 1),
    IVec3::new(-1, 0, -1),
    IVec3::new(-1, 1, 0),
    IVec3::new(-1, 1, 1),
    IVec3::new(-1, 1, -1),
    IVec3::new(-1, -1, 0),
    IVec3::new(-1, -1, 1),
    IVec3::new(-1, -1, -1),
    IVec3::new(1, 0, 0),
    IVec3::new(1, 0, 1),
    IVec3::new(1, 0, -1),
    IVec3::new(1, 1, 0),
    IVec3::new(1, 1, 1),
    IVec3::new(1, 1, -1),
    IVec3::new(1, -1, 0),
    IVec3::new(1, -1, 1),
    IVec3::new(1, -1, -1),
];

/// Largest neighbor stencil over all supported dimensions.
pub const MAX_NEIGHBOR_CELLS: usize = 27;

/// A 2D or 3D real vector the fluid solver can run on.
pub trait FluidVector:
    Copy
    + Debug
    + Default
    + PartialEq
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f32, Output = Self>
    + Div<f32, Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign<f32>
{
    /// Number of spatial axes.
    const DIM: usize;

    /// The zero vector.
    const ZERO: Self;

    /// Integer grid coordinate of a spatial hash cell.
    type Cell: Copy + Debug + PartialEq + Eq + Send + Sync;

    /// The 3^DIM cell offsets visited by a neighbor query, origin first.
    fn neighbor_offsets() -> &'static [Self::Cell];

    /// `floor(self / cell_size)` componentwise.
    fn cell_of(self, cell_size: f32) -> Self::Cell;

    /// Cell coordinate shifted by an offset.
    fn offset_cell(cell: Self::Cell, offset: Self::Cell) -> Self::Cell;

    /// Per-axis prime multiply-and-sum with wrapping arithmetic.
    fn hash_cell(cell: Self::Cell) -> u32;

    fn length(self) -> f32;

    fn length_squared(self) -> f32;

    fn splat(value: f32) -> Self;

    /// Component on `axis` (0 = x, 1 = y, 2 = z).
    fn axis(self, axis: usize) -> f32;

    fn set_axis(&mut self, axis: usize, value: f32);

    /// Unit vector along which gravity pulls (-Y).
    fn down() -> Self;

    /// Direction used when two particles coincide exactly. The solver
    /// negates it for one particle of the pair.
    fn fallback_direction() -> Self;

    /// Truncates a 3D vector to this dimension.
    fn from_vec3(v: Vec3) -> Self;

    /// Widens to 3D, padding with zero.
    fn to_vec3(self) -> Vec3;
}

impl FluidVector for Vec2 {
    const DIM: usize = 2;
    const ZERO: Self = Vec2::ZERO;

    type Cell = IVec2;

    fn neighbor_offsets() -> &'static [IVec2] {
        &NEIGHBOR_OFFSETS_2D
    }

    #[inline]
    fn cell_of(self, cell_size: f32) -> IVec2 {
        (self / cell_size).floor().as_ivec2()
    }

    #[inline]
    fn offset_cell(cell: IVec2, offset: IVec2) -> IVec2 {
        cell.wrapping_add(offset)
    }

    #[inline]
    fn hash_cell(cell: IVec2) -> u32 {
        let a = (cell.x as u32).wrapping_mul(HASH_PRIMES[0]);
        let b = (cell.y as u32).wrapping_mul(HASH_PRIMES[1]);
        a.wrapping_add(b)
    }

    #[inline]
    fn length(self) -> f32 {
        Vec2::length(self)
    }

    #[inline]
    fn length_squared(self) -> f32 {
        Vec2::length_squared(self)
    }

    fn splat(value: f32) -> Self {
        Vec2::splat(value)
    }

    #[inline]
    fn axis(self, axis: usize) -> f32 {
        self[axis]
    }

    #[inline]
    fn set_axis(&mut self, axis: usize, value: f32) {
        self[axis] = value;
    }

    fn down() -> Self {
        Vec2::NEG_Y
    }

    fn fallback_direction() -> Self {
        Vec2::Y
    }

    fn from_vec3(v: Vec3) -> Self {
        v.truncate()
    }

    fn to_vec3(self) -> Vec3 {
        self.extend(0.0)
    }
}

impl FluidVector for Vec3 {
    const DIM: usize = 3;
    const ZERO: Self = Vec3::ZERO;

    type Cell = IVec3;

    fn neighbor_offsets() -> &'static [IVec3] {
        &NEIGHBOR_OFFSETS_3D
    }

    #[inline]
    fn cell_of(self, cell_size: f32) -> IVec3 {
        (self / cell_size).floor().as_ivec3()
    }

    #[inline]
    fn offset_cell(cell: IVec3, offset: IVec3) -> IVec3 {
        cell.wrapping_add(offset)
    }

    #[inline]
    fn hash_cell(cell: IVec3) -> u32 {
        let a = (cell.x as u32).wrapping_mul(HASH_PRIMES[0]);
        let b = (cell.y as u32).wrapping_mul(HASH_PRIMES[1]);
        let c = (cell.z as u32).wrapping_mul(HASH_PRIMES[2]);
        a.wrapping_add(b).wrapping_add(c)
    }

    #[inline]
    fn length(self) -> f32 {
        Vec3::length(self)
    }

    #[inline]
    fn length_squared(self) -> f32 {
        Vec3::length_squared(self)
    }

    fn splat(value: f32) -> Self {
        Vec3::splat(value)
    }

    #[inline]
    fn axis(self, axis: usize) -> f32 {
        self[axis]
    }

    #[inline]
    fn set_axis(&mut self, axis: usize, value: f32) {
        self[axis] = value;
    }

    fn down() -> Self {
        Vec3::NEG_Y
    }

    fn fallback_direction() -> Self {
        Vec3::new(0.0, 1.0, -1.0).normalize()
    }

    fn from_vec3(v: Vec3) -> Self {
        v
    }

    fn to_vec3(self) -> Vec3 {
        self
    }
}
