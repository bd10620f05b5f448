//! SPH smoothing kernels.
//!
//! All kernels share the support radius `h` and are exactly zero for
//! `r >= h`, so callers can skip a neighbor with a single distance check.
//! Normalization constants depend only on `h` and the dimension; they are
//! computed once in [`SphKernels::new`] and reused for every evaluation.

use std::f32::consts::PI;

use super::vector::FluidVector;

/// Precomputed kernel coefficients for one smoothing radius and dimension.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphKernels {
    radius: f32,
    radius_sq: f32,
    /// Poly6: 4 / (πh⁸) in 2D, 315 / (64πh⁹) in 3D.
    density_coeff: f32,
    /// (h - r)²: 6 / (πh⁴) in 2D, 15 / (2πh⁵) in 3D.
    near_density_coeff: f32,
    /// Spiky slope: 12 / (πh⁴) in 2D, 15 / (πh⁵) in 3D.
    gradient_coeff: f32,
    /// Viscosity smoothing, same polynomial as poly6 with its own constant.
    viscosity_coeff: f32,
}

impl SphKernels {
    /// Computes the coefficients for radius `h` in `dim` dimensions (2 or 3).
    pub fn new(radius: f32, dim: usize) -> Self {
        let h = radius;
        let (density_coeff, near_density_coeff, gradient_coeff, viscosity_coeff) = if dim == 2 {
            (
                4.0 / (PI * h.powi(8)),
                6.0 / (PI * h.powi(4)),
                12.0 / (PI * h.powi(4)),
                4.0 / (PI * h.powi(8)),
            )
        } else {
            (
                315.0 / (64.0 * PI * h.powi(9)),
                15.0 / (2.0 * PI * h.powi(5)),
                15.0 / (PI * h.powi(5)),
                315.0 / (64.0 * PI * h.powi(9)),
            )
        };

        Self {
            radius: h,
            radius_sq: h * h,
            density_coeff,
            near_density_coeff,
            gradient_coeff,
            viscosity_coeff,
        }
    }

    /// Coefficients for the dimension of `V`.
    pub fn for_dimension<V: FluidVector>(radius: f32) -> Self {
        Self::new(radius, V::DIM)
    }

    /// Whether every coefficient is finite and positive.
    ///
    /// Fails when `h` is so large or so small that a power of it leaves the
    /// f32 range.
    pub fn is_well_conditioned(&self) -> bool {
        [
            self.radius_sq,
            self.density_coeff,
            self.near_density_coeff,
            self.gradient_coeff,
            self.viscosity_coeff,
        ]
        .iter()
        .all(|c| c.is_finite() && *c > 0.0)
    }

    pub fn radius_sq(&self) -> f32 {
        self.radius_sq
    }

    /// Density kernel W(r) ∝ (h² - r²)³.
    #[inline]
    pub fn density(&self, dst: f32) -> f32 {
        self.density_sq(dst * dst)
    }

    /// Density kernel evaluated from a squared distance.
    #[inline]
    pub fn density_sq(&self, dst_sq: f32) -> f32 {
        if dst_sq >= self.radius_sq {
            return 0.0;
        }
        let diff = self.radius_sq - dst_sq;
        self.density_coeff * diff * diff * diff
    }

    /// Near-density kernel W(r) ∝ (h - r)².
    #[inline]
    pub fn near_density(&self, dst: f32) -> f32 {
        if dst >= self.radius {
            return 0.0;
        }
        let diff = self.radius - dst;
        self.near_density_coeff * diff * diff
    }

    /// Slope of the spiky pressure kernel, ∝ -(h - r).
    ///
    /// Non-positive inside the support. The caller supplies the direction,
    /// including a fallback when two particles coincide.
    #[inline]
    pub fn density_derivative(&self, dst: f32) -> f32 {
        if dst >= self.radius {
            return 0.0;
        }
        (dst - self.radius) * self.gradient_coeff
    }

    /// Viscosity weight W(r) ∝ (h² - r²)³.
    #[inline]
    pub fn viscosity(&self, dst: f32) -> f32 {
        let dst_sq = dst * dst;
        if dst_sq >= self.radius_sq {
            return 0.0;
        }
        let diff = self.radius_sq - dst_sq;
        self.viscosity_coeff * diff * diff * diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Integrates a radial kernel over the disk (2D) or ball (3D) of radius h.
    fn integrate_radial(kernel: impl Fn(f32) -> f32, h: f32, dim: usize) -> f64 {
        let steps = 20_000;
        let dr = h as f64 / steps as f64;
        let mut sum = 0.0f64;
        for i in 0..steps {
            let r = (i as f64 + 0.5) * dr;
            let shell = if dim == 2 {
                2.0 * std::f64::consts::PI * r
            } else {
                4.0 * std::f64::consts::PI * r * r
            };
            sum += kernel(r as f32) as f64 * shell * dr;
        }
        sum
    }

    #[test]
    fn test_density_kernel_normalized() {
        for dim in [2, 3] {
            for h in [0.1, 0.5, 1.0, 2.5] {
                let kernels = SphKernels::new(h, dim);
                let total = integrate_radial(|r| kernels.density(r), h, dim);
                assert!((total - 1.0).abs() < 1e-3, "dim={dim} h={h}: integral={total}");
            }
        }
    }

    #[test]
    fn test_near_density_and_viscosity_kernels_normalized() {
        for dim in [2, 3] {
            let h = 0.75;
            let kernels = SphKernels::new(h, dim);
            let near = integrate_radial(|r| kernels.near_density(r), h, dim);
            let viscosity = integrate_radial(|r| kernels.viscosity(r), h, dim);
            assert!((near - 1.0).abs() < 1e-3, "dim={dim}: near integral={near}");
            assert!((viscosity - 1.0).abs() < 1e-3, "dim={dim}: viscosity integral={viscosity}");
        }
    }

    #[test]
    fn test_kernels_zero_outside_support() {
        for dim in [2, 3] {
            let h = 0.5;
            let kernels = SphKernels::new(h, dim);
            for dst in [h, h + 1e-6, 1.0, 100.0] {
                assert_eq!(kernels.density(dst), 0.0);
                assert_eq!(kernels.density_sq(dst * dst), 0.0);
                assert_eq!(kernels.near_density(dst), 0.0);
                assert_eq!(kernels.density_derivative(dst), 0.0);
                assert_eq!(kernels.viscosity(dst), 0.0);
            }
        }
    }

    #[test]
    fn test_kernels_positive_and_decreasing_inside_support() {
        let kernels = SphKernels::new(1.0, 2);
        let w_0 = kernels.density(0.0);
        let w_half = kernels.density(0.5);
        assert!(w_0 > w_half && w_half > 0.0);

        let n_0 = kernels.near_density(0.0);
        let n_half = kernels.near_density(0.5);
        assert!(n_0 > n_half && n_half > 0.0);
    }

    #[test]
    fn test_derivative_is_negative_and_matches_near_kernel_slope() {
        for dim in [2, 3] {
            let kernels = SphKernels::new(0.8, dim);
            for dst in [0.0, 0.1, 0.4, 0.7] {
                let slope = kernels.density_derivative(dst);
                assert!(slope < 0.0);

                let eps = 1e-3;
                let numeric = (kernels.near_density(dst + eps) - kernels.near_density((dst - eps).max(0.0)))
                    / (dst + eps - (dst - eps).max(0.0));
                assert!(
                    (numeric - slope).abs() < 1e-2 * slope.abs().max(1.0),
                    "dim={dim} dst={dst}: numeric={numeric} analytic={slope}"
                );
            }
        }
    }

    #[test]
    fn test_well_conditioned_only_inside_f32_range() {
        for dim in [2, 3] {
            assert!(SphKernels::new(0.5, dim).is_well_conditioned());
            assert!(!SphKernels::new(1e5, dim).is_well_conditioned());
            assert!(!SphKernels::new(1e-5, dim).is_well_conditioned());
        }
    }

    #[test]
    fn test_for_dimension_matches_explicit_dimension() {
        use bevy::prelude::{Vec2, Vec3};
        assert_eq!(SphKernels::for_dimension::<Vec2>(0.3), SphKernels::new(0.3, 2));
        assert_eq!(SphKernels::for_dimension::<Vec3>(0.3), SphKernels::new(0.3, 3));
    }
}
