//! Finite-difference approximation of partial derivatives.
//!
//! The function is an opaque `Fn(f64, f64) -> f64`. Two accuracy tiers are
//! provided (central 3-point and 5-point stencils) plus Richardson
//! extrapolation on top of either.

use crate::error::DiffError;
use crate::types::{Derivative, Method};
use serde::{Deserialize, Serialize};

/// Step-size policy shared by every stencil.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StencilConfig {
    /// Base step `h`; scaled per axis by `max(1, |coordinate|)`.
    pub step: f64,
    /// Richardson refinement ratio `n`: the fine pass uses `h / n`. Must be even.
    pub ratio: u32,
    /// Weight the Richardson combination by `n^p` (p = truncation order of the
    /// base stencil) instead of `n²`.
    pub match_order: bool,
}

impl Default for StencilConfig {
    fn default() -> Self {
        Self {
            step: 1e-4,
            ratio: 10,
            match_order: false,
        }
    }
}

impl StencilConfig {
    pub fn validate(&self) -> Result<(), DiffError> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(DiffError::InvalidConfig(format!(
                "step must be finite and positive, got {}",
                self.step
            )));
        }
        if self.ratio < 2 || self.ratio % 2 != 0 {
            return Err(DiffError::InvalidConfig(format!(
                "Richardson ratio must be an even number >= 2, got {}",
                self.ratio
            )));
        }
        Ok(())
    }
}

/// Per-axis steps: `h·max(1, |x|)` and `h·max(1, |y|)`.
fn scaled_steps(step: f64, x: f64, y: f64) -> (f64, f64) {
    (step * x.abs().max(1.0), step * y.abs().max(1.0))
}

/// Central 3-point stencil, O(h²).
pub fn three_point<F>(f: &F, derivative: Derivative, x: f64, y: f64, step: f64) -> f64
where
    F: Fn(f64, f64) -> f64 + ?Sized,
{
    let (hx, hy) = scaled_steps(step, x, y);
    match derivative {
        Derivative::X => (f(x + hx, y) - f(x - hx, y)) / (2.0 * hx),
        Derivative::Y => (f(x, y + hy) - f(x, y - hy)) / (2.0 * hy),
        Derivative::XX => (f(x + hx, y) - 2.0 * f(x, y) + f(x - hx, y)) / (hx * hx),
        Derivative::YY => (f(x, y + hy) - 2.0 * f(x, y) + f(x, y - hy)) / (hy * hy),
        Derivative::XY => {
            // ∂x at y ± hy, then a central difference of those in y.
            let d_plus = three_point(f, Derivative::X, x, y + hy, step);
            let d_minus = three_point(f, Derivative::X, x, y - hy, step);
            (d_plus - d_minus) / (2.0 * hy)
        }
    }
}

/// Central 5-point stencil, O(h⁴). The mixed partial uses the 4-point cross
/// stencil, which is O(h²).
pub fn five_point<F>(f: &F, derivative: Derivative, x: f64, y: f64, step: f64) -> f64
where
    F: Fn(f64, f64) -> f64 + ?Sized,
{
    let (hx, hy) = scaled_steps(step, x, y);
    match derivative {
        Derivative::X => {
            (-f(x + 2.0 * hx, y) + 8.0 * f(x + hx, y) - 8.0 * f(x - hx, y)
                + f(x - 2.0 * hx, y))
                / (12.0 * hx)
        }
        Derivative::Y => {
            (-f(x, y + 2.0 * hy) + 8.0 * f(x, y + hy) - 8.0 * f(x, y - hy)
                + f(x, y - 2.0 * hy))
                / (12.0 * hy)
        }
        Derivative::XX => {
            (-f(x + 2.0 * hx, y) + 16.0 * f(x + hx, y) - 30.0 * f(x, y)
                + 16.0 * f(x - hx, y)
                - f(x - 2.0 * hx, y))
                / (12.0 * hx * hx)
        }
        Derivative::YY => {
            (-f(x, y + 2.0 * hy) + 16.0 * f(x, y + hy) - 30.0 * f(x, y)
                + 16.0 * f(x, y - hy)
                - f(x, y - 2.0 * hy))
                / (12.0 * hy * hy)
        }
        Derivative::XY => {
            (f(x + hx, y + hy) - f(x - hx, y + hy) - f(x + hx, y - hy) + f(x - hx, y - hy))
                / (4.0 * hx * hy)
        }
    }
}

/// Leading truncation order of a plain stencil for one derivative.
fn truncation_order(base: Method, derivative: Derivative) -> Result<i32, DiffError> {
    match (base, derivative) {
        (Method::Stencil3, _) => Ok(2),
        (Method::Stencil5, Derivative::XY) => Ok(2),
        (Method::Stencil5, _) => Ok(4),
        (other, _) => Err(DiffError::InvalidMethod(other)),
    }
}

/// Stencil evaluator bound to a validated [`StencilConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StencilEngine {
    config: StencilConfig,
}

impl StencilEngine {
    pub fn new(config: StencilConfig) -> Result<Self, DiffError> {
        config.validate()?;
        tracing::debug!(
            step = config.step,
            ratio = config.ratio,
            match_order = config.match_order,
            "stencil engine configured"
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &StencilConfig {
        &self.config
    }

    pub fn three_point<F>(&self, f: &F, derivative: Derivative, x: f64, y: f64) -> f64
    where
        F: Fn(f64, f64) -> f64 + ?Sized,
    {
        three_point(f, derivative, x, y, self.config.step)
    }

    pub fn five_point<F>(&self, f: &F, derivative: Derivative, x: f64, y: f64) -> f64
    where
        F: Fn(f64, f64) -> f64 + ?Sized,
    {
        five_point(f, derivative, x, y, self.config.step)
    }

    /// Richardson extrapolation of a plain stencil.
    ///
    /// Evaluates `base` at `h` and at `h/n` and returns
    /// `(w·D_fine − D_coarse) / (w − 1)` with `w = n²`, or `w = n^p` when
    /// `match_order` is set. Only [`Method::Stencil3`] and [`Method::Stencil5`]
    /// are accepted as `base`.
    pub fn extrapolated<F>(
        &self,
        f: &F,
        derivative: Derivative,
        base: Method,
        x: f64,
        y: f64,
    ) -> Result<f64, DiffError>
    where
        F: Fn(f64, f64) -> f64 + ?Sized,
    {
        let order = truncation_order(base, derivative).map_err(|err| {
            tracing::warn!(%base, "rejected Richardson extrapolation base");
            err
        })?;
        let step = self.config.step;
        let n = f64::from(self.config.ratio);
        let (coarse, fine) = match base {
            Method::Stencil3 => (
                three_point(f, derivative, x, y, step),
                three_point(f, derivative, x, y, step / n),
            ),
            _ => (
                five_point(f, derivative, x, y, step),
                five_point(f, derivative, x, y, step / n),
            ),
        };
        let weight = if self.config.match_order {
            n.powi(order)
        } else {
            n * n
        };
        tracing::debug!(%base, %derivative, coarse, fine, weight, "richardson combination");
        Ok((weight * fine - coarse) / (weight - 1.0))
    }

    /// Dispatches any stencil [`Method`]; [`Method::ForwardAd`] is rejected.
    pub fn approximate<F>(
        &self,
        f: &F,
        derivative: Derivative,
        method: Method,
        x: f64,
        y: f64,
    ) -> Result<f64, DiffError>
    where
        F: Fn(f64, f64) -> f64 + ?Sized,
    {
        match method {
            Method::Stencil3 => Ok(self.three_point(f, derivative, x, y)),
            Method::Stencil5 => Ok(self.five_point(f, derivative, x, y)),
            Method::Stencil3Extra => self.extrapolated(f, derivative, Method::Stencil3, x, y),
            Method::Stencil5Extra => self.extrapolated(f, derivative, Method::Stencil5, x, y),
            Method::ForwardAd => Err(DiffError::InvalidMethod(method)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::cell::Cell;

    fn cubic(x: f64, y: f64) -> f64 {
        x * x * x + 2.0 * x * y * y
    }

    #[test]
    fn default_config_matches_documented_policy() {
        let config = StencilConfig::default();
        assert_eq!(config.step, 1e-4);
        assert_eq!(config.ratio, 10);
        assert!(!config.match_order);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_bad_step_and_odd_ratio() {
        for step in [0.0, -1e-3, f64::NAN, f64::INFINITY] {
            let config = StencilConfig {
                step,
                ..StencilConfig::default()
            };
            assert!(matches!(config.validate(), Err(DiffError::InvalidConfig(_))));
        }
        for ratio in [0, 1, 3, 7] {
            let config = StencilConfig {
                ratio,
                ..StencilConfig::default()
            };
            assert!(StencilEngine::new(config).is_err());
        }
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: StencilConfig = serde_json::from_str(r#"{"step": 0.001}"#).unwrap();
        assert_eq!(config.step, 1e-3);
        assert_eq!(config.ratio, 10);
    }

    #[test]
    fn steps_scale_with_large_coordinates_only() {
        assert_eq!(scaled_steps(1e-4, 0.5, -0.2), (1e-4, 1e-4));
        let (hx, hy) = scaled_steps(1e-4, -200.0, 3.0);
        assert_abs_diff_eq!(hx, 2e-2, epsilon = 1e-15);
        assert_abs_diff_eq!(hy, 3e-4, epsilon = 1e-15);
    }

    #[test]
    fn three_point_on_cubic() {
        // f_x = 3x² + 2y², f_y = 4xy, f_xx = 6x, f_yy = 4x, f_xy = 4y
        let (x, y) = (0.7, -0.4);
        let h = 1e-4;
        assert_abs_diff_eq!(three_point(&cubic, Derivative::X, x, y, h), 1.79, epsilon = 1e-7);
        assert_abs_diff_eq!(three_point(&cubic, Derivative::Y, x, y, h), -1.12, epsilon = 1e-7);
        assert_abs_diff_eq!(three_point(&cubic, Derivative::XX, x, y, h), 4.2, epsilon = 1e-5);
        assert_abs_diff_eq!(three_point(&cubic, Derivative::YY, x, y, h), 2.8, epsilon = 1e-5);
        assert_abs_diff_eq!(three_point(&cubic, Derivative::XY, x, y, h), -1.6, epsilon = 1e-5);
    }

    #[test]
    fn five_point_on_cubic() {
        let (x, y) = (0.7, -0.4);
        let h = 1e-3;
        assert_abs_diff_eq!(five_point(&cubic, Derivative::X, x, y, h), 1.79, epsilon = 1e-10);
        assert_abs_diff_eq!(five_point(&cubic, Derivative::Y, x, y, h), -1.12, epsilon = 1e-10);
        assert_abs_diff_eq!(five_point(&cubic, Derivative::XX, x, y, h), 4.2, epsilon = 1e-7);
        assert_abs_diff_eq!(five_point(&cubic, Derivative::YY, x, y, h), 2.8, epsilon = 1e-7);
        assert_abs_diff_eq!(five_point(&cubic, Derivative::XY, x, y, h), -1.6, epsilon = 1e-7);
    }

    #[test]
    fn evaluation_counts_match_stencil_width() {
        let calls = Cell::new(0usize);
        let f = |x: f64, y: f64| {
            calls.set(calls.get() + 1);
            x * y
        };
        let expected = [
            (Derivative::X, 2, 4),
            (Derivative::XX, 3, 5),
            (Derivative::XY, 4, 4),
        ];
        for (derivative, three, five) in expected {
            calls.set(0);
            three_point(&f, derivative, 1.0, 1.0, 1e-4);
            assert_eq!(calls.get(), three, "3-point {derivative}");
            calls.set(0);
            five_point(&f, derivative, 1.0, 1.0, 1e-4);
            assert_eq!(calls.get(), five, "5-point {derivative}");
        }
    }

    #[test]
    fn richardson_improves_three_point_first_derivative() {
        let engine = StencilEngine::new(StencilConfig {
            step: 1e-2,
            ..StencilConfig::default()
        })
        .unwrap();
        let f = |x: f64, _y: f64| x.sin();
        let exact = 0.3_f64.cos();
        let plain = engine.three_point(&f, Derivative::X, 0.3, 0.0);
        let extra = engine
            .extrapolated(&f, Derivative::X, Method::Stencil3, 0.3, 0.0)
            .unwrap();
        assert!((extra - exact).abs() < (plain - exact).abs() / 100.0);
    }

    #[test]
    fn richardson_uses_ratio_squared_weighting() {
        let engine = StencilEngine::default();
        let f = |x: f64, y: f64| (x * y).exp();
        let coarse = three_point(&f, Derivative::Y, 0.5, 0.2, 1e-4);
        let fine = three_point(&f, Derivative::Y, 0.5, 0.2, 1e-4 / 10.0);
        let extra = engine
            .extrapolated(&f, Derivative::Y, Method::Stencil3, 0.5, 0.2)
            .unwrap();
        assert_eq!(extra, (100.0 * fine - coarse) / 99.0);
    }

    #[test]
    fn order_matched_weighting_cancels_fourth_order_term() {
        let step = 5e-2;
        let plain = StencilEngine::new(StencilConfig {
            step,
            ..StencilConfig::default()
        })
        .unwrap();
        let matched = StencilEngine::new(StencilConfig {
            step,
            match_order: true,
            ..StencilConfig::default()
        })
        .unwrap();
        let f = |x: f64, _y: f64| x.exp();
        let exact = 0.5_f64.exp();
        let squared = plain
            .extrapolated(&f, Derivative::XX, Method::Stencil5, 0.5, 0.0)
            .unwrap();
        let quartic = matched
            .extrapolated(&f, Derivative::XX, Method::Stencil5, 0.5, 0.0)
            .unwrap();
        assert!((quartic - exact).abs() < (squared - exact).abs());
    }

    #[test]
    fn extrapolation_rejects_non_stencil_bases() {
        let engine = StencilEngine::default();
        let f = |x: f64, y: f64| x + y;
        for base in [Method::ForwardAd, Method::Stencil3Extra, Method::Stencil5Extra] {
            assert_eq!(
                engine.extrapolated(&f, Derivative::X, base, 1.0, 1.0),
                Err(DiffError::InvalidMethod(base))
            );
        }
    }

    #[test]
    fn approximate_rejects_forward_ad() {
        let engine = StencilEngine::default();
        let f = |x: f64, y: f64| x * y;
        assert_eq!(
            engine.approximate(&f, Derivative::XY, Method::ForwardAd, 1.0, 2.0),
            Err(DiffError::InvalidMethod(Method::ForwardAd))
        );
        let xy = engine
            .approximate(&f, Derivative::XY, Method::Stencil5, 1.0, 2.0)
            .unwrap();
        assert_abs_diff_eq!(xy, 1.0, epsilon = 1e-6);
    }
}
