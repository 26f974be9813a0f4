use crate::{
    autodiff::Dual22,
    differentiator::Differentiator,
    traits::BivariateFunction,
    types::{Derivative, Method},
};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Rectangular sampling grid, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub x_min: f64,
    pub x_max: f64,
    pub x_step: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub y_step: f64,
}

impl Grid {
    fn validate(&self) -> Result<()> {
        let axes = [
            ("x", self.x_min, self.x_max, self.x_step),
            ("y", self.y_min, self.y_max, self.y_step),
        ];
        for (axis, min, max, step) in axes {
            if !(min.is_finite() && max.is_finite()) {
                bail!("Grid {axis} bounds must be finite, got [{min}, {max}]");
            }
            if min > max {
                bail!("Grid {axis}_min ({min}) exceeds {axis}_max ({max})");
            }
            if !(step.is_finite() && step > 0.0) {
                bail!("Grid {axis}_step must be positive, got {step}");
            }
        }
        Ok(())
    }

    /// Samples along one axis, generated by index so rounding never drifts
    /// past the upper bound.
    fn axis(min: f64, max: f64, step: f64) -> impl Iterator<Item = f64> {
        let count = ((max - min) / step + 1e-9).floor() as usize + 1;
        (0..count).map(move |i| min + i as f64 * step)
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        Self::axis(self.x_min, self.x_max, self.x_step)
            .flat_map(move |x| Self::axis(self.y_min, self.y_max, self.y_step).map(move |y| (x, y)))
    }

    pub fn len(&self) -> usize {
        Self::axis(self.x_min, self.x_max, self.x_step).count()
            * Self::axis(self.y_min, self.y_max, self.y_step).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Worst-case error of one method against a reference derivative over a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MethodError {
    pub method: Method,
    pub derivative: Derivative,
    pub max_abs_error: f64,
    /// Grid point where `max_abs_error` was attained.
    pub worst_point: (f64, f64),
    pub samples: usize,
}

/// Largest `|exact(x, y) − computed(x, y)|` over every grid point.
pub fn max_abs_error<F, E>(
    differentiator: &Differentiator,
    derivative: Derivative,
    method: Method,
    f: &F,
    exact: E,
    grid: &Grid,
) -> Result<MethodError>
where
    F: BivariateFunction<f64> + BivariateFunction<Dual22> + ?Sized,
    E: Fn(f64, f64) -> f64,
{
    grid.validate()?;

    let mut worst = MethodError {
        method,
        derivative,
        max_abs_error: 0.0,
        worst_point: (grid.x_min, grid.y_min),
        samples: 0,
    };
    for (x, y) in grid.points() {
        let computed = differentiator
            .evaluate(derivative, method, f, x, y)
            .with_context(|| format!("{method} failed for {derivative} at ({x}, {y})"))?;
        let err = (exact(x, y) - computed).abs();
        // NaN errors must surface as the worst case, not be skipped by `>`.
        if err > worst.max_abs_error || (err.is_nan() && !worst.max_abs_error.is_nan()) {
            worst.max_abs_error = err;
            worst.worst_point = (x, y);
        }
        worst.samples += 1;
    }
    tracing::debug!(
        %method,
        %derivative,
        max_abs_error = worst.max_abs_error,
        samples = worst.samples,
        "grid sweep finished"
    );
    Ok(worst)
}

/// Runs [`max_abs_error`] for every [`Method`], in [`Method::ALL`] order.
pub fn compare_methods<F, E>(
    differentiator: &Differentiator,
    derivative: Derivative,
    f: &F,
    exact: E,
    grid: &Grid,
) -> Result<Vec<MethodError>>
where
    F: BivariateFunction<f64> + BivariateFunction<Dual22> + ?Sized,
    E: Fn(f64, f64) -> f64,
{
    Method::ALL
        .iter()
        .map(|&method| max_abs_error(differentiator, derivative, method, f, &exact, grid))
        .collect()
}
