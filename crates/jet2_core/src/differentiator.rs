//! Single entry point selecting between the stencil engine and forward AD.

use crate::autodiff::Dual22;
use crate::error::DiffError;
use crate::stencil::{StencilConfig, StencilEngine};
use crate::traits::BivariateFunction;
use crate::types::{Derivative, Method, Variable};
use serde::Serialize;

/// Adapter for the case where the numeric and the dual-number forms of a
/// function are written separately, e.g. as two closures.
#[derive(Debug, Clone, Copy)]
pub struct FnPair<N, D> {
    pub numeric: N,
    pub dual: D,
}

impl<N, D> FnPair<N, D>
where
    N: Fn(f64, f64) -> f64,
    D: Fn(Dual22, Dual22) -> Dual22,
{
    pub fn new(numeric: N, dual: D) -> Self {
        Self { numeric, dual }
    }
}

impl<N, D> BivariateFunction<f64> for FnPair<N, D>
where
    N: Fn(f64, f64) -> f64,
{
    fn apply(&self, x: f64, y: f64) -> f64 {
        (self.numeric)(x, y)
    }
}

impl<N, D> BivariateFunction<Dual22> for FnPair<N, D>
where
    D: Fn(Dual22, Dual22) -> Dual22,
{
    fn apply(&self, x: Dual22, y: Dual22) -> Dual22 {
        (self.dual)(x, y)
    }
}

/// All five partials at one point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Partials {
    pub x: f64,
    pub y: f64,
    pub xx: f64,
    pub yy: f64,
    pub xy: f64,
}

impl Partials {
    pub fn get(&self, derivative: Derivative) -> f64 {
        match derivative {
            Derivative::X => self.x,
            Derivative::Y => self.y,
            Derivative::XX => self.xx,
            Derivative::YY => self.yy,
            Derivative::XY => self.xy,
        }
    }

    fn from_jet(jet: &Dual22) -> Self {
        let [x, y] = jet.gradient();
        let [xx, yy, xy] = jet.hessian();
        Self { x, y, xx, yy, xy }
    }
}

/// Dispatches derivative requests to the stencil engine or to forward AD.
///
/// Holds only the stencil step policy; every call is independent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Differentiator {
    stencil: StencilEngine,
}

impl Differentiator {
    pub fn new(config: StencilConfig) -> Result<Self, DiffError> {
        Ok(Self {
            stencil: StencilEngine::new(config)?,
        })
    }

    pub fn stencil(&self) -> &StencilEngine {
        &self.stencil
    }

    /// Computes one partial of `f` at `(x, y)` with the requested method.
    ///
    /// Stencil methods call the `f64` form of `f`; [`Method::ForwardAd`] calls
    /// the [`Dual22`] form once on seeded variables and reads the requested
    /// channel.
    pub fn evaluate<F>(
        &self,
        derivative: Derivative,
        method: Method,
        f: &F,
        x: f64,
        y: f64,
    ) -> Result<f64, DiffError>
    where
        F: BivariateFunction<f64> + BivariateFunction<Dual22> + ?Sized,
    {
        tracing::trace!(%derivative, %method, x, y, "evaluating derivative");
        match method {
            Method::ForwardAd => Ok(self.jet(f, x, y)?.derivative(derivative)),
            _ => {
                let numeric = |x: f64, y: f64| BivariateFunction::<f64>::apply(f, x, y);
                self.stencil.approximate(&numeric, derivative, method, x, y)
            }
        }
    }

    /// Stencil-only variant for callers holding nothing but a numeric closure.
    pub fn evaluate_numeric<F>(
        &self,
        derivative: Derivative,
        method: Method,
        f: &F,
        x: f64,
        y: f64,
    ) -> Result<f64, DiffError>
    where
        F: Fn(f64, f64) -> f64 + ?Sized,
    {
        tracing::trace!(%derivative, %method, x, y, "evaluating numeric derivative");
        self.stencil.approximate(f, derivative, method, x, y)
    }

    /// Value, gradient and Hessian of `f` at `(x, y)` from one AD pass.
    pub fn jet<F>(&self, f: &F, x: f64, y: f64) -> Result<Dual22, DiffError>
    where
        F: BivariateFunction<Dual22> + ?Sized,
    {
        let seeded_x = Dual22::variable(Variable::X, x);
        let seeded_y = Dual22::variable(Variable::Y, y);
        f.apply(seeded_x, seeded_y).into_result()
    }

    /// All five partials at `(x, y)`.
    pub fn partials<F>(&self, method: Method, f: &F, x: f64, y: f64) -> Result<Partials, DiffError>
    where
        F: BivariateFunction<f64> + BivariateFunction<Dual22> + ?Sized,
    {
        if method == Method::ForwardAd {
            return Ok(Partials::from_jet(&self.jet(f, x, y)?));
        }
        Ok(Partials {
            x: self.evaluate(Derivative::X, method, f, x, y)?,
            y: self.evaluate(Derivative::Y, method, f, x, y)?,
            xx: self.evaluate(Derivative::XX, method, f, x, y)?,
            yy: self.evaluate(Derivative::YY, method, f, x, y)?,
            xy: self.evaluate(Derivative::XY, method, f, x, y)?,
        })
    }
}

/// [`Differentiator::evaluate`] with the default step policy.
pub fn evaluate<F>(derivative: Derivative, method: Method, f: &F, x: f64, y: f64) -> Result<f64, DiffError>
where
    F: BivariateFunction<f64> + BivariateFunction<Dual22> + ?Sized,
{
    Differentiator::default().evaluate(derivative, method, f, x, y)
}
