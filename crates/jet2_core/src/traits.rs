use num_traits::{FromPrimitive, One, Zero};
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A trait for types that user functions can be evaluated on.
/// Implemented by `f64` (stencil path) and `Dual22` (forward-AD path), so a
/// function written once against `Scalar` serves both.
///
/// The operation set is deliberately the one `Dual22` can propagate exactly:
/// arithmetic with `Self` and with `f64`, negation, `sin`, `cos` and `exp`.
pub trait Scalar:
    Copy
    + Debug
    + Zero
    + One
    + FromPrimitive
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
    + 'static
{
    /// Lifts a plain number (zero derivatives for jet types).
    fn constant(value: f64) -> Self;

    /// The plain numeric value, discarding any derivative information.
    fn value(&self) -> f64;

    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn exp(self) -> Self;
}

impl Scalar for f64 {
    fn constant(value: f64) -> Self {
        value
    }

    fn value(&self) -> f64 {
        *self
    }

    fn sin(self) -> Self {
        f64::sin(self)
    }

    fn cos(self) -> Self {
        f64::cos(self)
    }

    fn exp(self) -> Self {
        f64::exp(self)
    }
}

/// A scalar function of two variables, f(x, y).
///
/// Implement it generically (`impl<T: Scalar> BivariateFunction<T> for F`) to get
/// the numeric and the dual-number forms from a single definition.
pub trait BivariateFunction<T: Scalar> {
    fn apply(&self, x: T, y: T) -> T;
}

impl<T: Scalar, F: BivariateFunction<T> + ?Sized> BivariateFunction<T> for &F {
    fn apply(&self, x: T, y: T) -> T {
        (**self).apply(x, y)
    }
}
