//! The `jet2_core` crate computes first- and second-order partial derivatives
//! (∂x, ∂y, ∂xx, ∂yy, ∂xy) of scalar functions of two variables.
//!
//! Key components:
//! - **Traits**: `Scalar` (numeric type abstraction over `f64` and `Dual22`), `BivariateFunction`.
//! - **Autodiff**: `Dual22`, a second-order jet propagating value, gradient and Hessian exactly.
//! - **Stencil**: 3-point and 5-point finite differences with Richardson extrapolation.
//! - **Differentiator**: one dispatch surface over all methods.
//! - **Equation Engine**: text expressions compiled to bytecode, evaluable on any `Scalar`.
//! - **Analysis**: grid sweeps measuring the worst-case error of each method.
pub mod analysis;
pub mod autodiff;
pub mod differentiator;
pub mod equation_engine;
pub mod error;
pub mod stencil;
pub mod traits;
pub mod types;

pub use autodiff::Dual22;
pub use differentiator::{evaluate, Differentiator, FnPair, Partials};
pub use equation_engine::Expression;
pub use error::{DiffError, ExpressionError};
pub use stencil::{StencilConfig, StencilEngine};
pub use traits::{BivariateFunction, Scalar};
pub use types::{Derivative, Method, Variable};
