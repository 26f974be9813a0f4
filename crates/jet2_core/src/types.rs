//! Closed selector enums shared by the stencil engine, the dual-number type
//! and the dispatcher.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which partial derivative is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Derivative {
    X,
    Y,
    XX,
    YY,
    XY,
}

impl Derivative {
    pub const ALL: [Derivative; 5] = [
        Derivative::X,
        Derivative::Y,
        Derivative::XX,
        Derivative::YY,
        Derivative::XY,
    ];

    /// 1 for gradient channels, 2 for Hessian channels.
    pub fn order(self) -> u32 {
        match self {
            Derivative::X | Derivative::Y => 1,
            Derivative::XX | Derivative::YY | Derivative::XY => 2,
        }
    }
}

impl fmt::Display for Derivative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Derivative::X => "d/dx",
            Derivative::Y => "d/dy",
            Derivative::XX => "d2/dx2",
            Derivative::YY => "d2/dy2",
            Derivative::XY => "d2/dxdy",
        };
        f.write_str(name)
    }
}

/// Differentiation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Central 3-point stencil, O(h²).
    Stencil3,
    /// 3-point stencil refined by Richardson extrapolation.
    Stencil3Extra,
    /// Central 5-point stencil, O(h⁴) (the mixed partial uses the O(h²) cross stencil).
    Stencil5,
    /// 5-point stencil refined by Richardson extrapolation.
    Stencil5Extra,
    /// Forward-mode automatic differentiation through [`crate::autodiff::Dual22`].
    ForwardAd,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Stencil3,
        Method::Stencil3Extra,
        Method::Stencil5,
        Method::Stencil5Extra,
        Method::ForwardAd,
    ];

    pub fn is_stencil(self) -> bool {
        !matches!(self, Method::ForwardAd)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Stencil3 => "stencil3",
            Method::Stencil3Extra => "stencil3_extra",
            Method::Stencil5 => "stencil5",
            Method::Stencil5Extra => "stencil5_extra",
            Method::ForwardAd => "forward_ad",
        };
        f.write_str(name)
    }
}

/// Independent variable used to seed a [`crate::autodiff::Dual22`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    X,
    Y,
}
