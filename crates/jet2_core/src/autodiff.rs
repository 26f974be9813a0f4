use crate::error::DiffError;
use crate::traits::Scalar;
use crate::types::{Derivative, Variable};
use num_traits::{FromPrimitive, One, Zero};
use serde::Serialize;
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign,
};

/// Second-order jet of a scalar function of two variables.
/// val: value
/// grad: [d/dX, d/dY]
/// hess: [d²/dX², d²/dY², d²/dXdY] (the Hessian is symmetric, one cross term is enough)
///
/// Arithmetic and `sin`/`cos`/`exp` propagate all six channels with the
/// closed-form chain rule, so evaluating an expression on seeded variables
/// yields its exact gradient and Hessian.
///
/// A division by a zero-valued divisor through the `/` operator cannot return
/// an error, so it poisons the result instead: every channel becomes NaN and
/// the poison travels through later operations until [`Dual22::into_result`]
/// turns it into [`DiffError::DivisionByZero`]. Use [`Dual22::checked_div`] to
/// fail at the division itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dual22 {
    val: f64,
    grad: [f64; 2],
    hess: [f64; 3],
    poisoned: bool,
}

impl Dual22 {
    pub fn new(val: f64, grad: [f64; 2], hess: [f64; 3]) -> Self {
        Self {
            val,
            grad,
            hess,
            poisoned: false,
        }
    }

    /// A constant: zero gradient, zero Hessian.
    pub fn constant(val: f64) -> Self {
        Self::new(val, [0.0; 2], [0.0; 3])
    }

    /// An independent variable: unit gradient along `var`, zero Hessian.
    pub fn variable(var: Variable, val: f64) -> Self {
        let grad = match var {
            Variable::X => [1.0, 0.0],
            Variable::Y => [0.0, 1.0],
        };
        Self::new(val, grad, [0.0; 3])
    }

    fn poison() -> Self {
        tracing::warn!("dual-number division by zero; result poisoned");
        Self {
            val: f64::NAN,
            grad: [f64::NAN; 2],
            hess: [f64::NAN; 3],
            poisoned: true,
        }
    }

    pub fn value(&self) -> f64 {
        self.val
    }

    pub fn gradient(&self) -> [f64; 2] {
        self.grad
    }

    pub fn hessian(&self) -> [f64; 3] {
        self.hess
    }

    pub fn derivative(&self, derivative: Derivative) -> f64 {
        match derivative {
            Derivative::X => self.grad[0],
            Derivative::Y => self.grad[1],
            Derivative::XX => self.hess[0],
            Derivative::YY => self.hess[1],
            Derivative::XY => self.hess[2],
        }
    }

    /// True once any division in this value's history had a zero divisor.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn into_result(self) -> Result<Self, DiffError> {
        if self.poisoned {
            Err(DiffError::DivisionByZero)
        } else {
            Ok(self)
        }
    }

    /// Quotient `self / rhs`, failing if `rhs` has a zero value.
    ///
    /// With q = u/v, differentiating u = q·v once and twice gives
    /// q_i = (u_i − q·v_i)/v and q_ij = (u_ij − q_i·v_j − q_j·v_i − q·v_ij)/v.
    pub fn checked_div(self, rhs: Self) -> Result<Self, DiffError> {
        if rhs.val == 0.0 {
            return Err(DiffError::DivisionByZero);
        }
        let (u, v) = (self, rhs);
        let q = u.val / v.val;
        let q1 = (u.grad[0] - q * v.grad[0]) / v.val;
        let q2 = (u.grad[1] - q * v.grad[1]) / v.val;
        let q11 = (u.hess[0] - 2.0 * q1 * v.grad[0] - q * v.hess[0]) / v.val;
        let q22 = (u.hess[1] - 2.0 * q2 * v.grad[1] - q * v.hess[1]) / v.val;
        let q12 = (u.hess[2] - q1 * v.grad[1] - q2 * v.grad[0] - q * v.hess[2]) / v.val;
        Ok(Self {
            val: q,
            grad: [q1, q2],
            hess: [q11, q22, q12],
            poisoned: u.poisoned || v.poisoned,
        })
    }

    /// Division by a plain number, failing if `rhs` is zero.
    pub fn checked_div_scalar(self, rhs: f64) -> Result<Self, DiffError> {
        if rhs == 0.0 {
            return Err(DiffError::DivisionByZero);
        }
        Ok(self.scale(1.0 / rhs))
    }

    fn scale(self, k: f64) -> Self {
        Self {
            val: self.val * k,
            grad: [self.grad[0] * k, self.grad[1] * k],
            hess: [self.hess[0] * k, self.hess[1] * k, self.hess[2] * k],
            poisoned: self.poisoned,
        }
    }

    /// Applies a scalar function with first and second derivatives `d1`, `d2`
    /// at `self.val`: g_i = d1·u_i, h_ij = d1·u_ij + d2·u_i·u_j.
    fn chain(self, val: f64, d1: f64, d2: f64) -> Self {
        let [g1, g2] = self.grad;
        let [h11, h22, h12] = self.hess;
        Self {
            val,
            grad: [d1 * g1, d1 * g2],
            hess: [
                d1 * h11 + d2 * g1 * g1,
                d1 * h22 + d2 * g2 * g2,
                d1 * h12 + d2 * g1 * g2,
            ],
            poisoned: self.poisoned,
        }
    }

    pub fn sin(self) -> Self {
        let (s, c) = self.val.sin_cos();
        self.chain(s, c, -s)
    }

    pub fn cos(self) -> Self {
        let (s, c) = self.val.sin_cos();
        self.chain(c, -s, -c)
    }

    pub fn exp(self) -> Self {
        let e = self.val.exp();
        self.chain(e, e, e)
    }
}

impl From<f64> for Dual22 {
    fn from(val: f64) -> Self {
        Self::constant(val)
    }
}

impl Zero for Dual22 {
    fn zero() -> Self {
        Self::constant(0.0)
    }
    fn is_zero(&self) -> bool {
        self.val == 0.0 && self.grad == [0.0; 2] && self.hess == [0.0; 3]
    }
}

impl One for Dual22 {
    fn one() -> Self {
        Self::constant(1.0)
    }
}

impl FromPrimitive for Dual22 {
    fn from_i64(n: i64) -> Option<Self> {
        Some(Self::constant(n as f64))
    }
    fn from_u64(n: u64) -> Option<Self> {
        Some(Self::constant(n as f64))
    }
    fn from_f64(n: f64) -> Option<Self> {
        Some(Self::constant(n))
    }
}

impl Scalar for Dual22 {
    fn constant(value: f64) -> Self {
        Dual22::constant(value)
    }
    fn value(&self) -> f64 {
        self.val
    }
    fn sin(self) -> Self {
        Dual22::sin(self)
    }
    fn cos(self) -> Self {
        Dual22::cos(self)
    }
    fn exp(self) -> Self {
        Dual22::exp(self)
    }
}

// --- Dual22 (op) Dual22 ---

impl Neg for Dual22 {
    type Output = Self;
    fn neg(self) -> Self {
        self.scale(-1.0)
    }
}

impl Add for Dual22 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            val: self.val + rhs.val,
            grad: [self.grad[0] + rhs.grad[0], self.grad[1] + rhs.grad[1]],
            hess: [
                self.hess[0] + rhs.hess[0],
                self.hess[1] + rhs.hess[1],
                self.hess[2] + rhs.hess[2],
            ],
            poisoned: self.poisoned || rhs.poisoned,
        }
    }
}

impl Sub for Dual22 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Mul for Dual22 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let (u, v) = (self, rhs);
        Self {
            val: u.val * v.val,
            grad: [
                u.grad[0] * v.val + u.val * v.grad[0],
                u.grad[1] * v.val + u.val * v.grad[1],
            ],
            hess: [
                u.hess[0] * v.val + 2.0 * u.grad[0] * v.grad[0] + u.val * v.hess[0],
                u.hess[1] * v.val + 2.0 * u.grad[1] * v.grad[1] + u.val * v.hess[1],
                u.hess[2] * v.val
                    + u.grad[0] * v.grad[1]
                    + u.grad[1] * v.grad[0]
                    + u.val * v.hess[2],
            ],
            poisoned: u.poisoned || v.poisoned,
        }
    }
}

impl Div for Dual22 {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        self.checked_div(rhs).unwrap_or_else(|_| Self::poison())
    }
}

// --- Dual22 (op) f64 ---

impl Add<f64> for Dual22 {
    type Output = Self;
    fn add(mut self, rhs: f64) -> Self {
        self.val += rhs;
        self
    }
}

impl Sub<f64> for Dual22 {
    type Output = Self;
    fn sub(mut self, rhs: f64) -> Self {
        self.val -= rhs;
        self
    }
}

impl Mul<f64> for Dual22 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        self.scale(rhs)
    }
}

impl Div<f64> for Dual22 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        self.checked_div_scalar(rhs)
            .unwrap_or_else(|_| Self::poison())
    }
}

// --- f64 (op) Dual22 ---

impl Add<Dual22> for f64 {
    type Output = Dual22;
    fn add(self, rhs: Dual22) -> Dual22 {
        rhs + self
    }
}

impl Sub<Dual22> for f64 {
    type Output = Dual22;
    fn sub(self, rhs: Dual22) -> Dual22 {
        -rhs + self
    }
}

impl Mul<Dual22> for f64 {
    type Output = Dual22;
    fn mul(self, rhs: Dual22) -> Dual22 {
        rhs.scale(self)
    }
}

impl Div<Dual22> for f64 {
    type Output = Dual22;
    fn div(self, rhs: Dual22) -> Dual22 {
        Dual22::constant(self) / rhs
    }
}

impl AddAssign for Dual22 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
impl SubAssign for Dual22 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
impl MulAssign for Dual22 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}
impl DivAssign for Dual22 {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}
impl AddAssign<f64> for Dual22 {
    fn add_assign(&mut self, rhs: f64) {
        *self = *self + rhs;
    }
}
impl SubAssign<f64> for Dual22 {
    fn sub_assign(&mut self, rhs: f64) {
        *self = *self - rhs;
    }
}
impl MulAssign<f64> for Dual22 {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}
impl DivAssign<f64> for Dual22 {
    fn div_assign(&mut self, rhs: f64) {
        *self = *self / rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::Dual22;
    use crate::error::DiffError;
    use crate::types::{Derivative, Variable};
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn seeds(x: f64, y: f64) -> (Dual22, Dual22) {
        (
            Dual22::variable(Variable::X, x),
            Dual22::variable(Variable::Y, y),
        )
    }

    fn assert_jet(actual: Dual22, val: f64, grad: [f64; 2], hess: [f64; 3]) {
        assert_abs_diff_eq!(actual.value(), val, epsilon = 1e-12);
        for i in 0..2 {
            assert_abs_diff_eq!(actual.gradient()[i], grad[i], epsilon = 1e-12);
        }
        for i in 0..3 {
            assert_abs_diff_eq!(actual.hessian()[i], hess[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn seeding_sets_a_single_unit_gradient() {
        let (x, y) = seeds(2.0, -3.0);
        assert_eq!(x, Dual22::new(2.0, [1.0, 0.0], [0.0; 3]));
        assert_eq!(y, Dual22::new(-3.0, [0.0, 1.0], [0.0; 3]));
        let c = Dual22::constant(4.0);
        assert_eq!(c.gradient(), [0.0; 2]);
        assert_eq!(c.hessian(), [0.0; 3]);
    }

    #[test]
    fn derivative_reads_each_channel() {
        let d = Dual22::new(0.5, [1.0, 2.0], [3.0, 4.0, 5.0]);
        assert_eq!(d.derivative(Derivative::X), 1.0);
        assert_eq!(d.derivative(Derivative::Y), 2.0);
        assert_eq!(d.derivative(Derivative::XX), 3.0);
        assert_eq!(d.derivative(Derivative::YY), 4.0);
        assert_eq!(d.derivative(Derivative::XY), 5.0);
    }

    #[test]
    fn product_of_variables_has_unit_cross_term() {
        let (x, y) = seeds(3.0, 7.0);
        let f = x * y + 5.0;
        assert_eq!(f.value(), 26.0);
        assert_eq!(f.gradient(), [7.0, 3.0]);
        assert_eq!(f.hessian(), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn square_has_constant_curvature() {
        let (x, _) = seeds(1.5, 0.0);
        assert_jet(x * x, 2.25, [3.0, 0.0], [2.0, 0.0, 0.0]);
    }

    #[test]
    fn quotient_matches_analytic_jet() {
        // f = x / y at (2, 4): f_x = 1/y, f_y = -x/y², f_xx = 0, f_yy = 2x/y³, f_xy = -1/y²
        let (x, y) = seeds(2.0, 4.0);
        assert_jet(x / y, 0.5, [0.25, -0.125], [0.0, 0.0625, -0.0625]);
    }

    #[test]
    fn harmonic_ratio_gradient_is_exact() {
        let (x, y) = seeds(1.0, 1.0);
        let f = x * y / (x + y);
        assert_eq!(f.derivative(Derivative::X), 0.25);
        assert_eq!(f.derivative(Derivative::Y), 0.25);
    }

    #[test]
    fn reciprocal_of_scalar_numerator() {
        // 1/x at x = 2: -1/x², 2/x³
        let (x, _) = seeds(2.0, 0.0);
        assert_jet(1.0 / x, 0.5, [-0.25, 0.0], [0.25, 0.0, 0.0]);
    }

    #[test]
    fn sine_at_pi() {
        let (x, _) = seeds(PI, 0.3);
        let f = x.sin();
        assert_abs_diff_eq!(f.derivative(Derivative::X), -1.0, epsilon = 1e-15);
        assert_eq!(f.derivative(Derivative::Y), 0.0);
        assert_abs_diff_eq!(f.derivative(Derivative::XX), 0.0, epsilon = 1e-15);
        assert_eq!(f.derivative(Derivative::YY), 0.0);
        assert_eq!(f.derivative(Derivative::XY), 0.0);
    }

    #[test]
    fn cosine_of_product() {
        // cos(xy): f_x = -y sin, f_xx = -y² cos, f_xy = -sin - xy cos
        let (x, y) = seeds(0.4, 1.5);
        let (s, c) = (0.6_f64.sin(), 0.6_f64.cos());
        assert_jet(
            (x * y).cos(),
            c,
            [-1.5 * s, -0.4 * s],
            [-2.25 * c, -0.16 * c, -s - 0.6 * c],
        );
    }

    #[test]
    fn exponential_of_sum() {
        let (x, y) = seeds(0.2, -0.1);
        let e = 0.1_f64.exp();
        assert_jet((x + y).exp(), e, [e, e], [e, e, e]);
    }

    #[test]
    fn scalar_operands_on_either_side() {
        let (x, _) = seeds(2.0, 0.0);
        assert_jet(3.0 - x, 1.0, [-1.0, 0.0], [0.0; 3]);
        assert_jet(x - 3.0, -1.0, [1.0, 0.0], [0.0; 3]);
        assert_jet(2.0 * x + 1.0, 5.0, [2.0, 0.0], [0.0; 3]);
        assert_jet(x / 4.0, 0.5, [0.25, 0.0], [0.0; 3]);
    }

    #[test]
    fn compound_assignment_matches_binary_operators() {
        let (x, y) = seeds(1.2, 0.7);
        let mut acc = x;
        acc *= y;
        acc += x;
        acc -= 0.5;
        acc /= y;
        acc *= 2.0;
        let expected = (x * y + x - 0.5) / y * 2.0;
        assert_eq!(acc, expected);
    }

    #[test]
    fn checked_div_rejects_zero_divisor() {
        let err = Dual22::constant(1.0)
            .checked_div(Dual22::constant(0.0))
            .unwrap_err();
        assert_eq!(err, DiffError::DivisionByZero);
        assert_eq!(
            Dual22::constant(1.0).checked_div_scalar(0.0),
            Err(DiffError::DivisionByZero)
        );
    }

    #[test]
    fn operator_division_by_zero_poisons_downstream_values() {
        let (x, _) = seeds(0.0, 1.0);
        let poisoned = (Dual22::constant(1.0) / x).sin() + 2.0;
        assert!(poisoned.is_poisoned());
        assert!(poisoned.value().is_nan());
        assert_eq!(poisoned.into_result(), Err(DiffError::DivisionByZero));

        assert!((2.0 / Dual22::constant(0.0)).is_poisoned());
        assert!((x / 0.0).is_poisoned());
    }

    #[test]
    fn healthy_values_pass_through_into_result() {
        let (x, y) = seeds(1.0, 2.0);
        let f = x / y;
        assert_eq!(f.into_result(), Ok(f));
    }
}
