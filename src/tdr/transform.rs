//! The transform family `T_c` and the closed-form integrals of its hat pieces
//!
//! A hat piece is the back-transformed straight line
//! `h(t) = T^{-1}(Tfx0 + slope * (t - x0))`. Everything the engine needs about
//! a piece (its area, its inverse CDF, its value) has a closed form for the
//! transforms supported here.

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    tdr::{LOG_INVERSION_CUTOFF, LOG_LINEAR_CUTOFF, POWER_LINEAR_CUTOFF},
};

/// The transform `T_c` applied to the density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// `c = 0`: `T(y) = ln(y)`
    Log,
    /// `c = -1/2`: `T(y) = -1 / sqrt(y)`
    InvSqrt,
    /// `-1 < c < 0`: `T(y) = -y^c`
    Power { c: f64 },
}

impl Transform {
    /// Select the transform for parameter `c`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransform`] unless `c = 0`, `c = -0.5` or
    /// `-1 < c < 0`.
    pub fn from_c(c: f64) -> Result<Self> {
        if c == 0.0 {
            Ok(Transform::Log)
        } else if c == -0.5 {
            Ok(Transform::InvSqrt)
        } else if c > -1.0 && c < 0.0 {
            Ok(Transform::Power { c })
        } else {
            Err(Error::InvalidTransform { c })
        }
    }

    /// The parameter `c` of this transform.
    pub fn c(&self) -> f64 {
        match self {
            Transform::Log => 0.0,
            Transform::InvSqrt => -0.5,
            Transform::Power { c } => *c,
        }
    }

    /// `T(y)`. Returns `-inf` for `y = 0`.
    pub fn apply(&self, y: f64) -> f64 {
        if y <= 0.0 {
            return f64::NEG_INFINITY;
        }
        match self {
            Transform::Log => y.ln(),
            Transform::InvSqrt => -1.0 / y.sqrt(),
            Transform::Power { c } => -y.powf(*c),
        }
    }

    /// `T^{-1}(z)`. Values of `z` outside the range of `T` map to `+inf`.
    pub fn invert(&self, z: f64) -> f64 {
        match self {
            Transform::Log => z.exp(),
            Transform::InvSqrt => {
                if z < 0.0 {
                    1.0 / (z * z)
                } else {
                    f64::INFINITY
                }
            }
            Transform::Power { c } => {
                if z < 0.0 {
                    (-z).powf(1.0 / c)
                } else {
                    f64::INFINITY
                }
            }
        }
    }

    /// Derivative of `T(f(x))` given `f(x)` and `f'(x)`.
    ///
    /// Returns the `+inf` sentinel when `fx = 0`: the transformed density is
    /// `-inf` there and its tangent is vertical.
    pub fn derivative(&self, fx: f64, dfx: f64) -> f64 {
        if fx <= 0.0 {
            return f64::INFINITY;
        }
        match self {
            Transform::Log => dfx / fx,
            Transform::InvSqrt => 0.5 * dfx / (fx * fx.sqrt()),
            Transform::Power { c } => -c * fx.powf(c - 1.0) * dfx,
        }
    }

    /// Value of the hat piece through `(x0, Tfx0)` with `slope`, at `x`.
    pub fn line_value(&self, x0: f64, tfx0: f64, slope: f64, x: f64) -> f64 {
        if x == x0 {
            return self.invert(tfx0);
        }
        self.invert(tfx0 + slope * (x - x0))
    }

    /// Area below the hat piece through `(x0, fx0, Tfx0)` with `slope`, between
    /// `x0` and `x1` (either order, either may be infinite on the far side).
    ///
    /// Returns `+inf` when the piece is not integrable over the range: the
    /// exponential blows up (log transform) or the transformed line reaches
    /// zero (power transforms). A point with `fx0 = 0` carries no area.
    pub fn area(&self, x0: f64, fx0: f64, tfx0: f64, slope: f64, x1: f64) -> f64 {
        if !(fx0 > 0.0) || x0 == x1 {
            return 0.0;
        }
        let dx = x1 - x0;

        let area = if dx.is_infinite() {
            self.tail_area(fx0, tfx0, slope, dx.signum())
        } else {
            self.finite_area(fx0, tfx0, slope, dx)
        };

        if area.is_nan() { f64::INFINITY } else { area }
    }

    fn tail_area(&self, fx0: f64, tfx0: f64, slope: f64, direction: f64) -> f64 {
        // integrable only when the line decreases toward the tail
        if slope * direction >= 0.0 {
            return f64::INFINITY;
        }
        let slope = slope.abs();
        match self {
            Transform::Log => fx0 / slope,
            Transform::InvSqrt => 1.0 / (tfx0.abs() * slope),
            Transform::Power { c } => {
                let e = 1.0 + 1.0 / c;
                (-tfx0).powf(e) / (slope * e.abs())
            }
        }
    }

    fn finite_area(&self, fx0: f64, tfx0: f64, slope: f64, dx: f64) -> f64 {
        if slope == 0.0 {
            return fx0 * dx.abs();
        }
        match self {
            Transform::Log => {
                let t = slope * dx;
                if t.abs() < LOG_LINEAR_CUTOFF {
                    (fx0 * dx).abs()
                } else {
                    (fx0 * t.exp_m1() / slope).abs()
                }
            }
            Transform::InvSqrt => {
                let tfx1 = tfx0 + slope * dx;
                if tfx1 >= 0.0 {
                    return f64::INFINITY;
                }
                (dx / (tfx0 * tfx1)).abs()
            }
            Transform::Power { c } => {
                let tfx1 = tfx0 + slope * dx;
                if tfx1 >= 0.0 {
                    return f64::INFINITY;
                }
                if (slope * dx).abs() < POWER_LINEAR_CUTOFF * tfx0.abs() {
                    return fx0 * dx.abs();
                }
                let e = 1.0 + 1.0 / c;
                (((-tfx1).powf(e) - (-tfx0).powf(e)) / (slope * e)).abs()
            }
        }
    }

    /// Inverse of [`Transform::area`]: the point `t` such that the hat piece
    /// through `(x0, fx0, Tfx0)` with `slope` has area `|a|` between `x0` and
    /// `t`, with `t > x0` for `a > 0` and `t < x0` for `a < 0`.
    ///
    /// Returns an infinite value when `|a|` exceeds the area available in that
    /// direction (this only happens through round-off).
    pub fn invert_area(&self, x0: f64, fx0: f64, tfx0: f64, slope: f64, a: f64) -> f64 {
        if a == 0.0 {
            return x0;
        }
        let runaway = if a > 0.0 {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
        if slope == 0.0 {
            return x0 + a / fx0;
        }

        match self {
            Transform::Log => {
                let t = a * slope / fx0;
                if t <= -1.0 {
                    return runaway;
                }
                // ln(1 + t) / t, stable near t = 0
                let factor = if t.abs() > LOG_INVERSION_CUTOFF {
                    t.ln_1p() / t
                } else {
                    1.0 - 0.5 * t
                };
                x0 + a / fx0 * factor
            }
            Transform::InvSqrt => {
                let denom = 1.0 - a * tfx0 * slope;
                if denom <= 0.0 {
                    return runaway;
                }
                x0 + tfx0 * tfx0 * a / denom
            }
            Transform::Power { c } => {
                let e = 1.0 + 1.0 / c;
                let start = (-tfx0).powf(e);
                let shift = a * slope * e;
                if shift.abs() < POWER_LINEAR_CUTOFF * start {
                    return x0 + a / fx0;
                }
                let base = start - shift;
                if base <= 0.0 {
                    return runaway;
                }
                let tfx = -base.powf(1.0 / e);
                x0 + (tfx - tfx0) / slope
            }
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::InvSqrt
    }
}
