//! Floating point helpers shared by the TDR engine.

/// Relative tolerance used by [`fp_approx`].
pub const FP_TOLERANCE: f64 = 1.49e-8; // ~ sqrt(f64::EPSILON)

/// Check whether two floats agree up to the relative tolerance
/// [`FP_TOLERANCE`]. Equal infinities are approximately equal.
///
/// # Examples
///
/// ```
/// use tdrgen::utils::fp_approx;
///
/// assert!(fp_approx(1.0, 1.0 + 1e-12));
/// assert!(!fp_approx(1.0, 1.001));
/// assert!(fp_approx(f64::INFINITY, f64::INFINITY));
/// ```
pub fn fp_approx(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() <= FP_TOLERANCE * a.abs().max(b.abs())
}

/// `a < b` and the two are not approximately equal.
pub fn fp_less(a: f64, b: f64) -> bool {
    a < b && !fp_approx(a, b)
}

/// `a > b` and the two are not approximately equal.
pub fn fp_greater(a: f64, b: f64) -> bool {
    a > b && !fp_approx(a, b)
}

/// "Arc-mean" of two points: the mean taken on the `atan` scale.
///
/// Works for unbounded end points, which is why the setup uses it to split
/// intervals whose hat area is infinite.
///
/// # Examples
///
/// ```
/// use tdrgen::utils::arcmean;
///
/// assert!((arcmean(-1.0, 1.0)).abs() < 1e-12);
/// assert!(arcmean(1.0, f64::INFINITY) > 1.0);
/// assert!(arcmean(1.0, f64::INFINITY).is_finite());
/// ```
pub fn arcmean(x0: f64, x1: f64) -> f64 {
    let (x0, x1) = if x0 > x1 { (x1, x0) } else { (x0, x1) };

    // both far out: harmonic mean is stable where atan saturates
    if x1 < -1.0e3 || x0 > 1.0e3 {
        return 2.0 / (1.0 / x0 + 1.0 / x1);
    }

    let a0 = if x0 == f64::NEG_INFINITY {
        -std::f64::consts::FRAC_PI_2
    } else {
        x0.atan()
    };
    let a1 = if x1 == f64::INFINITY {
        std::f64::consts::FRAC_PI_2
    } else {
        x1.atan()
    };

    if (a0 - a1).abs() < 1.0e-6 {
        0.5 * x0 + 0.5 * x1
    } else {
        (0.5 * (a0 + a1)).tan()
    }
}

/// Midpoint that does not overflow for large finite end points.
pub fn midpoint(x0: f64, x1: f64) -> f64 {
    0.5 * x0 + 0.5 * x1
}

/// Serde helpers for floats that may be infinite.
///
/// JSON has no infinities (`serde_json` writes them as `null`), so finite
/// values stay numbers while `inf`, `-inf` and `NaN` are written as strings.
/// Reading accepts either form.
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Bound {
///     #[serde(with = "tdrgen::utils::extended_float")]
///     x: f64,
/// }
///
/// let json = serde_json::to_string(&Bound { x: f64::NEG_INFINITY }).unwrap();
/// assert_eq!(json, r#"{"x":"-inf"}"#);
/// let back: Bound = serde_json::from_str(&json).unwrap();
/// assert_eq!(back.x, f64::NEG_INFINITY);
/// ```
pub mod extended_float {
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    impl Repr {
        fn into_f64<E: de::Error>(self) -> Result<f64, E> {
            match self {
                Repr::Number(x) => Ok(x),
                Repr::Text(s) => s
                    .trim()
                    .parse()
                    .map_err(|_| E::custom(format!("invalid float {s:?}"))),
            }
        }
    }

    struct Extended(f64);

    impl Serialize for Extended {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serialize(&self.0, serializer)
        }
    }

    pub fn serialize<S: Serializer>(x: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if x.is_finite() {
            serializer.serialize_f64(*x)
        } else {
            serializer.collect_str(x)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Repr::deserialize(deserializer)?.into_f64()
    }

    /// The same encoding for an optional `(left, right)` pair.
    pub mod pair {
        use super::*;

        pub fn serialize<S: Serializer>(
            pair: &Option<(f64, f64)>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match pair {
                Some((left, right)) => {
                    serializer.serialize_some(&(Extended(*left), Extended(*right)))
                }
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<(f64, f64)>, D::Error> {
            match Option::<(Repr, Repr)>::deserialize(deserializer)? {
                Some((left, right)) => Ok(Some((
                    left.into_f64::<D::Error>()?,
                    right.into_f64::<D::Error>()?,
                ))),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fp_approx_relative() {
        assert!(fp_approx(1.0e10, 1.0e10 + 1.0));
        assert!(!fp_approx(1.0, 1.0 + 1e-6));
        assert!(fp_approx(0.0, 0.0));
        assert!(!fp_approx(f64::INFINITY, 1.0));
        assert!(!fp_approx(f64::NAN, f64::NAN));
    }

    #[test]
    fn test_fp_ordering() {
        assert!(fp_less(1.0, 2.0));
        assert!(!fp_less(1.0, 1.0 + 1e-12));
        assert!(fp_greater(2.0, 1.0));
        assert!(!fp_greater(1.0 + 1e-12, 1.0));
    }

    #[test]
    fn test_arcmean_symmetric_and_bounded() {
        let m = arcmean(f64::NEG_INFINITY, f64::INFINITY);
        assert!(m.abs() < 1e-12);
        let m = arcmean(2.0, f64::INFINITY);
        assert!(m > 2.0 && m.is_finite());
        let m = arcmean(f64::NEG_INFINITY, -2.0);
        assert!(m < -2.0 && m.is_finite());
        // order does not matter
        assert_eq!(arcmean(3.0, 5.0), arcmean(5.0, 3.0));
    }

    #[test]
    fn test_arcmean_far_out_uses_harmonic_mean() {
        let m = arcmean(2.0e3, 4.0e3);
        assert!((m - 2.0 / (1.0 / 2.0e3 + 1.0 / 4.0e3)).abs() < 1e-9);
        let m = arcmean(2.0e3, f64::INFINITY);
        assert!((m - 4.0e3).abs() < 1e-9);
    }

    #[test]
    fn test_midpoint_no_overflow() {
        assert_eq!(midpoint(f64::MAX, f64::MAX), f64::MAX);
        assert_eq!(midpoint(-1.0, 3.0), 1.0);
    }

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Bounds {
        #[serde(with = "extended_float")]
        x: f64,
        #[serde(with = "extended_float::pair")]
        domain: Option<(f64, f64)>,
    }

    #[test]
    fn test_extended_float_keeps_infinities() {
        let bounds = Bounds {
            x: f64::INFINITY,
            domain: Some((f64::NEG_INFINITY, 2.5)),
        };
        let json = serde_json::to_string(&bounds).unwrap();
        assert_eq!(json, r#"{"x":"inf","domain":["-inf",2.5]}"#);
        assert_eq!(serde_json::from_str::<Bounds>(&json).unwrap(), bounds);

        let back: Bounds = serde_json::from_str(r#"{"x": 1, "domain": null}"#).unwrap();
        assert_eq!(back, Bounds { x: 1.0, domain: None });
        assert!(serde_json::from_str::<Bounds>(r#"{"x": "wide", "domain": null}"#).is_err());
    }
}
