//! The builtin math functions.
//!
//! Angles of the `*d` variants are in degrees. `arg(x, y)` is the angle of
//! the point `(x, y)`, i.e. `atan2(y, x)`.

use linkme::distributed_slice;

use crate::{BuiltinDescriptor, BuiltinImpl, BUILTINS};

macro_rules! builtin {
    ($item:ident, $name:literal, $sig:literal, $doc:literal, $imp:expr) => {
        #[distributed_slice(BUILTINS)]
        static $item: BuiltinDescriptor = BuiltinDescriptor {
            name: $name,
            signature: $sig,
            doc: $doc,
            implementation: $imp,
        };
    };
}

const fn float1(f: fn(f64) -> f64) -> BuiltinImpl {
    BuiltinImpl::Unary {
        int: None,
        float: Some(f),
    }
}

const fn float2(f: fn(f64, f64) -> f64) -> BuiltinImpl {
    BuiltinImpl::Binary {
        int: None,
        float: Some(f),
    }
}

// === Trigonometry ===

fn sin(x: f64) -> f64 {
    x.sin()
}
fn cos(x: f64) -> f64 {
    x.cos()
}
fn tan(x: f64) -> f64 {
    x.tan()
}
fn sind(x: f64) -> f64 {
    x.to_radians().sin()
}
fn cosd(x: f64) -> f64 {
    x.to_radians().cos()
}
fn tand(x: f64) -> f64 {
    x.to_radians().tan()
}
fn asin(x: f64) -> f64 {
    x.asin()
}
fn acos(x: f64) -> f64 {
    x.acos()
}
fn atan(x: f64) -> f64 {
    x.atan()
}
fn asind(x: f64) -> f64 {
    x.asin().to_degrees()
}
fn acosd(x: f64) -> f64 {
    x.acos().to_degrees()
}
fn atand(x: f64) -> f64 {
    x.atan().to_degrees()
}
fn atan2(y: f64, x: f64) -> f64 {
    y.atan2(x)
}
fn atan2d(y: f64, x: f64) -> f64 {
    y.atan2(x).to_degrees()
}
fn arg(x: f64, y: f64) -> f64 {
    y.atan2(x)
}
fn argd(x: f64, y: f64) -> f64 {
    y.atan2(x).to_degrees()
}

builtin!(SIN, "sin", "sin(x)", "Sine of x radians", float1(sin));
builtin!(COS, "cos", "cos(x)", "Cosine of x radians", float1(cos));
builtin!(TAN, "tan", "tan(x)", "Tangent of x radians", float1(tan));
builtin!(SIND, "sind", "sind(x)", "Sine of x degrees", float1(sind));
builtin!(COSD, "cosd", "cosd(x)", "Cosine of x degrees", float1(cosd));
builtin!(TAND, "tand", "tand(x)", "Tangent of x degrees", float1(tand));
builtin!(ASIN, "asin", "asin(x)", "Arc sine in radians", float1(asin));
builtin!(ACOS, "acos", "acos(x)", "Arc cosine in radians", float1(acos));
builtin!(ATAN, "atan", "atan(x)", "Arc tangent in radians", float1(atan));
builtin!(ASIND, "asind", "asind(x)", "Arc sine in degrees", float1(asind));
builtin!(ACOSD, "acosd", "acosd(x)", "Arc cosine in degrees", float1(acosd));
builtin!(ATAND, "atand", "atand(x)", "Arc tangent in degrees", float1(atand));
builtin!(ATAN2, "atan2", "atan2(y, x)", "Four-quadrant arc tangent in radians", float2(atan2));
builtin!(ATAN2D, "atan2d", "atan2d(y, x)", "Four-quadrant arc tangent in degrees", float2(atan2d));
builtin!(ARG, "arg", "arg(x, y)", "Angle of the point (x, y) in radians", float2(arg));
builtin!(ARGD, "argd", "argd(x, y)", "Angle of the point (x, y) in degrees", float2(argd));

// === Exponentials ===

fn log(x: f64) -> f64 {
    x.ln()
}
fn exp(x: f64) -> f64 {
    x.exp()
}
fn log10(x: f64) -> f64 {
    x.log10()
}
fn exp10(x: f64) -> f64 {
    10f64.powf(x)
}
fn sqrt(x: f64) -> f64 {
    x.sqrt()
}

builtin!(LOG, "log", "log(x)", "Natural logarithm", float1(log));
builtin!(EXP, "exp", "exp(x)", "e raised to x", float1(exp));
builtin!(LOG10, "log10", "log10(x)", "Base-10 logarithm", float1(log10));
builtin!(EXP10, "exp10", "exp10(x)", "10 raised to x", float1(exp10));
builtin!(SQRT, "sqrt", "sqrt(x)", "Square root", float1(sqrt));

// === Integer-preserving ===

fn abs_int(i: i64) -> Option<i64> {
    i.checked_abs()
}
fn abs_float(x: f64) -> f64 {
    x.abs()
}
fn min_int(a: i64, b: i64) -> Option<i64> {
    Some(a.min(b))
}
fn min_float(a: f64, b: f64) -> f64 {
    a.min(b)
}
fn max_int(a: i64, b: i64) -> Option<i64> {
    Some(a.max(b))
}
fn max_float(a: f64, b: f64) -> f64 {
    a.max(b)
}
fn mod_int(a: i64, b: i64) -> Option<i64> {
    a.checked_rem(b)
}
fn mod_float(a: f64, b: f64) -> f64 {
    a % b
}
fn step_int(i: i64) -> Option<i64> {
    Some(if i >= 0 { 1 } else { 0 })
}
fn step_float(x: f64) -> f64 {
    if x >= 0.0 {
        1.0
    } else {
        0.0
    }
}
fn floor(x: f64) -> f64 {
    x.floor()
}
fn ceil(x: f64) -> f64 {
    x.ceil()
}

builtin!(
    ABS,
    "abs",
    "abs(x)",
    "Absolute value",
    BuiltinImpl::Unary {
        int: Some(abs_int),
        float: Some(abs_float),
    }
);
builtin!(
    MIN,
    "min",
    "min(a, b)",
    "Smaller of two values",
    BuiltinImpl::Binary {
        int: Some(min_int),
        float: Some(min_float),
    }
);
builtin!(
    MAX,
    "max",
    "max(a, b)",
    "Larger of two values",
    BuiltinImpl::Binary {
        int: Some(max_int),
        float: Some(max_float),
    }
);
builtin!(
    MOD,
    "mod",
    "mod(a, b)",
    "Remainder of a divided by b",
    BuiltinImpl::Remainder {
        int: mod_int,
        float: mod_float,
    }
);
builtin!(
    STEP,
    "step",
    "step(x)",
    "1 for x >= 0, else 0",
    BuiltinImpl::Unary {
        int: Some(step_int),
        float: Some(step_float),
    }
);
builtin!(FLOOR, "floor", "floor(x)", "Largest integral value not above x", float1(floor));
builtin!(CEIL, "ceil", "ceil(x)", "Smallest integral value not below x", float1(ceil));

// === Rounding ===

fn nint_int(i: i64) -> Option<i64> {
    Some(i)
}
fn nint_float(x: f64) -> Option<i64> {
    // half away from zero
    let r = x.round();
    // i64::MAX as f64 is 2^63, one past the largest i64
    (r.is_finite() && r >= i64::MIN as f64 && r < i64::MAX as f64).then_some(r as i64)
}
fn sign_int(i: i64) -> Option<i64> {
    Some(i.signum())
}
fn sign_float(x: f64) -> Option<i64> {
    if x.is_nan() {
        None
    } else if x > 0.0 {
        Some(1)
    } else if x < 0.0 {
        Some(-1)
    } else {
        Some(0)
    }
}

builtin!(
    NINT,
    "nint",
    "nint(x)",
    "Nearest integer",
    BuiltinImpl::Rounding {
        int: nint_int,
        float: nint_float,
    }
);
builtin!(
    SIGN,
    "sign",
    "sign(x)",
    "-1, 0 or 1 according to the sign of x",
    BuiltinImpl::Rounding {
        int: sign_int,
        float: sign_float,
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degree_variants() {
        assert!((sind(90.0) - 1.0).abs() < 1e-12);
        assert!((atan2d(1.0, 1.0) - 45.0).abs() < 1e-12);
        assert!((argd(0.0, 1.0) - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_integer_helpers() {
        assert_eq!(mod_int(7, 3), Some(1));
        assert_eq!(mod_int(7, 0), None);
        assert_eq!(abs_int(i64::MIN), None);
        assert_eq!(step_int(-1), Some(0));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(nint_float(2.5), Some(3));
        assert_eq!(nint_float(-2.5), Some(-3));
        assert_eq!(nint_float(2.4), Some(2));
        assert_eq!(sign_float(-0.1), Some(-1));
        assert_eq!(sign_float(0.0), Some(0));
        assert_eq!(sign_int(-9), Some(-1));
    }

    #[test]
    fn test_rounding_out_of_range() {
        assert_eq!(nint_float(1e300), None);
        assert_eq!(nint_float(-1e300), None);
        assert_eq!(nint_float(f64::NAN), None);
        assert_eq!(nint_float(f64::INFINITY), None);
        assert_eq!(nint_float(-9.2e18), Some(-9_200_000_000_000_000_000));
        assert_eq!(sign_float(f64::NAN), None);
    }

    #[test]
    fn test_exp10() {
        assert_eq!(exp10(2.0), 100.0);
    }
}
