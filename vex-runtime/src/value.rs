// The tagged value cell (SPEC_FULL §3 "Value cell", §9 "Tagged universal
// cell vs polymorphism"). Modeled as an `enum Value` rather than a packed
// 64-bit word; the packed encoding is the out-of-scope JIT register
// layer's concern, this crate only needs to preserve its semantics.

use crate::container::Container;
use std::rc::Rc;

/// Arbitrary-fixed-point decimal payload: `mantissa * 10^-scale`. The pack
/// carries no decimal-arithmetic crate, so this is the plain
/// scaled-integer representation rather than a `rust_decimal`/`bigdecimal`
/// dependency; it is exact for the widening/rounding coercions §4.1 and
/// §4.3 require (convert to `f64` for comparison, truncate/round to reach
/// an integer slot) without needing a full arithmetic library.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decimal {
    pub mantissa: i64,
    pub scale: u32,
}

impl Decimal {
    pub fn new(mantissa: i64, scale: u32) -> Self {
        Self { mantissa, scale }
    }

    pub fn to_f64(self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float(f64),
    Decimal(Decimal),
    Str(Rc<String>),
    Container(Rc<Container>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Int32,
    Int64,
    Float,
    Decimal,
    Str,
    Container,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int32(_) => ValueKind::Int32,
            Value::Int64(_) => ValueKind::Int64,
            Value::Float(_) => ValueKind::Float,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Str(_) => ValueKind::Str,
            Value::Container(_) => ValueKind::Container,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.kind(),
            ValueKind::Int32 | ValueKind::Int64 | ValueKind::Float | ValueKind::Decimal
        )
    }

    /// Int32/Int64 widened to `i64`; `None` for anything non-integral.
    /// Decimal is not included — narrowing a decimal to an integer is a
    /// rounding coercion (§4.1), not a widening, so callers that need it
    /// go through `as_f64` and round explicitly.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Any numeric kind widened to `f64`; `None` for non-numeric values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(v) => Some(*v as f64),
            Value::Int64(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Decimal(d) => Some(d.to_f64()),
            _ => None,
        }
    }

    /// Whether this value fits a 56-bit signed immediate (the int56
    /// specialized-array slot width, SPEC_FULL §4.2).
    pub fn fits_int56(&self) -> bool {
        const INT56_MIN: i64 = -(1 << 55);
        const INT56_MAX: i64 = (1 << 55) - 1;
        matches!(self, Value::Int32(_)) || matches!(self, Value::Int64(v) if (INT56_MIN..=INT56_MAX).contains(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int64_overflowing_int56_does_not_fit() {
        let v = Value::Int64(1i64 << 60);
        assert!(!v.fits_int56());
    }

    #[test]
    fn int32_always_fits_int56() {
        assert!(Value::Int32(i32::MAX).fits_int56());
        assert!(Value::Int32(i32::MIN).fits_int56());
    }

    #[test]
    fn as_f64_widens_integers() {
        assert_eq!(Value::Int32(3).as_f64(), Some(3.0));
        assert_eq!(Value::Int64(7).as_f64(), Some(7.0));
        assert_eq!(Value::Str(Rc::new("x".into())).as_f64(), None);
    }

    #[test]
    fn decimal_is_numeric_and_widens_to_f64() {
        let v = Value::Decimal(Decimal::new(1250, 2)); // 12.50
        assert!(v.is_numeric());
        assert_eq!(v.as_f64(), Some(12.5));
    }
}
