// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Width checks for typed integer results.

use ctu_ssa::{Value, ValueKind};
use ctu_tree::{Digit, Sign, Type};
use num_bigint::BigInt;
use num_traits::One;

use crate::EvalError;

/// Inclusive bounds of a fixed-width integer type. Platform-defined widths
/// have none.
pub fn digit_range(digit: Digit, sign: Sign) -> Option<(BigInt, BigInt)> {
    let bits = digit.bits()?;
    let one = BigInt::one();
    Some(match sign {
        Sign::Signed => (-(&one << (bits - 1)), (&one << (bits - 1)) - 1),
        Sign::Unsigned => (BigInt::from(0), (&one << bits) - 1),
    })
}

/// A warning if `value` is an integer that does not fit its type.
pub fn check_range(value: &Value) -> Option<EvalError> {
    let ValueKind::Digit(n) = &value.kind else {
        return None;
    };
    let Type::Digit { digit, sign } = value.ty.resolved() else {
        return None;
    };
    let (min, max) = digit_range(*digit, *sign)?;
    if *n < min || *n > max {
        Some(EvalError::LiteralOutOfRange {
            ty: value.ty.clone(),
            value: n.clone(),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        let (min, max) = digit_range(Digit::Char, Sign::Signed).unwrap();
        assert_eq!((min, max), (BigInt::from(-128), BigInt::from(127)));
        let (_, max) = digit_range(Digit::Long, Sign::Unsigned).unwrap();
        assert_eq!(max, BigInt::from(u64::MAX));
        assert!(digit_range(Digit::IntMax, Sign::Signed).is_none());
    }

    #[test]
    fn checks() {
        assert!(check_range(&Value::digit(2_147_483_647i64, Type::int())).is_none());
        assert!(check_range(&Value::digit(2_147_483_648i64, Type::int())).is_some());
        assert!(check_range(&Value::digit(-1, Type::uint())).is_some());
        let size = Type::digit(Digit::Size, Sign::Unsigned);
        assert!(check_range(&Value::digit(-1, size)).is_none());
        assert!(check_range(&Value::bool(true)).is_none());
    }
}
