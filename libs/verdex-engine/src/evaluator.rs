//! Tolerant Structural Comparator
//!
//! **Core Responsibility:**
//! Decide whether a decoded actual value matches a decoded expected value.
//!
//! Pure and symmetric. Numeric leaves get relative-tolerance closeness when
//! either side is non-integral; sequences compare element-wise regardless of
//! their source grammar; everything else is exact.

use verdex_common::value::DecodedValue;

/// Relative tolerance for non-integral numeric comparison.
pub const REL_TOLERANCE: f64 = 1e-5;

/// Tolerant structural equality between two decoded values.
pub fn tolerant_equal(actual: &DecodedValue, expected: &DecodedValue) -> bool {
    if let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) {
        return if actual.is_integral() && expected.is_integral() {
            a == b
        } else {
            is_close(a, b)
        };
    }
    match (actual, expected) {
        (DecodedValue::Seq(a), DecodedValue::Seq(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| tolerant_equal(x, y))
        }
        _ => actual == expected,
    }
}

fn is_close(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() <= REL_TOLERANCE * a.abs().max(b.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(items: Vec<DecodedValue>) -> DecodedValue {
        DecodedValue::Seq(items)
    }

    #[test]
    fn test_close_floats_equal() {
        assert!(tolerant_equal(
            &DecodedValue::Float(0.1),
            &DecodedValue::Float(0.1000001)
        ));
    }

    #[test]
    fn test_distinct_integers_not_equal() {
        assert!(!tolerant_equal(&DecodedValue::Int(1), &DecodedValue::Int(2)));
    }

    #[test]
    fn test_int_and_whole_float_equal() {
        assert!(tolerant_equal(&DecodedValue::Int(3), &DecodedValue::Float(3.0)));
    }

    #[test]
    fn test_integral_comparison_is_exact() {
        assert!(!tolerant_equal(
            &DecodedValue::Int(100_000),
            &DecodedValue::Int(100_001)
        ));
    }

    #[test]
    fn test_tolerance_applies_when_one_side_fractional() {
        assert!(tolerant_equal(
            &DecodedValue::Int(100_000),
            &DecodedValue::Float(100_000.5)
        ));
    }

    #[test]
    fn test_sequences_recurse() {
        let a = seq(vec![DecodedValue::Float(0.1), DecodedValue::Int(2)]);
        let b = seq(vec![DecodedValue::Float(0.1000001), DecodedValue::Int(2)]);
        assert!(tolerant_equal(&a, &b));
    }

    #[test]
    fn test_sequences_differ_by_element() {
        let a = seq(vec![
            DecodedValue::Int(1),
            DecodedValue::Int(2),
            DecodedValue::Int(3),
        ]);
        let b = seq(vec![
            DecodedValue::Int(1),
            DecodedValue::Int(2),
            DecodedValue::Int(4),
        ]);
        assert!(!tolerant_equal(&a, &b));
    }

    #[test]
    fn test_sequences_differ_by_length() {
        let a = seq(vec![DecodedValue::Int(1)]);
        let b = seq(vec![DecodedValue::Int(1), DecodedValue::Int(2)]);
        assert!(!tolerant_equal(&a, &b));
    }

    #[test]
    fn test_strings_compare_exactly() {
        assert!(tolerant_equal(
            &DecodedValue::Str("abc".to_string()),
            &DecodedValue::Str("abc".to_string())
        ));
        assert!(!tolerant_equal(
            &DecodedValue::Str("abc".to_string()),
            &DecodedValue::Str("abd".to_string())
        ));
    }

    #[test]
    fn test_number_and_string_not_equal() {
        assert!(!tolerant_equal(
            &DecodedValue::Int(1),
            &DecodedValue::Str("1".to_string())
        ));
    }

    #[test]
    fn test_symmetry() {
        let a = DecodedValue::Float(0.1);
        let b = DecodedValue::Float(0.1000001);
        assert_eq!(tolerant_equal(&a, &b), tolerant_equal(&b, &a));
    }

    #[test]
    fn test_infinities() {
        assert!(tolerant_equal(
            &DecodedValue::Float(f64::INFINITY),
            &DecodedValue::Float(f64::INFINITY)
        ));
        assert!(!tolerant_equal(
            &DecodedValue::Float(f64::INFINITY),
            &DecodedValue::Float(1.0)
        ));
    }
}
