//! Generic ordering of cell values
//!
//! Numbers (integers and reals) compare numerically, strings lexicographically,
//! booleans with `false < true`. Values of different kinds order by kind.
//! Missing values always sort last, in both directions.

use crate::value::Value;
use std::cmp::Ordering;

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Int(_) | Value::Real(_) => 1,
        Value::Str(_) => 2,
        Value::Null => 3,
    }
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => kind_rank(a).cmp(&kind_rank(b)),
        },
    }
}

/// Ascending order, missing values last
pub fn ascending(a: &Value, b: &Value) -> Ordering {
    match (a.is_missing(), b.is_missing()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare_present(a, b),
    }
}

/// Descending order, missing values last
pub fn descending(a: &Value, b: &Value) -> Ordering {
    match (a.is_missing(), b.is_missing()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare_present(b, a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_compare_across_kinds() {
        assert_eq!(ascending(&Value::Int(2), &Value::Real(2.5)), Ordering::Less);
        assert_eq!(ascending(&Value::Real(3.0), &Value::Int(3)), Ordering::Equal);
        assert_eq!(descending(&Value::Int(2), &Value::Real(2.5)), Ordering::Greater);
    }

    #[test]
    fn test_missing_sorts_last() {
        let mut values = vec![Value::Null, Value::Int(3), Value::Real(f64::NAN), Value::Int(1)];
        values.sort_by(ascending);
        assert_eq!(values[0], Value::Int(1));
        assert_eq!(values[1], Value::Int(3));
        assert!(values[2].is_missing() && values[3].is_missing());

        values.sort_by(descending);
        assert_eq!(values[0], Value::Int(3));
        assert_eq!(values[1], Value::Int(1));
        assert!(values[2].is_missing());
    }

    #[test]
    fn test_strings_lexicographic() {
        let mut values: Vec<Value> = vec!["b".into(), "a".into(), "c".into()];
        values.sort_by(ascending);
        assert_eq!(values, vec![Value::from("a"), Value::from("b"), Value::from("c")]);
    }
}
