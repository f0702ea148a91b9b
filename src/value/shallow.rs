use super::Value;
use std::rc::Rc;

/// Identity comparison: scalars by value, everything shared by reference.
///
/// Ints and floats compare numerically; NaN is never equal to anything.
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
        (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
        (Value::Opaque(a), Value::Opaque(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

/// One-level comparison used for memoization.
///
/// Two lists (or two maps) are equal when they have the same length and every
/// item (or key) is [`strict_eq`]. Nothing is compared recursively, so
/// `{a: []}` and `{a: []}` built separately are *not* equal. Every other
/// pairing falls back to [`strict_eq`].
pub fn shallow_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(x), Value::List(y)) => {
            Rc::ptr_eq(x, y)
                || (x.len() == y.len() && x.iter().zip(y.iter()).all(|(l, r)| strict_eq(l, r)))
        }
        (Value::Map(x), Value::Map(y)) => {
            Rc::ptr_eq(x, y)
                || (x.len() == y.len()
                    && x.iter()
                        .all(|(key, l)| y.get(key).is_some_and(|r| strict_eq(l, r))))
        }
        _ => strict_eq(a, b),
    }
}

/// Element-wise [`shallow_eq`] over two input lists.
pub fn shallow_eq_all(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(l, r)| shallow_eq(l, r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn scalars_compare_by_value() {
        assert!(shallow_eq(&Value::from(0), &Value::from(0)));
        assert!(!shallow_eq(&Value::from(0), &Value::from(1)));
        assert!(!shallow_eq(&Value::from(0), &Value::from(false)));
        assert!(!shallow_eq(&Value::from(0), &Value::Null));
        assert!(!shallow_eq(&Value::from(0), &Value::from("")));
        assert!(!shallow_eq(&Value::Null, &Value::from(false)));
        assert!(shallow_eq(&Value::Null, &Value::Null));
        assert!(shallow_eq(&Value::from(""), &Value::from("")));
        assert!(!shallow_eq(&Value::from(""), &Value::from("abc")));
        assert!(shallow_eq(&Value::from(1), &Value::from(1.0)));
        assert!(!shallow_eq(&Value::from(f64::NAN), &Value::from(f64::NAN)));
    }

    #[test]
    fn lists_compare_one_level() {
        let shared = v(json!({}));
        assert!(shallow_eq(&v(json!([])), &v(json!([]))));
        assert!(shallow_eq(&v(json!([1, 2, 3])), &v(json!([1, 2, 3]))));
        assert!(shallow_eq(
            &Value::list([shared.clone()]),
            &Value::list([shared])
        ));
        assert!(!shallow_eq(&v(json!([1, 2])), &v(json!([1, 2, 3]))));
        assert!(!shallow_eq(&v(json!([{}])), &v(json!([{}]))));
        assert!(!shallow_eq(&v(json!(["a", "b"])), &v(json!({"0": "a", "1": "b"}))));
        assert!(!shallow_eq(&v(json!([])), &Value::Null));
        assert!(!shallow_eq(&v(json!([])), &v(json!({}))));
    }

    #[test]
    fn maps_compare_one_level() {
        let reference = v(json!({}));
        assert!(shallow_eq(&reference, &reference.clone()));
        assert!(shallow_eq(&v(json!({})), &v(json!({}))));
        assert!(shallow_eq(&v(json!({"a": 1})), &v(json!({"a": 1}))));
        assert!(!shallow_eq(&v(json!({})), &v(json!({"a": 1}))));
        assert!(!shallow_eq(&v(json!({"a": 1})), &v(json!({"b": 1}))));
        assert!(!shallow_eq(&v(json!({"a": []})), &v(json!({"a": []}))));
        assert!(!shallow_eq(
            &v(json!({"a": 1, "b": {}})),
            &v(json!({"a": 1, "b": {}}))
        ));
    }

    #[test]
    fn opaque_values_compare_by_identity() {
        let handler = Value::opaque(|| ());
        assert!(shallow_eq(&handler, &handler.clone()));
        assert!(!shallow_eq(&Value::opaque(|| ()), &Value::opaque(|| ())));
        assert!(!shallow_eq(&handler, &Value::Null));
    }

    #[test]
    fn input_lists_compare_element_wise() {
        let items = v(json!([1]));
        assert!(shallow_eq_all(
            &[items.clone(), Value::from(2)],
            &[items.clone(), Value::from(2)]
        ));
        assert!(!shallow_eq_all(&[items.clone()], &[items.clone(), Value::Null]));
        assert!(!shallow_eq_all(&[v(json!({"a": []}))], &[v(json!({"a": []}))]));
    }
}
