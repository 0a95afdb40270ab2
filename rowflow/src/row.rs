//! Dynamic row values and the total ordering behind sort and group keys.
//!
//! A row is an open mapping from field name to a dynamic [`Value`];
//! operators treat fields they do not name as opaque and carry them along.

use std::cmp::Ordering;

use serde_json::Number;
pub use serde_json::Value;
use smallvec::SmallVec;

use crate::error::{Error, Result};

/// One table row.
pub type Row = serde_json::Map<String, Value>;

/// A tuple of key-column values extracted from one row.
pub type Key = SmallVec<[Value; 2]>;

/// Looks up `name` in `row`, failing with [`Error::MissingField`].
pub fn field<'a>(row: &'a Row, name: &str) -> Result<&'a Value> {
    row.get(name).ok_or_else(|| Error::MissingField {
        field: name.to_owned(),
    })
}

/// Looks up `name` and requires it to hold a string.
pub fn field_str<'a>(row: &'a Row, name: &str) -> Result<&'a str> {
    field(row, name)?.as_str().ok_or_else(|| Error::FieldType {
        field: name.to_owned(),
        expected: "string",
    })
}

/// Looks up `name` and requires it to hold a number, widened to `f64`.
pub fn field_f64(row: &Row, name: &str) -> Result<f64> {
    field(row, name)?.as_f64().ok_or_else(|| Error::FieldType {
        field: name.to_owned(),
        expected: "number",
    })
}

/// Extracts the tuple of `fields` values from `row`.
pub fn key_of(row: &Row, fields: &[String]) -> Result<Key> {
    fields
        .iter()
        .map(|name| field(row, name).cloned())
        .collect()
}

/// Total order over dynamic values: type rank first (null < bool < number
/// < string < array < object), natural order within a type. Numbers
/// compare exactly as integers when both sides are integral, otherwise as
/// `f64` under [`f64::total_cmp`].
pub fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => cmp_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (u, v) in x.iter().zip(y) {
                let ord = cmp_values(u, v);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            for ((ka, va), (kb, vb)) in x.iter().zip(y) {
                let ord = ka.cmp(kb).then_with(|| cmp_values(va, vb));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Lexicographic order over key tuples.
pub fn cmp_keys(a: &Key, b: &Key) -> Ordering {
    for (u, v) in a.iter().zip(b) {
        let ord = cmp_values(u, v);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn cmp_numbers(a: &Number, b: &Number) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x.cmp(&y);
    }
    let x = a.as_f64().unwrap_or(f64::NAN);
    let y = b.as_f64().unwrap_or(f64::NAN);
    x.total_cmp(&y)
}

/// Wrapper giving [`Value`] the total order of [`cmp_values`], for use as
/// an ordered map key.
#[derive(Clone, Debug)]
pub(crate) struct OrdValue(pub Value);

impl PartialEq for OrdValue {
    fn eq(&self, other: &Self) -> bool {
        cmp_values(&self.0, &other.0) == Ordering::Equal
    }
}

impl Eq for OrdValue {}

impl PartialOrd for OrdValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdValue {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_values(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numbers_compare_across_representations() {
        assert_eq!(cmp_values(&json!(1), &json!(2)), Ordering::Less);
        assert_eq!(cmp_values(&json!(2), &json!(2.0)), Ordering::Equal);
        assert_eq!(cmp_values(&json!(-1), &json!(0.5)), Ordering::Less);
        assert_eq!(cmp_values(&json!(10), &json!(9.5)), Ordering::Greater);
    }

    #[test]
    fn strings_compare_lexicographically() {
        assert_eq!(cmp_values(&json!("abc"), &json!("abd")), Ordering::Less);
        assert_eq!(cmp_values(&json!("b"), &json!("b")), Ordering::Equal);
    }

    #[test]
    fn mixed_types_order_by_rank() {
        assert_eq!(cmp_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(cmp_values(&json!(true), &json!(0)), Ordering::Less);
        assert_eq!(cmp_values(&json!(99), &json!("a")), Ordering::Less);
    }

    #[test]
    fn key_extraction_reports_missing_fields() {
        let row = json!({"a": 1}).as_object().unwrap().clone();
        let fields = vec!["a".to_owned(), "b".to_owned()];
        let err = key_of(&row, &fields).unwrap_err();
        assert!(matches!(err, Error::MissingField { field } if field == "b"));
    }

    #[test]
    fn keys_compare_lexicographically() {
        let a: Key = [json!(1), json!("x")].into_iter().collect();
        let b: Key = [json!(1), json!("y")].into_iter().collect();
        assert_eq!(cmp_keys(&a, &b), Ordering::Less);
        assert_eq!(cmp_keys(&b, &b), Ordering::Equal);
    }
}
