//! Deep equality
//!
//! Two values are deep-equal when they are the same primitive (NaN matching
//! NaN), or arrays/objects of the same size whose elements or entries are
//! recursively deep-equal. Values of different kinds are never equal.

use super::{is_identifier, Value};
use std::fmt;

/// Structural comparison used by `to_be_equal`, `to_be_not_equal` and
/// `to_contain`.
pub fn deep_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) => true,
        (Value::Null, Value::Null) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => (x.is_nan() && y.is_nan()) || x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equals(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| deep_equals(x, y)))
        }
        _ => false,
    }
}

/// Where two values first stop being deep-equal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    /// Access path from the root, e.g. `.b[2]`; empty for the root itself
    pub path: String,
    /// Short description of the mismatch
    pub reason: String,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{} at {}", self.reason, self.path)
        }
    }
}

/// Locate the first mismatch between `received` and `expected`, walking
/// arrays by index and objects in key order.
pub fn first_difference(received: &Value, expected: &Value) -> Option<Difference> {
    let mut path = String::new();
    find(received, expected, &mut path)
}

fn find(received: &Value, expected: &Value, path: &mut String) -> Option<Difference> {
    let at = |path: &String, reason: String| Difference {
        path: path.clone(),
        reason,
    };
    match (received, expected) {
        (Value::Array(xs), Value::Array(ys)) => {
            for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
                let len = path.len();
                path.push_str(&format!("[{}]", i));
                let found = find(x, y, path);
                path.truncate(len);
                if found.is_some() {
                    return found;
                }
            }
            if xs.len() != ys.len() {
                return Some(at(
                    path,
                    format!("length {} differs from expected {}", xs.len(), ys.len()),
                ));
            }
            None
        }
        (Value::Object(xs), Value::Object(ys)) => {
            if let Some(key) = ys.keys().find(|k| !xs.contains_key(*k)) {
                return Some(at(path, format!("missing key {:?}", key)));
            }
            if let Some(key) = xs.keys().find(|k| !ys.contains_key(*k)) {
                return Some(at(path, format!("unexpected key {:?}", key)));
            }
            for (key, x) in xs {
                let len = path.len();
                if is_identifier(key) {
                    path.push_str(&format!(".{}", key));
                } else {
                    path.push_str(&format!("[{:?}]", key));
                }
                let found = ys.get(key).and_then(|y| find(x, y, path));
                path.truncate(len);
                if found.is_some() {
                    return found;
                }
            }
            None
        }
        _ if deep_equals(received, expected) => None,
        _ if received.type_name() != expected.type_name() => Some(at(
            path,
            format!("{} differs from expected {}", received.type_name(), expected.type_name()),
        )),
        _ => Some(at(path, format!("{} differs from expected {}", received, expected))),
    }
}
