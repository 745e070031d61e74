use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};

/// A dynamic column value as read from a store.
///
/// Comparisons between the two sides never use native equality: they go
/// through [`Value::normalized`], so `Integer(50000)` and `Text("50000")`
/// compare equal. Native `PartialEq`/`Hash` exist only so a raw value can
/// serve as a primary-key lookup key; there numbers are compared by value, so
/// `Integer(1)`, `Float(1.0)` and `Boolean(true)` are one key while
/// `Text("1")` is another.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    /// String normalization used for every cross-side comparison.
    ///
    /// - `Null` → `None`, booleans → `True` / `False`
    /// - integral floats keep one fractional digit (`1.0`)
    /// - floats with magnitude `>= 1e16` or below `1e-4` use scientific
    ///   notation with a signed, two-digit exponent (`1e+16`, `1.5e-05`)
    pub fn normalized(&self) -> String {
        match self {
            Value::Null => "None".to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => normalize_float(*f),
            Value::Text(s) => s.clone(),
            Value::Boolean(true) => "True".to_string(),
            Value::Boolean(false) => "False".to_string(),
        }
    }

    /// Equality under string normalization.
    pub fn loosely_eq(&self, other: &Value) -> bool {
        match (self, other) {
            // Fast path for the common same-type case.
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            _ => self.normalized() == other.normalized(),
        }
    }
}

fn normalize_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }

    let abs = f.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        // `{:e}` gives "1.5e-5"; rewrite the exponent as "e-05".
        let sci = format!("{f:e}");
        return match sci.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(d) => ('-', d),
                    None => ('+', exp),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => sci,
        };
    }

    if f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        // Display is the shortest representation that round-trips.
        format!("{f}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => match (self.number(), other.number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => 0u8.hash(state),
            Value::Text(s) => {
                1u8.hash(state);
                s.hash(state);
            }
            _ => {
                2u8.hash(state);
                self.number().hash(state);
            }
        }
    }
}

/// Canonical form of a numeric value for key lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Number {
    Int(i64),
    /// Non-integral or out of `i64` range.
    Bits(u64),
}

impl Value {
    fn number(&self) -> Option<Number> {
        match self {
            Value::Integer(i) => Some(Number::Int(*i)),
            Value::Boolean(b) => Some(Number::Int(i64::from(*b))),
            Value::Float(f) => Some(float_number(*f)),
            Value::Null | Value::Text(_) => None,
        }
    }
}

fn float_number(f: f64) -> Number {
    // 2^63 is exact as f64; anything at or past it does not fit i64.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.fract() == 0.0 && f >= -LIMIT && f < LIMIT {
        Number::Int(f as i64)
    } else {
        Number::Bits(float_bits(f))
    }
}

/// Bit pattern with all NaNs folded together.
fn float_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            // JSON has no representation for inf/nan
            Value::Float(f) => serializer.serialize_str(&normalize_float(*f)),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
