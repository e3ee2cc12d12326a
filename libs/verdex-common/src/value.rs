use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Structured interpretation of raw fixture text.
///
/// Produced fresh per fixture and never mutated afterwards. Serializes
/// untagged, so the JSON form is the natural one (`null`, numbers, strings,
/// arrays, objects) and strict JSON text deserializes directly into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecodedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<DecodedValue>),
    Map(BTreeMap<String, DecodedValue>),
}

impl DecodedValue {
    /// Strict JSON parse. The first decoding layer; callers fall through to
    /// more lenient grammars on error.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DecodedValue::Int(i) => Some(*i as f64),
            DecodedValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DecodedValue::Int(_) | DecodedValue::Float(_))
    }

    /// Whole-number check. Int is always integral; Float only when it has no
    /// fractional part and is finite.
    pub fn is_integral(&self) -> bool {
        match self {
            DecodedValue::Int(_) => true,
            DecodedValue::Float(f) => f.is_finite() && f.fract() == 0.0,
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DecodedValue::Null)
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Null => write!(f, "null"),
            DecodedValue::Bool(b) => write!(f, "{}", b),
            DecodedValue::Int(i) => write!(f, "{}", i),
            DecodedValue::Float(x) => {
                if x.is_infinite() {
                    write!(f, "{}Infinity", if *x < 0.0 { "-" } else { "" })
                } else if x.is_nan() {
                    write!(f, "NaN")
                } else {
                    write!(f, "{}", x)
                }
            }
            DecodedValue::Str(s) => write!(f, "{:?}", s),
            DecodedValue::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            DecodedValue::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
