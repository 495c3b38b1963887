// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scalar property values.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A single scalar in a property's value list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    /// Boolean flag, rendered as `1`/`0`.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String, rendered quoted.
    Str(String),
}

impl PropValue {
    /// Returns the string payload, if this is a [`PropValue::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric payload widened to `f64`, if numeric.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is a [`PropValue::Int`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        _ => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
        }
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for PropValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for PropValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f32> for PropValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&String> for PropValue {
    fn from(v: &String) -> Self {
        Self::Str(v.clone())
    }
}

/// Conversion into the value list stored under one property key.
///
/// Scalars become a one-element list; arrays, slices and vectors keep their
/// order.
pub trait IntoPropValues {
    /// Convert into an owned value list.
    fn into_prop_values(self) -> Vec<PropValue>;
}

macro_rules! scalar_into_values {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoPropValues for $ty {
                fn into_prop_values(self) -> Vec<PropValue> {
                    vec![PropValue::from(self)]
                }
            }
        )*
    };
}

scalar_into_values!(bool, i32, i64, u32, f32, f64, &str, String, &String);

impl IntoPropValues for PropValue {
    fn into_prop_values(self) -> Vec<PropValue> {
        vec![self]
    }
}

impl<T: Into<PropValue>> IntoPropValues for Vec<T> {
    fn into_prop_values(self) -> Vec<PropValue> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<PropValue>, const N: usize> IntoPropValues for [T; N] {
    fn into_prop_values(self) -> Vec<PropValue> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<PropValue> + Clone> IntoPropValues for &[T] {
    fn into_prop_values(self) -> Vec<PropValue> {
        self.iter().cloned().map(Into::into).collect()
    }
}
