//! Three-state operation variables.
//!
//! An optional variable is either left out of the payload entirely
//! ([`OptionalVariable::Undefined`]), sent as an explicit `null`, or sent with
//! a value. Struct fields using it should carry
//! `#[serde(default, skip_serializing_if = "OptionalVariable::is_undefined")]`
//! so that `Undefined` never reaches the wire.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionalVariable<T> {
    Undefined,
    Null,
    Value(T),
}

impl<T> Default for OptionalVariable<T> {
    fn default() -> Self {
        OptionalVariable::Undefined
    }
}

impl<T> OptionalVariable<T> {
    pub fn is_undefined(&self) -> bool {
        matches!(self, OptionalVariable::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, OptionalVariable::Null)
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            OptionalVariable::Value(value) => Some(value),
            OptionalVariable::Undefined | OptionalVariable::Null => None,
        }
    }

    /// Collapses `Undefined` and `Null` into `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            OptionalVariable::Value(value) => Some(value),
            OptionalVariable::Undefined | OptionalVariable::Null => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OptionalVariable<U> {
        match self {
            OptionalVariable::Undefined => OptionalVariable::Undefined,
            OptionalVariable::Null => OptionalVariable::Null,
            OptionalVariable::Value(value) => OptionalVariable::Value(f(value)),
        }
    }
}

impl<T> From<Option<T>> for OptionalVariable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => OptionalVariable::Value(value),
            None => OptionalVariable::Null,
        }
    }
}

impl<T: Serialize> Serialize for OptionalVariable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OptionalVariable::Value(value) => serializer.serialize_some(value),
            OptionalVariable::Undefined | OptionalVariable::Null => serializer.serialize_none(),
        }
    }
}

// A missing field never reaches this impl; `#[serde(default)]` yields `Undefined`.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for OptionalVariable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(OptionalVariable::from)
    }
}
