use std::collections::BTreeMap;
use std::fmt;

/// A format-specific value attached to an atom, residue or frame.
///
/// Codecs use properties for metadata that has no dedicated field in the
/// graph model, such as chirality tags, isotope counts or simulation time.
/// An absent property always means "unset"; codecs never store sentinels.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl Property {
    /// Returns the name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Property::Bool(_) => "bool",
            Property::Int(_) => "int",
            Property::Double(_) => "double",
            Property::String(_) => "string",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Property::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Property::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value as a double. Integer properties are widened.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Property::Double(value) => Some(*value),
            Property::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Property::String(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Bool(value) => write!(f, "{}", value),
            Property::Int(value) => write!(f, "{}", value),
            Property::Double(value) => write!(f, "{}", value),
            Property::String(value) => write!(f, "{}", value),
        }
    }
}

impl From<bool> for Property {
    fn from(value: bool) -> Self {
        Property::Bool(value)
    }
}

impl From<i64> for Property {
    fn from(value: i64) -> Self {
        Property::Int(value)
    }
}

impl From<i32> for Property {
    fn from(value: i32) -> Self {
        Property::Int(i64::from(value))
    }
}

impl From<u32> for Property {
    fn from(value: u32) -> Self {
        Property::Int(i64::from(value))
    }
}

impl From<f64> for Property {
    fn from(value: f64) -> Self {
        Property::Double(value)
    }
}

impl From<&str> for Property {
    fn from(value: &str) -> Self {
        Property::String(value.to_string())
    }
}

impl From<String> for Property {
    fn from(value: String) -> Self {
        Property::String(value)
    }
}

/// An open-ended, name-keyed bag of [`Property`] values.
///
/// Iteration order is the lexical order of the names, which keeps output
/// deterministic for writers that dump every property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    entries: BTreeMap<String, Property>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<Property>) {
        self.entries.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Property> {
        self.entries.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Property::as_bool)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Property::as_int)
    }

    pub fn get_double(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Property::as_double)
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Property::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}
