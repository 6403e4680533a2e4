use super::element::{self, Element};
use super::property::PropertyMap;

/// Represents a single atom of a [`Frame`](super::frame::Frame).
///
/// Atoms carry no identity of their own: an atom is identified by its index
/// in the owning frame's atom sequence. The element is optional, since some
/// formats only store coordinates; it is derived from `atomic_type` through
/// the element table whenever that type is a known element symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The atom name (e.g. "CA", "OW", "C1").
    pub name: String,
    /// The atomic type, usually the element symbol.
    pub atomic_type: String,
    /// The mass in Dalton. Defaults to the natural isotopic mass.
    pub mass: f64,
    /// The charge in elementary charge units.
    pub charge: f64,
    /// Format-specific metadata (chirality, isotope counts, ...).
    pub properties: PropertyMap,
}

impl Default for Atom {
    fn default() -> Self {
        Self::new("")
    }
}

impl Atom {
    /// Creates an atom whose name and atomic type are both `name`.
    ///
    /// The mass is set to the natural mass of the matching element, or 0 when
    /// `name` is not an element symbol.
    ///
    /// # Arguments
    ///
    /// * `name` - The atom name, also used as atomic type.
    pub fn new(name: &str) -> Self {
        Self::with_type(name, name)
    }

    /// Creates an atom with distinct name and atomic type.
    ///
    /// # Arguments
    ///
    /// * `name` - The atom name.
    /// * `atomic_type` - The atomic type, used for element lookups.
    pub fn with_type(name: &str, atomic_type: &str) -> Self {
        let mass = element::by_symbol(atomic_type).map_or(0.0, |e| e.mass);
        Self {
            name: name.to_string(),
            atomic_type: atomic_type.to_string(),
            mass,
            charge: 0.0,
            properties: PropertyMap::new(),
        }
    }

    /// Creates an atom from an atomic number, using the element symbol as
    /// name and type. Returns `None` for numbers missing from the table.
    pub fn from_atomic_number(number: u8) -> Option<Self> {
        element::by_number(number).map(|e| Self::new(e.symbol))
    }

    /// Returns the element matching this atom's type, if any.
    pub fn element(&self) -> Option<&'static Element> {
        element::by_symbol(&self.atomic_type)
    }

    pub fn atomic_number(&self) -> Option<u8> {
        self.element().map(|e| e.number)
    }

    /// Returns the full element name ("Carbon" for "C").
    pub fn full_name(&self) -> Option<&'static str> {
        self.element().map(|e| e.name)
    }
}
