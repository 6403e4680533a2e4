//! The boundary with an external InChI canonicalization engine.
//!
//! The engine is abstracted as an [`IdentifierToolkit`]: one call turns an
//! identifier into a plain molecule description, another does the reverse.
//! Each call reports its problems through a [`Status`] channel which the
//! [`ToolkitSession`] drains after every call.

use crate::core::io::diagnostics::Diagnostics;
use crate::core::io::error::{Error, Result};
use nalgebra::Point3;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub severity: Severity,
    pub message: String,
}

/// The status channel filled by a toolkit during one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    messages: Vec<StatusMessage>,
}

impl Status {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        self.messages.push(StatusMessage {
            severity,
            message: message.into(),
        });
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    pub fn messages(&self) -> &[StatusMessage] {
        &self.messages
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radical {
    Singlet,
    Doublet,
    Triplet,
}

impl Radical {
    pub fn name(self) -> &'static str {
        match self {
            Radical::Singlet => "singlet",
            Radical::Doublet => "doublet",
            Radical::Triplet => "triplet",
        }
    }
}

impl fmt::Display for Radical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolkitAtom {
    /// `None` when the element is unknown.
    pub atomic_number: Option<u8>,
    pub position: Point3<f64>,
    /// Isotopic mass number; `None` for the natural isotope mix.
    pub mass: Option<i32>,
    pub charge: i32,
    pub radical: Option<Radical>,
    /// Implicit hydrogen count; `None` lets the toolkit derive it.
    pub implicit_hydrogens: Option<u32>,
    /// Explicit isotopic hydrogen counts for mass 1, 2 and 3.
    pub isotopic_hydrogens: [u32; 3],
}

impl ToolkitAtom {
    pub fn new(atomic_number: Option<u8>, position: Point3<f64>) -> Self {
        Self {
            atomic_number,
            position,
            mass: None,
            charge: 0,
            radical: None,
            implicit_hydrogens: None,
            isotopic_hydrogens: [0; 3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolkitBondType {
    Single,
    Double,
    Triple,
    Aromatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolkitBond {
    pub first: usize,
    pub second: usize,
    /// `None` leaves the type for the toolkit to decide.
    pub kind: Option<ToolkitBondType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StereoTopology {
    Tetrahedron,
    /// Cis/trans geometry around a double bond.
    Rectangle,
    /// Allene-like axial stereo, reported on the central atom.
    Antirectangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StereoParity {
    None,
    Odd,
    Even,
    Unknown,
}

impl StereoParity {
    pub fn name(self) -> &'static str {
        match self {
            StereoParity::None => "none",
            StereoParity::Odd => "odd",
            StereoParity::Even => "even",
            StereoParity::Unknown => "unknown",
        }
    }

    /// Parses a parity suffix; anything unrecognized is `Unknown`.
    pub fn from_suffix(text: &str) -> Self {
        match text {
            "none" => StereoParity::None,
            "odd" => StereoParity::Odd,
            "even" => StereoParity::Even,
            _ => StereoParity::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StereoCenter {
    Atom(usize),
    Bond(usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StereoVertex {
    Atom(usize),
    ImplicitHydrogen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolkitStereo {
    pub topology: StereoTopology,
    pub center: StereoCenter,
    /// Neighbours in toolkit order. Empty for stereo read from an identifier.
    pub vertices: Vec<StereoVertex>,
    pub parity: StereoParity,
}

/// A molecule as the toolkit sees it. Atoms are referenced by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolkitMolecule {
    pub atoms: Vec<ToolkitAtom>,
    pub bonds: Vec<ToolkitBond>,
    pub stereos: Vec<ToolkitStereo>,
}

/// The output of a write call: the identifier and its auxiliary information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub inchi: String,
    pub aux_info: String,
}

/// An external identifier canonicalization engine.
///
/// Implementations report problems through `status`. A call returning `None`
/// must leave at least one error in `status`.
pub trait IdentifierToolkit: Send + Sync {
    fn read_identifier(&self, text: &str, status: &mut Status) -> Option<ToolkitMolecule>;

    fn write_identifier(&self, molecule: &ToolkitMolecule, status: &mut Status)
    -> Option<Identifier>;
}

/// Scoped use of a toolkit.
///
/// The status channel is drained after every call: warnings go to the
/// diagnostics sink, errors abort the call. The channel is cleared again on
/// drop so nothing carries over to the next session.
pub struct ToolkitSession<'a> {
    toolkit: &'a dyn IdentifierToolkit,
    diagnostics: &'a Diagnostics,
    status: Status,
}

impl<'a> ToolkitSession<'a> {
    pub fn new(toolkit: &'a dyn IdentifierToolkit, diagnostics: &'a Diagnostics) -> Self {
        Self {
            toolkit,
            diagnostics,
            status: Status::new(),
        }
    }

    pub fn read(&mut self, text: &str) -> Result<ToolkitMolecule> {
        let molecule = self.toolkit.read_identifier(text, &mut self.status);
        self.drain()?;
        molecule.ok_or_else(|| Error::Toolkit(format!("could not read identifier '{text}'")))
    }

    pub fn write(&mut self, molecule: &ToolkitMolecule) -> Result<Identifier> {
        let identifier = self.toolkit.write_identifier(molecule, &mut self.status);
        self.drain()?;
        identifier.ok_or_else(|| Error::Toolkit("could not build identifier".into()))
    }

    fn drain(&mut self) -> Result<()> {
        let mut errors = Vec::new();
        for message in self.status.messages() {
            match message.severity {
                Severity::Warning => self.diagnostics.warn("InChI toolkit", &message.message),
                Severity::Error => errors.push(message.message.as_str()),
            }
        }
        let result = if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Toolkit(errors.join("\n")))
        };
        self.status.clear();
        result
    }
}

impl Drop for ToolkitSession<'_> {
    fn drop(&mut self) {
        self.status.clear();
    }
}
