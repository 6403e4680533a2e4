use super::property::PropertyMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Unknown,
    Single,
    Double,
    Triple,
    Aromatic,
    Amide,
    /// Dative bond where the electrons come from the second atom.
    DativeLeft,
    /// Dative bond where the electrons come from the first atom.
    DativeRight,
    Up,
    Down,
    WedgeUp,
    WedgeDown,
    WedgeEither,
    /// Stereo double bond with even planar parity.
    EvenRectangle,
    /// Stereo double bond with odd planar parity.
    OddRectangle,
}

impl BondOrder {
    const NAMES: [(BondOrder, &'static str); 15] = [
        (BondOrder::Unknown, "unknown"),
        (BondOrder::Single, "single"),
        (BondOrder::Double, "double"),
        (BondOrder::Triple, "triple"),
        (BondOrder::Aromatic, "aromatic"),
        (BondOrder::Amide, "amide"),
        (BondOrder::DativeLeft, "dative-left"),
        (BondOrder::DativeRight, "dative-right"),
        (BondOrder::Up, "up"),
        (BondOrder::Down, "down"),
        (BondOrder::WedgeUp, "wedge-up"),
        (BondOrder::WedgeDown, "wedge-down"),
        (BondOrder::WedgeEither, "wedge-either"),
        (BondOrder::EvenRectangle, "even-rectangle"),
        (BondOrder::OddRectangle, "odd-rectangle"),
    ];

    pub fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(order, _)| *order == self)
            .map_or("unknown", |(_, name)| name)
    }
}

#[derive(Debug, Error)]
#[error("invalid bond order string '{0}'")]
pub struct ParseBondOrderError(String);

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase().replace('_', "-");
        match lowered.as_str() {
            "1" | "s" => return Ok(Self::Single),
            "2" | "d" => return Ok(Self::Double),
            "3" | "t" => return Ok(Self::Triple),
            "ar" => return Ok(Self::Aromatic),
            _ => {}
        }
        Self::NAMES
            .iter()
            .find(|(_, name)| *name == lowered)
            .map(|(order, _)| *order)
            .ok_or_else(|| ParseBondOrderError(s.to_string()))
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Violations of the molecular graph invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("atom index {index} is out of range for a frame with {size} atoms")]
    AtomOutOfRange { index: usize, size: usize },
    #[error("a bond between atoms {0} and {1} already exists")]
    DuplicateBond(usize, usize),
    #[error("there is no bond between atoms {0} and {1}")]
    BondNotFound(usize, usize),
    #[error("can not bond atom {0} to itself")]
    SelfBond(usize),
}

/// An unordered pair of atom indices, stored with `i < j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bond {
    i: usize,
    j: usize,
}

impl Bond {
    pub fn new(i: usize, j: usize) -> Self {
        Self {
            i: i.min(j),
            j: i.max(j),
        }
    }

    pub fn first(&self) -> usize {
        self.i
    }

    pub fn second(&self) -> usize {
        self.j
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.i == atom || self.j == atom
    }
}

/// A named group of atoms (a residue, a molecule, a ligand).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Residue {
    pub name: String,
    pub id: Option<i64>,
    atoms: Vec<usize>,
    pub properties: PropertyMap,
}

impl Residue {
    pub fn new(name: &str, id: Option<i64>) -> Self {
        Self {
            name: name.to_string(),
            id,
            atoms: Vec::new(),
            properties: PropertyMap::new(),
        }
    }

    /// Adds an atom index to the residue. Adding twice is a no-op.
    pub fn add_atom(&mut self, index: usize) {
        if let Err(position) = self.atoms.binary_search(&index) {
            self.atoms.insert(position, index);
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.atoms.binary_search(&index).is_ok()
    }

    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }
}

/// The bond graph and grouping metadata of a molecular structure.
///
/// A topology knows nothing about atom count; [`Frame`](super::frame::Frame)
/// validates indices before forwarding bond edits here. Bonds are kept sorted
/// so lookups are logarithmic and output order is stable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Topology {
    bonds: Vec<Bond>,
    orders: Vec<BondOrder>,
    residues: Vec<Residue>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn bond_orders(&self) -> &[BondOrder] {
        &self.orders
    }

    /// Iterates over `(bond, order)` pairs in sorted bond order.
    pub fn bonds_with_orders(&self) -> impl Iterator<Item = (Bond, BondOrder)> + '_ {
        self.bonds.iter().copied().zip(self.orders.iter().copied())
    }

    pub fn bond_order(&self, i: usize, j: usize) -> Option<BondOrder> {
        self.bonds
            .binary_search(&Bond::new(i, j))
            .ok()
            .map(|index| self.orders[index])
    }

    /// Adds a bond between `i` and `j`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateBond`] if the pair is already bonded and
    /// [`ModelError::SelfBond`] if `i == j`.
    pub fn add_bond(&mut self, i: usize, j: usize, order: BondOrder) -> Result<(), ModelError> {
        if i == j {
            return Err(ModelError::SelfBond(i));
        }
        let bond = Bond::new(i, j);
        match self.bonds.binary_search(&bond) {
            Ok(_) => Err(ModelError::DuplicateBond(bond.i, bond.j)),
            Err(position) => {
                self.bonds.insert(position, bond);
                self.orders.insert(position, order);
                Ok(())
            }
        }
    }

    /// Removes the bond between `i` and `j`, returning its order.
    pub fn remove_bond(&mut self, i: usize, j: usize) -> Result<BondOrder, ModelError> {
        let bond = Bond::new(i, j);
        let position = self
            .bonds
            .binary_search(&bond)
            .map_err(|_| ModelError::BondNotFound(bond.i, bond.j))?;
        self.bonds.remove(position);
        Ok(self.orders.remove(position))
    }

    /// Drops every bond and residue membership that references an atom at or
    /// beyond `size`.
    pub(crate) fn truncate_atoms(&mut self, size: usize) {
        let mut kept_bonds = Vec::with_capacity(self.bonds.len());
        let mut kept_orders = Vec::with_capacity(self.orders.len());
        for (bond, order) in self.bonds_with_orders() {
            if bond.j < size {
                kept_bonds.push(bond);
                kept_orders.push(order);
            }
        }
        self.bonds = kept_bonds;
        self.orders = kept_orders;
        for residue in &mut self.residues {
            residue.atoms.retain(|&index| index < size);
        }
    }

    /// Builds adjacency lists for `size` atoms. Neighbours are listed in
    /// ascending bond order.
    pub fn neighbors(&self, size: usize) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); size];
        for bond in &self.bonds {
            if bond.j < size {
                adjacency[bond.i].push(bond.j);
                adjacency[bond.j].push(bond.i);
            }
        }
        adjacency
    }

    pub fn add_residue(&mut self, residue: Residue) {
        self.residues.push(residue);
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    /// Finds the residue containing the atom at `index`.
    pub fn residue_for_atom(&self, index: usize) -> Option<&Residue> {
        self.residues.iter().find(|residue| residue.contains(index))
    }
}
