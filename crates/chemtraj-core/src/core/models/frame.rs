use super::atom::Atom;
use super::cell::UnitCell;
use super::property::PropertyMap;
use super::topology::{BondOrder, ModelError, Topology};
use nalgebra::{Point3, Vector3};
use std::sync::Arc;

/// One snapshot of a molecular system.
///
/// A frame owns its atoms and their positions (and optionally velocities),
/// which always have the same length. The [`Topology`] is held behind an
/// [`Arc`] so successive frames of a trajectory can share one bond graph;
/// editing bonds through a frame clones the topology only if it is shared.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    atoms: Vec<Atom>,
    positions: Vec<Point3<f64>>,
    velocities: Option<Vec<Vector3<f64>>>,
    topology: Arc<Topology>,
    cell: Option<UnitCell>,
    step: u64,
    /// Frame-level metadata (time, title, ...).
    pub properties: PropertyMap,
}

impl Frame {
    /// Creates an empty frame with no atoms and no cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty frame sharing an existing topology.
    pub fn with_topology(topology: Arc<Topology>) -> Self {
        Self {
            topology,
            ..Self::default()
        }
    }

    pub fn size(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Resizes the frame to `size` atoms.
    ///
    /// New atoms are empty and placed at the origin, with zero velocity when
    /// velocities are present. Shrinking drops every bond and residue
    /// membership that references a removed atom.
    pub fn resize(&mut self, size: usize) {
        let old_size = self.atoms.len();
        self.atoms.resize_with(size, Atom::default);
        self.positions.resize(size, Point3::origin());
        if let Some(velocities) = &mut self.velocities {
            velocities.resize(size, Vector3::zeros());
        }
        if size < old_size {
            Arc::make_mut(&mut self.topology).truncate_atoms(size);
        }
    }

    /// Appends an atom at `position`. The velocity is only stored when the
    /// frame has velocities.
    pub fn add_atom(&mut self, atom: Atom, position: Point3<f64>, velocity: Option<Vector3<f64>>) {
        self.atoms.push(atom);
        self.positions.push(position);
        if let Some(velocities) = &mut self.velocities {
            velocities.push(velocity.unwrap_or_else(Vector3::zeros));
        }
    }

    /// Adds zero-initialised velocities if the frame does not have any yet.
    pub fn add_velocities(&mut self) {
        if self.velocities.is_none() {
            self.velocities = Some(vec![Vector3::zeros(); self.atoms.len()]);
        }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn atom_mut(&mut self, index: usize) -> Option<&mut Atom> {
        self.atoms.get_mut(index)
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Point3<f64>] {
        &mut self.positions
    }

    pub fn velocities(&self) -> Option<&[Vector3<f64>]> {
        self.velocities.as_deref()
    }

    pub fn velocities_mut(&mut self) -> Option<&mut [Vector3<f64>]> {
        self.velocities.as_deref_mut()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Returns the shared handle to this frame's topology.
    pub fn shared_topology(&self) -> Arc<Topology> {
        Arc::clone(&self.topology)
    }

    /// Replaces the topology. Bonds must reference atoms of this frame.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AtomOutOfRange`] if a bond or residue references
    /// an atom beyond the frame size.
    pub fn set_topology(&mut self, topology: Arc<Topology>) -> Result<(), ModelError> {
        let size = self.size();
        let out_of_range = topology
            .bonds()
            .iter()
            .map(|bond| bond.second())
            .chain(
                topology
                    .residues()
                    .iter()
                    .flat_map(|residue| residue.atoms().iter().copied()),
            )
            .find(|&index| index >= size);
        if let Some(index) = out_of_range {
            return Err(ModelError::AtomOutOfRange { index, size });
        }
        self.topology = topology;
        Ok(())
    }

    /// Adds a bond between atoms `i` and `j`.
    ///
    /// # Errors
    ///
    /// Fails if either index is out of range, or if the bond already exists.
    /// Changing a bond order requires removing the bond first.
    pub fn add_bond(&mut self, i: usize, j: usize, order: BondOrder) -> Result<(), ModelError> {
        self.check_index(i)?;
        self.check_index(j)?;
        Arc::make_mut(&mut self.topology).add_bond(i, j, order)
    }

    pub fn remove_bond(&mut self, i: usize, j: usize) -> Result<BondOrder, ModelError> {
        Arc::make_mut(&mut self.topology).remove_bond(i, j)
    }

    pub fn cell(&self) -> Option<&UnitCell> {
        self.cell.as_ref()
    }

    pub fn set_cell(&mut self, cell: Option<UnitCell>) {
        self.cell = cell;
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn set_step(&mut self, step: u64) {
        self.step = step;
    }

    /// Returns the distance between atoms `i` and `j`, ignoring periodicity.
    pub fn distance(&self, i: usize, j: usize) -> Result<f64, ModelError> {
        self.check_index(i)?;
        self.check_index(j)?;
        Ok(nalgebra::distance(&self.positions[i], &self.positions[j]))
    }

    /// Removes all atoms, velocities, bonds, properties and the cell, keeping
    /// allocations where possible. Codecs call this before filling a frame.
    pub fn clear(&mut self) {
        self.atoms.clear();
        self.positions.clear();
        self.velocities = None;
        self.topology = Arc::new(Topology::new());
        self.cell = None;
        self.step = 0;
        self.properties = PropertyMap::new();
    }

    fn check_index(&self, index: usize) -> Result<(), ModelError> {
        if index < self.atoms.len() {
            Ok(())
        } else {
            Err(ModelError::AtomOutOfRange {
                index,
                size: self.atoms.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::topology::Residue;

    fn water() -> Frame {
        let mut frame = Frame::new();
        frame.add_atom(Atom::new("O"), Point3::new(0.0, 0.0, 0.0), None);
        frame.add_atom(Atom::new("H"), Point3::new(0.96, 0.0, 0.0), None);
        frame.add_atom(Atom::new("H"), Point3::new(-0.24, 0.93, 0.0), None);
        frame.add_bond(0, 1, BondOrder::Single).unwrap();
        frame.add_bond(0, 2, BondOrder::Single).unwrap();
        frame
    }

    #[test]
    fn add_atom_keeps_positions_in_sync() {
        let frame = water();
        assert_eq!(frame.size(), 3);
        assert_eq!(frame.positions().len(), 3);
        assert!(frame.velocities().is_none());
    }

    #[test]
    fn add_velocities_initialises_zeros_for_existing_atoms() {
        let mut frame = water();
        frame.add_velocities();
        assert_eq!(frame.velocities().unwrap().len(), 3);
        frame.add_atom(
            Atom::new("Na"),
            Point3::origin(),
            Some(Vector3::new(1.0, 2.0, 3.0)),
        );
        assert_eq!(frame.velocities().unwrap()[3], Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn add_bond_rejects_out_of_range_atoms() {
        let mut frame = water();
        assert_eq!(
            frame.add_bond(1, 7, BondOrder::Single),
            Err(ModelError::AtomOutOfRange { index: 7, size: 3 })
        );
    }

    #[test]
    fn add_bond_rejects_existing_bond() {
        let mut frame = water();
        assert_eq!(
            frame.add_bond(1, 0, BondOrder::Double),
            Err(ModelError::DuplicateBond(0, 1))
        );
    }

    #[test]
    fn resize_grows_with_empty_atoms_and_shrinks_bonds() {
        let mut frame = water();
        frame.resize(5);
        assert_eq!(frame.size(), 5);
        assert_eq!(frame.atoms()[4].name, "");
        assert_eq!(frame.positions()[4], Point3::origin());

        frame.resize(2);
        assert_eq!(frame.size(), 2);
        assert_eq!(frame.topology().bonds().len(), 1);
        assert_eq!(frame.topology().bond_order(0, 1), Some(BondOrder::Single));
    }

    #[test]
    fn resize_extends_existing_velocities() {
        let mut frame = water();
        frame.add_velocities();
        frame.resize(67);
        assert_eq!(frame.velocities().unwrap().len(), 67);
    }

    #[test]
    fn editing_bonds_does_not_affect_shared_topology() {
        let frame = water();
        let shared = frame.shared_topology();
        let mut copy = Frame::with_topology(Arc::clone(&shared));
        copy.resize(3);
        copy.remove_bond(0, 1).unwrap();

        assert_eq!(shared.bonds().len(), 2);
        assert_eq!(copy.topology().bonds().len(), 1);
        assert_eq!(frame.topology().bonds().len(), 2);
    }

    #[test]
    fn set_topology_validates_indices() {
        let mut frame = water();
        let mut topology = Topology::new();
        let mut residue = Residue::new("HOH", Some(1));
        residue.add_atom(5);
        topology.add_residue(residue);
        assert_eq!(
            frame.set_topology(Arc::new(topology)),
            Err(ModelError::AtomOutOfRange { index: 5, size: 3 })
        );
    }

    #[test]
    fn distance_uses_cartesian_positions() {
        let frame = water();
        assert!((frame.distance(0, 1).unwrap() - 0.96).abs() < 1e-12);
        assert!(frame.distance(0, 3).is_err());
    }

    #[test]
    fn clear_resets_everything() {
        let mut frame = water();
        frame.set_step(10);
        frame.set_cell(Some(UnitCell::orthorhombic(1.0, 1.0, 1.0)));
        frame.properties.set("time", 2.0);
        frame.clear();
        assert!(frame.is_empty());
        assert!(frame.topology().bonds().is_empty());
        assert!(frame.cell().is_none());
        assert_eq!(frame.step(), 0);
        assert!(frame.properties.is_empty());
    }
}
