//! InChI identifiers, translated through an external [`IdentifierToolkit`].
//!
//! Each frame is one line holding the identifier. Writing emits the
//! identifier followed by its AuxInfo line. Stereochemistry is carried as
//! the atom property `chirality` (`tetrahedron_<parity>` or
//! `antirectangle_<parity>`) and as rectangle bond orders for double bonds.

pub mod toolkit;

use self::toolkit::{
    Identifier, IdentifierToolkit, StereoCenter, StereoParity, StereoTopology, StereoVertex,
    ToolkitAtom, ToolkitBond, ToolkitBondType, ToolkitMolecule, ToolkitSession, ToolkitStereo,
};
use super::diagnostics::Diagnostics;
use super::error::{Error, Result};
use super::files::text::TextFile;
use super::format::FormatMetadata;
use super::text::{TextCodec, read_frame_line};
use crate::core::models::atom::Atom;
use crate::core::models::frame::Frame;
use crate::core::models::topology::BondOrder;
use crate::core::utils::geometry::{GEOMETRY_EPSILON, is_degenerate};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

pub static INCHI_METADATA: FormatMetadata = FormatMetadata {
    name: "InChI",
    extension: Some(".inchi"),
    description: "IUPAC International Chemical Identifier",
    reference: "https://www.inchi-trust.org/",
    read: true,
    write: true,
    random_access: false,
    positions: false,
    velocities: false,
    unit_cell: false,
    atoms: true,
    bonds: true,
    compression: true,
};

const MARKER: &str = "InChI=";
const CONTEXT: &str = "InChI";

pub struct InchiCodec {
    toolkit: Arc<dyn IdentifierToolkit>,
    diagnostics: Diagnostics,
}

impl fmt::Debug for InchiCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InchiCodec")
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

impl InchiCodec {
    pub fn new(toolkit: Arc<dyn IdentifierToolkit>, diagnostics: Diagnostics) -> Self {
        Self {
            toolkit,
            diagnostics,
        }
    }

    fn session(&self) -> ToolkitSession<'_> {
        ToolkitSession::new(self.toolkit.as_ref(), &self.diagnostics)
    }
}

/// Extracts the identifier token from a line containing the marker.
fn identifier_token(line: &str) -> Option<&str> {
    let start = line.find(MARKER)?;
    line[start..].split_whitespace().next()
}

fn bond_order(kind: ToolkitBondType, diagnostics: &Diagnostics) -> BondOrder {
    match kind {
        ToolkitBondType::Single => BondOrder::Single,
        ToolkitBondType::Double => BondOrder::Double,
        ToolkitBondType::Triple => BondOrder::Triple,
        ToolkitBondType::Aromatic => {
            diagnostics.warn(CONTEXT, "unexpected aromatic bond, assuming single bond");
            BondOrder::Single
        }
    }
}

fn bond_type(order: BondOrder) -> Option<ToolkitBondType> {
    match order {
        BondOrder::Single
        | BondOrder::Amide
        | BondOrder::DativeLeft
        | BondOrder::DativeRight
        | BondOrder::Up
        | BondOrder::Down
        | BondOrder::WedgeUp
        | BondOrder::WedgeDown
        | BondOrder::WedgeEither => Some(ToolkitBondType::Single),
        BondOrder::Double | BondOrder::EvenRectangle | BondOrder::OddRectangle => {
            Some(ToolkitBondType::Double)
        }
        BondOrder::Triple => Some(ToolkitBondType::Triple),
        BondOrder::Aromatic => Some(ToolkitBondType::Aromatic),
        BondOrder::Unknown => None,
    }
}

/// Returns `value` as an integer if it has no fractional part.
fn integral(value: f64) -> Option<i32> {
    if value.fract() == 0.0 && value.abs() <= f64::from(i32::MAX) {
        Some(value as i32)
    } else {
        None
    }
}

fn to_atom(source: &ToolkitAtom) -> Atom {
    let mut atom = source
        .atomic_number
        .and_then(Atom::from_atomic_number)
        .unwrap_or_default();
    if let Some(mass) = source.mass {
        atom.mass = f64::from(mass);
    }
    if source.charge != 0 {
        atom.charge = f64::from(source.charge);
    }
    if let Some(radical) = source.radical {
        atom.properties.set("radical", radical.name());
    }
    let names = ["hydrogen_count", "deuterium_count", "tritium_count"];
    for (name, &count) in names.iter().zip(&source.isotopic_hydrogens) {
        if count != 0 {
            atom.properties.set(name, i64::from(count));
        }
    }
    atom
}

fn to_toolkit_atom(atom: &Atom, position: nalgebra::Point3<f64>) -> ToolkitAtom {
    let mut result = ToolkitAtom::new(atom.atomic_number(), position);
    result.mass = integral(atom.mass).filter(|&mass| mass != 0);
    result.charge = integral(atom.charge).unwrap_or(0);
    result
}

fn apply_stereo(frame: &mut Frame, stereo: &ToolkitStereo) -> Result<()> {
    match (stereo.topology, stereo.center) {
        (StereoTopology::Tetrahedron | StereoTopology::Antirectangle, StereoCenter::Atom(index)) => {
            let prefix = if stereo.topology == StereoTopology::Tetrahedron {
                "tetrahedron"
            } else {
                "antirectangle"
            };
            let atom = frame.atom_mut(index).ok_or_else(|| {
                Error::Toolkit(format!("stereo center {index} is not an atom of the molecule"))
            })?;
            atom.properties
                .set("chirality", format!("{prefix}_{}", stereo.parity.name()));
        }
        (StereoTopology::Rectangle, StereoCenter::Bond(i, j)) => {
            let order = match stereo.parity {
                StereoParity::Even => BondOrder::EvenRectangle,
                StereoParity::Odd => BondOrder::OddRectangle,
                StereoParity::Unknown => BondOrder::Double,
                StereoParity::None => return Ok(()),
            };
            frame.remove_bond(i, j)?;
            frame.add_bond(i, j, order)?;
        }
        (topology, center) => {
            return Err(Error::Toolkit(format!(
                "{topology:?} stereo can not be centered on {center:?}"
            )));
        }
    }
    Ok(())
}

/// Builds explicit tetrahedral stereo from `chirality` properties, for
/// frames whose coordinates can not encode it. Rectangle bond orders have no
/// explicit encoding and are rejected.
fn explicit_stereo(frame: &Frame, diagnostics: &Diagnostics) -> Result<Vec<ToolkitStereo>> {
    let planar = frame
        .topology()
        .bonds_with_orders()
        .find(|(_, order)| matches!(order, BondOrder::EvenRectangle | BondOrder::OddRectangle));
    if let Some((bond, order)) = planar {
        return Err(Error::unsupported(format!(
            "can not write {} stereo for bond {}-{} without 3-D coordinates",
            order.name(),
            bond.first(),
            bond.second()
        )));
    }

    let neighbors = frame.topology().neighbors(frame.size());
    let mut stereos = Vec::new();
    for (index, atom) in frame.atoms().iter().enumerate() {
        let Some(chirality) = atom.properties.get_string("chirality") else {
            continue;
        };
        if chirality.starts_with("antirectangle") {
            return Err(Error::unsupported(format!(
                "can not write antirectangle stereo for atom {index} without 3-D coordinates"
            )));
        }
        let Some(parity) = chirality.strip_prefix("tetrahedron") else {
            continue;
        };
        let bonded = &neighbors[index];
        if bonded.len() <= 2 {
            diagnostics.warn(
                CONTEXT,
                "tetrahedral chirality property set for atom with fewer than 3 bonds",
            );
            continue;
        }

        let mut vertices: Vec<StereoVertex> =
            bonded.iter().take(4).map(|&i| StereoVertex::Atom(i)).collect();
        let hydrogen_last = match bonded.get(3) {
            Some(&fourth) => frame.atoms()[fourth].atomic_number() == Some(1),
            None => {
                vertices.push(StereoVertex::ImplicitHydrogen);
                true
            }
        };
        if hydrogen_last {
            vertices.swap(0, 3);
        }

        stereos.push(ToolkitStereo {
            topology: StereoTopology::Tetrahedron,
            center: StereoCenter::Atom(index),
            vertices,
            parity: StereoParity::from_suffix(parity.trim_start_matches('_')),
        });
    }
    Ok(stereos)
}

impl TextCodec for InchiCodec {
    fn metadata(&self) -> &'static FormatMetadata {
        &INCHI_METADATA
    }

    fn read_next(&mut self, file: &mut TextFile, frame: &mut Frame) -> Result<()> {
        let line = read_frame_line(file, CONTEXT)?;
        let text = identifier_token(&line)
            .ok_or_else(|| Error::format(format!("expected an InChI identifier, got '{line}'")))?;
        let molecule = self.session().read(text)?;

        frame.clear();
        for source in &molecule.atoms {
            frame.add_atom(to_atom(source), source.position, None);
        }
        for bond in &molecule.bonds {
            let order = bond
                .kind
                .map_or(BondOrder::Single, |kind| bond_order(kind, &self.diagnostics));
            frame.add_bond(bond.first, bond.second, order)?;
        }
        for stereo in &molecule.stereos {
            apply_stereo(frame, stereo)?;
        }
        trace!(
            atoms = frame.size(),
            bonds = frame.topology().bonds().len(),
            "read InChI frame"
        );
        Ok(())
    }

    fn write_next(&mut self, file: &mut TextFile, frame: &Frame) -> Result<()> {
        let mut molecule = ToolkitMolecule {
            atoms: frame
                .atoms()
                .iter()
                .zip(frame.positions())
                .map(|(atom, &position)| to_toolkit_atom(atom, position))
                .collect(),
            bonds: frame
                .topology()
                .bonds_with_orders()
                .map(|(bond, order)| ToolkitBond {
                    first: bond.first(),
                    second: bond.second(),
                    kind: bond_type(order),
                })
                .collect(),
            stereos: Vec::new(),
        };
        if is_degenerate(frame.positions(), GEOMETRY_EPSILON) {
            molecule.stereos = explicit_stereo(frame, &self.diagnostics)?;
        }

        let Identifier { inchi, aux_info } = self.session().write(&molecule)?;
        writeln!(file, "{inchi}")?;
        writeln!(file, "{aux_info}")?;
        Ok(())
    }

    fn forward(&mut self, file: &mut TextFile) -> Result<Option<u64>> {
        while !file.eof()? {
            let start = file.tellpos();
            if file.readline()?.contains(MARKER) {
                return Ok(Some(start));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::toolkit::{Radical, Status};
    use super::*;
    use crate::core::io::diagnostics::Warning;
    use crate::core::io::files::{Compression, Mode};
    use crate::core::io::format::Format;
    use crate::core::io::text::TextFormat;
    use nalgebra::Point3;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Answers every identifier with a fixed molecule and records what it was
    /// asked to write.
    #[derive(Default)]
    struct FakeToolkit {
        molecule: ToolkitMolecule,
        written: Mutex<Vec<ToolkitMolecule>>,
    }

    impl IdentifierToolkit for FakeToolkit {
        fn read_identifier(&self, text: &str, status: &mut Status) -> Option<ToolkitMolecule> {
            if text.contains("broken") {
                status.error("invalid layer");
                return None;
            }
            Some(self.molecule.clone())
        }

        fn write_identifier(
            &self,
            molecule: &ToolkitMolecule,
            _: &mut Status,
        ) -> Option<Identifier> {
            self.written.lock().unwrap().push(molecule.clone());
            Some(Identifier {
                inchi: format!("InChI=1S/fake/a{}", molecule.atoms.len()),
                aux_info: "AuxInfo=1/0/N:1".into(),
            })
        }
    }

    fn collecting() -> (Diagnostics, Arc<Mutex<Vec<Warning>>>) {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let diagnostics =
            Diagnostics::with_callback(Arc::new(move |w: &Warning| sink.lock().unwrap().push(w.clone())));
        (diagnostics, seen)
    }

    fn ethene() -> ToolkitMolecule {
        let mut carbon = ToolkitAtom::new(Some(6), Point3::origin());
        carbon.mass = Some(13);
        carbon.radical = Some(Radical::Doublet);
        carbon.isotopic_hydrogens = [0, 2, 0];
        let mut other = ToolkitAtom::new(Some(6), Point3::new(1.3, 0.0, 0.0));
        other.charge = -1;
        ToolkitMolecule {
            atoms: vec![carbon, other, ToolkitAtom::new(Some(17), Point3::new(2.0, 1.0, 0.0))],
            bonds: vec![
                ToolkitBond {
                    first: 0,
                    second: 1,
                    kind: Some(ToolkitBondType::Double),
                },
                ToolkitBond {
                    first: 1,
                    second: 2,
                    kind: Some(ToolkitBondType::Aromatic),
                },
            ],
            stereos: vec![
                ToolkitStereo {
                    topology: StereoTopology::Rectangle,
                    center: StereoCenter::Bond(0, 1),
                    vertices: Vec::new(),
                    parity: StereoParity::Odd,
                },
                ToolkitStereo {
                    topology: StereoTopology::Antirectangle,
                    center: StereoCenter::Atom(2),
                    vertices: Vec::new(),
                    parity: StereoParity::Even,
                },
            ],
        }
    }

    fn open(
        path: &std::path::Path,
        mode: Mode,
        toolkit: Arc<FakeToolkit>,
        diagnostics: Diagnostics,
    ) -> TextFormat<InchiCodec> {
        TextFormat::open(path, mode, Compression::Default, InchiCodec::new(toolkit, diagnostics))
            .unwrap()
    }

    #[test]
    fn read_maps_atoms_bonds_and_stereo() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mol.inchi");
        std::fs::write(&path, "InChI=1S/C2Cl\nAuxInfo=1/0\n").unwrap();
        let toolkit = Arc::new(FakeToolkit {
            molecule: ethene(),
            ..Default::default()
        });
        let (diagnostics, seen) = collecting();

        let mut format = open(&path, Mode::Read, toolkit, diagnostics);
        assert_eq!(format.nsteps().unwrap(), 1);
        let mut frame = Frame::new();
        format.read(&mut frame).unwrap();

        assert_eq!(frame.size(), 3);
        let carbon = &frame.atoms()[0];
        assert_eq!(carbon.name, "C");
        assert_eq!(carbon.mass, 13.0);
        assert_eq!(carbon.properties.get_string("radical"), Some("doublet"));
        assert_eq!(carbon.properties.get_int("deuterium_count"), Some(2));
        assert!(!carbon.properties.contains("hydrogen_count"));
        assert_eq!(frame.atoms()[1].charge, -1.0);
        assert_eq!(frame.atoms()[1].mass, Atom::new("C").mass);
        assert_eq!(
            frame.atoms()[2].properties.get_string("chirality"),
            Some("antirectangle_even")
        );

        assert_eq!(frame.topology().bond_order(0, 1), Some(BondOrder::OddRectangle));
        assert_eq!(frame.topology().bond_order(1, 2), Some(BondOrder::Single));
        let warnings = seen.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("aromatic"));
    }

    #[test]
    fn toolkit_errors_fail_the_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.inchi");
        std::fs::write(&path, "InChI=1S/broken\n").unwrap();
        let toolkit = Arc::new(FakeToolkit::default());

        let mut format = open(&path, Mode::Read, toolkit, Diagnostics::new());
        let mut frame = Frame::new();
        assert!(matches!(format.read(&mut frame), Err(Error::Toolkit(m)) if m == "invalid layer"));
    }

    #[test]
    fn frames_are_found_by_marker_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("many.inchi");
        std::fs::write(
            &path,
            "InChI=1S/CH4/h1H4\nAuxInfo=1/0/N:1\n\nInChI=1S/H2O/h1H2\nAuxInfo=1/0/N:1\n",
        )
        .unwrap();
        let toolkit = Arc::new(FakeToolkit::default());

        let mut format = open(&path, Mode::Read, toolkit, Diagnostics::new());
        assert_eq!(format.nsteps().unwrap(), 2);
        assert_eq!(format.frame_offsets(), &[0, 35]);
    }

    #[test]
    fn write_emits_identifier_and_aux_info_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.inchi");
        let toolkit = Arc::new(FakeToolkit::default());

        let mut frame = Frame::new();
        let mut carbon = Atom::new("C");
        carbon.mass = 13.0;
        carbon.charge = 0.5;
        frame.add_atom(carbon, Point3::new(0.0, 0.0, 0.0), None);
        frame.add_atom(Atom::new("O"), Point3::new(1.2, 0.0, 0.0), None);
        frame.add_atom(Atom::new("H"), Point3::new(-0.5, 0.9, 0.0), None);
        frame.add_bond(0, 1, BondOrder::EvenRectangle).unwrap();
        frame.add_bond(0, 2, BondOrder::WedgeUp).unwrap();

        {
            let mut format = open(&path, Mode::Write, toolkit.clone(), Diagnostics::new());
            format.write(&frame).unwrap();
            format.finish().unwrap();
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "InChI=1S/fake/a3\nAuxInfo=1/0/N:1\n");

        let written = toolkit.written.lock().unwrap();
        let molecule = &written[0];
        assert_eq!(molecule.atoms[0].mass, Some(13));
        assert_eq!(molecule.atoms[0].charge, 0);
        assert_eq!(molecule.atoms[1].mass, None);
        assert_eq!(molecule.bonds[0].kind, Some(ToolkitBondType::Double));
        assert_eq!(molecule.bonds[1].kind, Some(ToolkitBondType::Single));
        assert!(molecule.stereos.is_empty());
    }

    fn flat_center(fourth: Option<&str>) -> Frame {
        let mut frame = Frame::new();
        let mut center = Atom::new("C");
        center.properties.set("chirality", "tetrahedron_odd");
        frame.add_atom(center, Point3::origin(), None);
        let mut names = vec!["F", "Cl", "Br"];
        names.extend(fourth);
        for (i, name) in names.iter().enumerate() {
            frame.add_atom(Atom::new(name), Point3::new(i as f64 + 1.0, 0.0, 0.0), None);
            frame.add_bond(0, i + 1, BondOrder::Single).unwrap();
        }
        frame
    }

    fn written_stereo(frame: &Frame) -> Vec<ToolkitStereo> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.inchi");
        let toolkit = Arc::new(FakeToolkit::default());
        let mut format = open(&path, Mode::Write, toolkit.clone(), Diagnostics::new());
        format.write(frame).unwrap();
        let written = toolkit.written.lock().unwrap();
        written[0].stereos.clone()
    }

    #[test]
    fn collinear_frames_get_explicit_stereo_with_implicit_hydrogen_first() {
        let stereos = written_stereo(&flat_center(None));
        assert_eq!(stereos.len(), 1);
        assert_eq!(stereos[0].center, StereoCenter::Atom(0));
        assert_eq!(stereos[0].parity, StereoParity::Odd);
        assert_eq!(
            stereos[0].vertices,
            vec![
                StereoVertex::ImplicitHydrogen,
                StereoVertex::Atom(2),
                StereoVertex::Atom(3),
                StereoVertex::Atom(1),
            ]
        );
    }

    #[test]
    fn explicit_fourth_hydrogen_is_moved_first() {
        let stereos = written_stereo(&flat_center(Some("H")));
        assert_eq!(stereos[0].vertices[0], StereoVertex::Atom(4));
        assert_eq!(stereos[0].vertices[3], StereoVertex::Atom(1));

        let stereos = written_stereo(&flat_center(Some("I")));
        assert_eq!(stereos[0].vertices[0], StereoVertex::Atom(1));
    }

    #[test]
    fn three_dimensional_frames_rely_on_coordinates() {
        let mut frame = flat_center(None);
        frame.positions_mut()[2] = Point3::new(0.0, 1.0, 0.0);
        assert!(written_stereo(&frame).is_empty());
    }

    #[test]
    fn chiral_atoms_with_two_bonds_only_warn() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chain.inchi");
        let toolkit = Arc::new(FakeToolkit::default());
        let (diagnostics, seen) = collecting();

        let mut frame = Frame::new();
        for (i, name) in ["C", "F", "Cl", "C", "F", "Cl", "Br"].iter().enumerate() {
            let mut atom = Atom::new(name);
            if i == 0 || i == 3 {
                atom.properties.set("chirality", "tetrahedron_even");
            }
            frame.add_atom(atom, Point3::new(i as f64, 0.0, 0.0), None);
        }
        for (i, j) in [(0, 1), (0, 2), (3, 4), (3, 5), (3, 6)] {
            frame.add_bond(i, j, BondOrder::Single).unwrap();
        }

        {
            let mut format = open(&path, Mode::Write, toolkit.clone(), diagnostics);
            format.write(&frame).unwrap();
            format.finish().unwrap();
        }

        let written = toolkit.written.lock().unwrap();
        let stereos = &written[0].stereos;
        assert_eq!(stereos.len(), 1);
        assert_eq!(stereos[0].center, StereoCenter::Atom(3));
        assert_eq!(stereos[0].parity, StereoParity::Even);

        let warnings = seen.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("fewer than 3 bonds"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "InChI=1S/fake/a7\nAuxInfo=1/0/N:1\n");
    }

    #[test]
    fn collinear_frames_reject_rectangle_bonds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planar.inchi");
        let toolkit = Arc::new(FakeToolkit::default());

        let mut frame = Frame::new();
        frame.add_atom(Atom::new("C"), Point3::origin(), None);
        frame.add_atom(Atom::new("C"), Point3::new(1.3, 0.0, 0.0), None);
        frame.add_bond(0, 1, BondOrder::EvenRectangle).unwrap();

        let mut format = open(&path, Mode::Write, toolkit.clone(), Diagnostics::new());
        let error = format.write(&frame).unwrap_err();
        assert!(matches!(error, Error::Unsupported(ref m) if m.contains("even-rectangle")));
        assert!(toolkit.written.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_frames_never_build_stereo() {
        let frame = Frame::new();
        assert!(written_stereo(&frame).is_empty());
    }
}
