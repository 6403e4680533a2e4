use super::error::{Error, Result};
use super::files::text::TextFile;
use super::format::FormatMetadata;
use super::text::{TextCodec, read_frame_line};
use crate::core::models::atom::Atom;
use crate::core::models::frame::Frame;
use crate::core::utils::parse::{parse, scan};
use nalgebra::Point3;

pub static XYZ_METADATA: FormatMetadata = FormatMetadata {
    name: "XYZ",
    extension: Some(".xyz"),
    description: "XYZ text format",
    reference: "https://openbabel.org/wiki/XYZ",
    read: true,
    write: true,
    random_access: false,
    positions: true,
    velocities: false,
    unit_cell: false,
    atoms: true,
    bonds: false,
    compression: true,
};

/// The XYZ layout: an atom count line, a free comment line, then one
/// `name x y z` line per atom. The comment is kept as the `title` frame
/// property.
#[derive(Debug, Clone, Copy, Default)]
pub struct XyzCodec;

fn read_natoms(line: &str) -> Result<usize> {
    parse::<usize>(line).map_err(|error| {
        Error::format(format!(
            "can not read the number of atoms in XYZ frame: {error}"
        ))
    })
}

impl TextCodec for XyzCodec {
    fn metadata(&self) -> &'static FormatMetadata {
        &XYZ_METADATA
    }

    fn read_next(&mut self, file: &mut TextFile, frame: &mut Frame) -> Result<()> {
        let natoms = read_natoms(&read_frame_line(file, "XYZ")?)?;
        let title = read_frame_line(file, "XYZ")?;

        frame.clear();
        frame.properties.set("title", title.trim());
        for _ in 0..natoms {
            let line = read_frame_line(file, "XYZ")?;
            let ((name, x, y, z), _) = scan::<(String, f64, f64, f64)>(&line)?;
            frame.add_atom(Atom::new(&name), Point3::new(x, y, z), None);
        }
        Ok(())
    }

    fn write_next(&mut self, file: &mut TextFile, frame: &Frame) -> Result<()> {
        let title = frame
            .properties
            .get_string("title")
            .unwrap_or_default()
            .replace(['\n', '\r'], " ");
        writeln!(file, "{}", frame.size())?;
        writeln!(file, "{title}")?;
        for (atom, position) in frame.atoms().iter().zip(frame.positions()) {
            let name = if atom.atomic_type.is_empty() {
                "X"
            } else {
                atom.atomic_type.as_str()
            };
            writeln!(file, "{name} {} {} {}", position.x, position.y, position.z)?;
        }
        Ok(())
    }

    fn forward(&mut self, file: &mut TextFile) -> Result<Option<u64>> {
        loop {
            if file.eof()? {
                return Ok(None);
            }
            let start = file.tellpos();
            let line = file.readline()?;
            if line.trim().is_empty() {
                continue;
            }
            let natoms = read_natoms(&line)?;
            for _ in 0..=natoms {
                read_frame_line(file, "XYZ")?;
            }
            return Ok(Some(start));
        }
    }
}
