//! GROMACS TRR trajectories.
//!
//! A TRR file is a sequence of frames, each a header followed by optional
//! blocks (box, virial, pressure, positions, velocities, forces) whose byte
//! sizes the header declares. Values are XDR big-endian, in single or double
//! precision, and lengths are stored in nanometers.
//!
//! Frames are located lazily: the first request for a step past the known
//! frames reads headers forward from the last known frame, skipping bodies,
//! and remembers every frame offset. Each byte range is scanned at most once.

use super::error::{Error, Result};
use super::files::xdr::XdrFile;
use super::files::{Compression, Mode};
use super::format::{Format, FormatMetadata};
use crate::core::models::cell::{CellShape, UnitCell};
use crate::core::models::frame::Frame;
use nalgebra::{Matrix3, Point3, Vector3};
use std::path::Path;
use tracing::{debug, trace};

const TRR_MAGIC: i32 = 1993;
const TRR_VERSION: &str = "GMX_trn_file";
const NM_TO_ANGSTROM: f64 = 10.0;

pub static TRR_METADATA: FormatMetadata = FormatMetadata {
    name: "TRR",
    extension: Some(".trr"),
    description: "GROMACS TRR binary format",
    reference: "https://manual.gromacs.org/current/reference-manual/file-formats.html#trr",
    read: true,
    write: true,
    random_access: true,
    positions: true,
    velocities: true,
    unit_cell: true,
    atoms: false,
    bonds: false,
    compression: false,
};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct FrameHeader {
    double: bool,
    ir_size: u64,
    e_size: u64,
    box_size: u64,
    vir_size: u64,
    pres_size: u64,
    top_size: u64,
    sym_size: u64,
    x_size: u64,
    v_size: u64,
    f_size: u64,
    natoms: usize,
    step: i32,
    nre: i32,
    time: f64,
    lambda: f64,
}

impl FrameHeader {
    fn body_size(&self) -> u64 {
        self.ir_size
            + self.e_size
            + self.box_size
            + self.vir_size
            + self.pres_size
            + self.top_size
            + self.sym_size
            + self.x_size
            + self.v_size
            + self.f_size
    }

    fn precision(&self) -> usize {
        if self.double { 8 } else { 4 }
    }
}

/// Reader and writer for TRR files.
#[derive(Debug)]
pub struct TrrFormat {
    file: XdrFile,
    mode: Mode,
    /// Byte offset of each known frame.
    offsets: Vec<u64>,
    /// Where indexing resumes: the end of the last indexed frame.
    scan_position: u64,
    index_complete: bool,
    natoms: Option<usize>,
    step: u64,
    headers_scanned: usize,
}

impl TrrFormat {
    /// Opens a TRR file.
    ///
    /// In append mode an existing file is indexed first, so that the atom
    /// count of new frames can be checked against the existing ones.
    ///
    /// # Errors
    ///
    /// Fails with a format error for any compression other than none, and
    /// with an I/O error if the file can not be opened.
    pub fn open(path: &Path, mode: Mode, compression: Compression) -> Result<Self> {
        if compression.resolve(path) != Compression::None {
            return Err(Error::format("TRR format does not support compression"));
        }
        match mode {
            Mode::Read | Mode::Write => Ok(Self::with_file(XdrFile::open(path, mode)?, mode)),
            Mode::Append => {
                let existing = std::fs::metadata(path).is_ok_and(|metadata| metadata.len() > 0);
                let (offsets, natoms) = if existing {
                    let mut reader = Self::with_file(XdrFile::open(path, Mode::Read)?, Mode::Read);
                    reader.index_all()?;
                    (std::mem::take(&mut reader.offsets), reader.natoms)
                } else {
                    (Vec::new(), None)
                };
                let mut format = Self::with_file(XdrFile::open(path, Mode::Append)?, Mode::Append);
                format.step = offsets.len() as u64;
                format.offsets = offsets;
                format.natoms = natoms;
                Ok(format)
            }
        }
    }

    fn with_file(file: XdrFile, mode: Mode) -> Self {
        Self {
            file,
            mode,
            offsets: Vec::new(),
            scan_position: 0,
            index_complete: mode != Mode::Read,
            natoms: None,
            step: 0,
            headers_scanned: 0,
        }
    }

    /// Offsets of the frames located so far.
    pub fn frame_offsets(&self) -> &[u64] {
        &self.offsets
    }

    fn context_error(&self, message: impl std::fmt::Display) -> Error {
        Error::format(format!(
            "invalid TRR file at '{}': {message}",
            self.file.path().display()
        ))
    }

    fn read_size(&mut self) -> Result<u64> {
        let value = self.file.read_i32()?;
        u64::try_from(value).map_err(|_| self.context_error(format!("negative block size {value}")))
    }

    fn read_header(&mut self) -> Result<FrameHeader> {
        self.read_header_fields().map_err(|error| match error {
            Error::Io(io) => Error::format(format!(
                "could not read TRR header from '{}': {io}",
                self.file.path().display()
            )),
            other => other,
        })
    }

    fn read_header_fields(&mut self) -> Result<FrameHeader> {
        let magic = self.file.read_i32()?;
        if magic != TRR_MAGIC {
            return Err(self.context_error(format!(
                "expected TRR_MAGIC '{TRR_MAGIC}', got '{magic}'"
            )));
        }
        let version = self.file.read_gmx_string()?;
        if version != TRR_VERSION {
            return Err(self.context_error(format!(
                "expected TRR_VERSION '{TRR_VERSION}', got '{version}'"
            )));
        }

        let mut header = FrameHeader {
            ir_size: self.read_size()?,
            e_size: self.read_size()?,
            box_size: self.read_size()?,
            vir_size: self.read_size()?,
            pres_size: self.read_size()?,
            top_size: self.read_size()?,
            sym_size: self.read_size()?,
            x_size: self.read_size()?,
            v_size: self.read_size()?,
            f_size: self.read_size()?,
            ..FrameHeader::default()
        };
        let natoms = self.read_size()?;
        header.natoms = usize::try_from(natoms)
            .map_err(|_| self.context_error(format!("too many atoms ({natoms})")))?;
        header.step = self.file.read_i32()?;
        header.nre = self.file.read_i32()?;

        let natoms = header.natoms as u64;
        let real_size = if header.box_size > 0 {
            header.box_size / 9
        } else if natoms > 0 {
            [header.x_size, header.v_size, header.f_size]
                .into_iter()
                .find(|&size| size > 0)
                .map_or(0, |size| size / (3 * natoms))
        } else {
            return Err(self.context_error(format!(
                "frame with step '{}' has no data",
                header.step
            )));
        };
        if real_size != 4 && real_size != 8 {
            return Err(self.context_error(format!(
                "frame with step '{}' has an invalid size",
                header.step
            )));
        }
        header.double = real_size == 8;

        let vector_size = 3 * natoms * real_size;
        let blocks = [
            ("box", header.box_size, 9 * real_size),
            ("positions", header.x_size, vector_size),
            ("velocities", header.v_size, vector_size),
            ("forces", header.f_size, vector_size),
        ];
        for (name, size, expected) in blocks {
            if size != 0 && size != expected {
                return Err(self.context_error(format!(
                    "frame with step '{}' declares {size} bytes of {name}, expected {expected}",
                    header.step
                )));
            }
        }

        let precision = header.precision();
        header.time = self.file.read_real(precision)?;
        header.lambda = self.file.read_real(precision)?;
        Ok(header)
    }

    /// Locates one more frame. Returns `false` when the end of the file is
    /// reached exactly at a frame boundary.
    fn index_next(&mut self) -> Result<bool> {
        let start = self.scan_position;
        if start >= self.file.len() {
            self.index_complete = true;
            debug!(frames = self.offsets.len(), "TRR index complete");
            return Ok(false);
        }
        if self.file.tell() != start {
            self.file.seek(start)?;
        }

        let header = self.read_header()?;
        self.headers_scanned += 1;
        match self.natoms {
            None => self.natoms = Some(header.natoms),
            Some(natoms) if natoms != header.natoms => {
                return Err(self.context_error(format!(
                    "frame {} has {} atoms, but previous frames have {natoms}; \
                     the number of atoms can not change in a trajectory",
                    self.offsets.len(),
                    header.natoms
                )));
            }
            Some(_) => {}
        }

        let end = self.file.tell() + header.body_size();
        if end > self.file.len() {
            return Err(self.context_error(format!(
                "frame {} is truncated: expected {} bytes of data, but the file ends after {}",
                self.offsets.len(),
                header.body_size(),
                self.file.len() - self.file.tell()
            )));
        }
        trace!(frame = self.offsets.len(), offset = start, "indexed TRR frame");
        self.offsets.push(start);
        self.scan_position = end;
        Ok(true)
    }

    fn index_until(&mut self, step: u64) -> Result<()> {
        while !self.index_complete && (self.offsets.len() as u64) <= step {
            self.index_next()?;
        }
        Ok(())
    }

    fn index_all(&mut self) -> Result<()> {
        while !self.index_complete {
            self.index_next()?;
        }
        Ok(())
    }

    fn read_vectors(&mut self, header: &FrameHeader) -> Result<Vec<Vector3<f64>>> {
        let mut values = vec![0.0; 3 * header.natoms];
        self.file.read_reals(header.precision(), &mut values)?;
        Ok(values
            .chunks_exact(3)
            .map(|xyz| Vector3::new(xyz[0], xyz[1], xyz[2]) * NM_TO_ANGSTROM)
            .collect())
    }

    fn read_body(&mut self, header: &FrameHeader, frame: &mut Frame) -> Result<()> {
        self.file.skip(header.ir_size + header.e_size)?;
        if header.box_size > 0 {
            let mut values = [0.0; 9];
            self.file.read_reals(header.precision(), &mut values)?;
            let columns: Vec<Vector3<f64>> = values
                .chunks_exact(3)
                .map(|xyz| Vector3::new(xyz[0], xyz[1], xyz[2]) * NM_TO_ANGSTROM)
                .collect();
            let matrix = Matrix3::from_columns(&columns);
            frame.set_cell(Some(UnitCell::from_matrix(matrix)));
        }
        self.file
            .skip(header.vir_size + header.pres_size + header.top_size + header.sym_size)?;

        if header.x_size > 0 {
            let positions = self.read_vectors(header)?;
            for (target, position) in frame.positions_mut().iter_mut().zip(positions) {
                *target = Point3::from(position);
            }
        }
        if header.v_size > 0 {
            let velocities = self.read_vectors(header)?;
            frame.add_velocities();
            if let Some(targets) = frame.velocities_mut() {
                targets.copy_from_slice(&velocities);
            }
        }
        self.file.skip(header.f_size)?;
        Ok(())
    }

    /// Block sizes and atom count in on-disk order, checked to fit the
    /// header fields.
    fn encoded_sizes(header: &FrameHeader) -> Result<[i32; 11]> {
        let sizes = [
            header.ir_size,
            header.e_size,
            header.box_size,
            header.vir_size,
            header.pres_size,
            header.top_size,
            header.sym_size,
            header.x_size,
            header.v_size,
            header.f_size,
            header.natoms as u64,
        ];
        let mut encoded = [0; 11];
        for (target, size) in encoded.iter_mut().zip(sizes) {
            *target = i32::try_from(size)
                .map_err(|_| Error::format(format!("TRR block size {size} is too large")))?;
        }
        Ok(encoded)
    }

    fn write_header(&mut self, header: &FrameHeader, sizes: &[i32; 11]) -> Result<()> {
        self.file.write_i32(TRR_MAGIC)?;
        self.file.write_gmx_string(TRR_VERSION)?;
        for &size in sizes {
            self.file.write_i32(size)?;
        }
        self.file.write_i32(header.step)?;
        self.file.write_i32(header.nre)?;
        self.file.write_f32(header.time as f32)?;
        self.file.write_f32(header.lambda as f32)?;
        Ok(())
    }

    fn write_vectors<'a>(&mut self, vectors: impl Iterator<Item = &'a Vector3<f64>>) -> Result<()> {
        for vector in vectors {
            for value in vector.iter() {
                self.file.write_f32((value / NM_TO_ANGSTROM) as f32)?;
            }
        }
        Ok(())
    }
}

impl Format for TrrFormat {
    fn metadata(&self) -> &'static FormatMetadata {
        &TRR_METADATA
    }

    fn read_step(&mut self, step: u64, frame: &mut Frame) -> Result<()> {
        self.index_until(step)?;
        let offset = match usize::try_from(step).ok().and_then(|index| self.offsets.get(index)) {
            Some(&offset) => offset,
            None => {
                return Err(Error::OutOfBounds {
                    step,
                    nsteps: self.offsets.len() as u64,
                });
            }
        };

        self.file.seek(offset)?;
        let header = self.read_header()?;
        let frame_step = u64::try_from(header.step).map_err(|_| {
            self.context_error(format!("frame {step} has a negative step {}", header.step))
        })?;
        frame.clear();
        frame.resize(header.natoms);
        frame.set_step(frame_step);
        frame.properties.set("time", header.time);
        frame.properties.set("trr_lambda", header.lambda);
        frame.properties.set("has_positions", header.x_size > 0);
        self.read_body(&header, frame).map_err(|error| match error {
            Error::Io(io) => self.context_error(format!("could not read frame {step}: {io}")),
            other => other,
        })?;

        self.step = step + 1;
        Ok(())
    }

    fn read(&mut self, frame: &mut Frame) -> Result<()> {
        self.read_step(self.step, frame)
    }

    fn write(&mut self, frame: &Frame) -> Result<()> {
        let natoms = frame.size();
        if let Some(expected) = self.natoms.filter(|&expected| expected != natoms) {
            return Err(Error::format(format!(
                "TRR format does not support varying numbers of atoms: expected {expected}, but got {natoms}"
            )));
        }

        let cell = frame
            .cell()
            .filter(|cell| cell.shape() != CellShape::Infinite);
        let has_positions = frame.properties.get_bool("has_positions").unwrap_or(true);
        let vector_size = (4 * 3 * natoms) as u64;
        let step = i32::try_from(frame.step())
            .map_err(|_| Error::format(format!("step {} is too large for TRR", frame.step())))?;

        let header = FrameHeader {
            box_size: if cell.is_some() { 4 * 9 } else { 0 },
            x_size: if has_positions { vector_size } else { 0 },
            v_size: if frame.velocities().is_some() { vector_size } else { 0 },
            natoms,
            step,
            time: frame.properties.get_double("time").unwrap_or(0.0),
            lambda: frame.properties.get_double("trr_lambda").unwrap_or(0.0),
            ..FrameHeader::default()
        };

        let sizes = Self::encoded_sizes(&header)?;
        self.natoms = Some(natoms);

        let start = self.file.tell();
        self.write_header(&header, &sizes)?;
        if let Some(cell) = cell {
            let columns: Vec<Vector3<f64>> = cell.matrix().column_iter().map(|c| c.into_owned()).collect();
            self.write_vectors(columns.iter())?;
        }
        if has_positions {
            let positions: Vec<Vector3<f64>> = frame.positions().iter().map(|p| p.coords).collect();
            self.write_vectors(positions.iter())?;
        }
        if let Some(velocities) = frame.velocities() {
            self.write_vectors(velocities.iter())?;
        }

        self.offsets.push(start);
        self.step += 1;
        Ok(())
    }

    fn nsteps(&mut self) -> Result<u64> {
        self.index_all()?;
        Ok(self.offsets.len() as u64)
    }

    fn finish(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}

impl Drop for TrrFormat {
    fn drop(&mut self) {
        if self.mode != Mode::Read {
            if let Err(error) = self.file.flush() {
                tracing::warn!(%error, "failed to flush TRR file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn frame_with(natoms: usize, step: u64) -> Frame {
        let mut frame = Frame::new();
        frame.resize(natoms);
        for (i, position) in frame.positions_mut().iter_mut().enumerate() {
            *position = Point3::new(i as f64, 2.0 * i as f64, step as f64);
        }
        frame.set_step(step);
        frame.properties.set("time", step as f64 * 0.5);
        frame
    }

    fn write_frames(path: &Path, frames: &[Frame]) {
        let mut format = TrrFormat::open(path, Mode::Write, Compression::Default).unwrap();
        for frame in frames {
            format.write(frame).unwrap();
        }
        format.finish().unwrap();
    }

    #[test]
    fn frame_with_positions_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("single.trr");
        let mut frame = frame_with(3, 7);
        frame.set_cell(Some(UnitCell::orthorhombic(20.0, 30.0, 40.0)));
        frame.properties.set("trr_lambda", 0.25);
        write_frames(&path, &[frame]);

        let mut format = TrrFormat::open(&path, Mode::Read, Compression::Default).unwrap();
        let mut read = Frame::new();
        format.read(&mut read).unwrap();

        assert_eq!(read.size(), 3);
        assert_eq!(read.step(), 7);
        assert_eq!(read.properties.get_double("time"), Some(3.5));
        assert_eq!(read.properties.get_double("trr_lambda"), Some(0.25));
        assert_eq!(read.properties.get_bool("has_positions"), Some(true));
        assert!((read.positions()[2] - Point3::new(2.0, 4.0, 7.0)).norm() < 1e-5);
        let lengths = read.cell().unwrap().lengths();
        assert!((lengths[0] - 20.0).abs() < 1e-4);
        assert!((lengths[2] - 40.0).abs() < 1e-4);
        assert!(read.velocities().is_none());
    }

    #[test]
    fn velocities_are_written_when_present() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("velocities.trr");
        let mut frame = frame_with(2, 0);
        frame.add_velocities();
        frame.velocities_mut().unwrap()[1] = Vector3::new(1.0, -2.0, 3.0);
        write_frames(&path, &[frame]);

        let mut format = TrrFormat::open(&path, Mode::Read, Compression::Default).unwrap();
        let mut read = Frame::new();
        format.read(&mut read).unwrap();
        let velocities = read.velocities().unwrap();
        assert!((velocities[1] - Vector3::new(1.0, -2.0, 3.0)).norm() < 1e-5);
        assert!(read.cell().is_none());
    }

    #[test]
    fn positions_can_be_omitted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nopos.trr");
        let mut frame = frame_with(2, 0);
        frame.set_cell(Some(UnitCell::orthorhombic(1.0, 1.0, 1.0)));
        frame.properties.set("has_positions", false);
        write_frames(&path, &[frame]);

        let mut format = TrrFormat::open(&path, Mode::Read, Compression::Default).unwrap();
        let mut read = Frame::new();
        format.read(&mut read).unwrap();
        assert_eq!(read.properties.get_bool("has_positions"), Some(false));
        assert_eq!(read.positions()[1], Point3::origin());
    }

    #[test]
    fn indexing_is_lazy_and_never_rescans() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lazy.trr");
        let frames: Vec<Frame> = (0..5).map(|step| frame_with(4, step)).collect();
        write_frames(&path, &frames);

        let mut format = TrrFormat::open(&path, Mode::Read, Compression::Default).unwrap();
        let mut frame = Frame::new();
        format.read_step(1, &mut frame).unwrap();
        assert_eq!(format.frame_offsets().len(), 2);
        assert_eq!(format.headers_scanned, 2);

        assert_eq!(format.nsteps().unwrap(), 5);
        assert_eq!(format.headers_scanned, 5);
        let offsets = format.frame_offsets().to_vec();

        assert_eq!(format.nsteps().unwrap(), 5);
        format.read_step(4, &mut frame).unwrap();
        format.read_step(0, &mut frame).unwrap();
        assert_eq!(format.headers_scanned, 5);
        assert_eq!(format.frame_offsets(), offsets.as_slice());
    }

    #[test]
    fn reading_past_the_end_is_out_of_bounds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bounds.trr");
        write_frames(&path, &[frame_with(1, 0)]);

        let mut format = TrrFormat::open(&path, Mode::Read, Compression::Default).unwrap();
        let mut frame = Frame::new();
        format.read(&mut frame).unwrap();
        assert!(matches!(
            format.read(&mut frame),
            Err(Error::OutOfBounds { step: 1, nsteps: 1 })
        ));
    }

    #[test]
    fn compression_is_rejected() {
        let dir = tempdir().unwrap();
        let error = TrrFormat::open(&dir.path().join("x.trr"), Mode::Write, Compression::Gzip)
            .unwrap_err();
        assert!(matches!(error, Error::Format(ref message) if message.contains("compression")));
        assert!(TrrFormat::open(&dir.path().join("x.trr.gz"), Mode::Write, Compression::Default).is_err());
    }

    #[test]
    fn writing_a_different_atom_count_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("varying.trr");
        let mut format = TrrFormat::open(&path, Mode::Write, Compression::Default).unwrap();
        format.write(&frame_with(3, 0)).unwrap();
        assert!(matches!(
            format.write(&frame_with(4, 1)),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn truncated_frame_is_a_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("truncated.trr");
        write_frames(&path, &[frame_with(3, 0), frame_with(3, 1)]);
        let length = std::fs::metadata(&path).unwrap().len();
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(length - 4).unwrap();

        let mut format = TrrFormat::open(&path, Mode::Read, Compression::Default).unwrap();
        let mut frame = Frame::new();
        format.read_step(0, &mut frame).unwrap();
        assert!(matches!(format.nsteps(), Err(Error::Format(_))));
    }

    #[test]
    fn bad_magic_is_a_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("magic.trr");
        std::fs::write(&path, [0u8; 96]).unwrap();
        let mut format = TrrFormat::open(&path, Mode::Read, Compression::Default).unwrap();
        let error = format.nsteps().unwrap_err();
        assert!(matches!(error, Error::Format(ref message) if message.contains("TRR_MAGIC")));
    }

    #[test]
    fn append_checks_existing_atom_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("append.trr");
        write_frames(&path, &[frame_with(2, 0)]);

        {
            let mut format = TrrFormat::open(&path, Mode::Append, Compression::Default).unwrap();
            assert_eq!(format.nsteps().unwrap(), 1);
            assert!(format.write(&frame_with(3, 1)).is_err());
            format.write(&frame_with(2, 1)).unwrap();
        }

        let mut format = TrrFormat::open(&path, Mode::Read, Compression::Default).unwrap();
        assert_eq!(format.nsteps().unwrap(), 2);
        let mut frame = Frame::new();
        format.read_step(1, &mut frame).unwrap();
        assert_eq!(frame.step(), 1);
    }

    #[test]
    fn append_creates_missing_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.trr");
        {
            let mut format = TrrFormat::open(&path, Mode::Append, Compression::Default).unwrap();
            format.write(&frame_with(1, 0)).unwrap();
        }
        let mut format = TrrFormat::open(&path, Mode::Read, Compression::Default).unwrap();
        assert_eq!(format.nsteps().unwrap(), 1);
    }

    /// A frame of two atoms in double precision, with a cubic box of 2 nm.
    fn double_precision_frame(step: i32, time: f64) -> Vec<u8> {
        let mut bytes = Vec::new();
        let int = |bytes: &mut Vec<u8>, value: i32| bytes.extend(value.to_be_bytes());
        int(&mut bytes, TRR_MAGIC);
        int(&mut bytes, 13);
        int(&mut bytes, 12);
        bytes.extend(TRR_VERSION.as_bytes());
        // ir, e, box, vir, pres, top, sym, x, v, f, natoms
        for size in [0, 0, 72, 0, 0, 0, 0, 48, 0, 0, 2] {
            int(&mut bytes, size);
        }
        int(&mut bytes, step);
        int(&mut bytes, 0);
        let box_values = [2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0];
        let positions = [0.1, 0.2, 0.3, 0.4, 0.5, f64::from(step)];
        for value in [time, 0.0].iter().chain(&box_values).chain(&positions) {
            bytes.extend(value.to_be_bytes());
        }
        bytes
    }

    #[test]
    fn double_precision_frames_are_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("double.trr");
        let mut content = double_precision_frame(10, 0.5);
        content.extend(double_precision_frame(20, 1.5));
        std::fs::write(&path, content).unwrap();

        let mut format = TrrFormat::open(&path, Mode::Read, Compression::Default).unwrap();
        assert_eq!(format.nsteps().unwrap(), 2);
        assert_eq!(format.frame_offsets(), &[0, 212]);

        let mut frame = Frame::new();
        format.read_step(1, &mut frame).unwrap();
        assert_eq!(frame.size(), 2);
        assert_eq!(frame.step(), 20);
        assert_eq!(frame.properties.get_double("time"), Some(1.5));
        assert!((frame.positions()[0] - Point3::new(1.0, 2.0, 3.0)).norm() < 1e-12);
        assert!((frame.positions()[1].z - 200.0).abs() < 1e-12);
        let lengths = frame.cell().unwrap().lengths();
        assert!((lengths[1] - 20.0).abs() < 1e-12);
    }

    #[test]
    fn negative_steps_are_a_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("negative.trr");
        std::fs::write(&path, double_precision_frame(-1, 0.0)).unwrap();

        let mut format = TrrFormat::open(&path, Mode::Read, Compression::Default).unwrap();
        let mut frame = Frame::new();
        let error = format.read(&mut frame).unwrap_err();
        assert!(matches!(error, Error::Format(ref message) if message.contains("negative step -1")));
    }

    #[test]
    fn rejected_first_frame_does_not_fix_the_atom_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rejected.trr");
        {
            let mut format = TrrFormat::open(&path, Mode::Write, Compression::Default).unwrap();
            let too_late = frame_with(3, u64::from(u32::MAX));
            assert!(matches!(format.write(&too_late), Err(Error::Format(_))));
            format.write(&frame_with(2, 0)).unwrap();
            format.finish().unwrap();
        }

        let mut format = TrrFormat::open(&path, Mode::Read, Compression::Default).unwrap();
        assert_eq!(format.nsteps().unwrap(), 1);
        let mut frame = Frame::new();
        format.read(&mut frame).unwrap();
        assert_eq!(frame.size(), 2);
    }
}
