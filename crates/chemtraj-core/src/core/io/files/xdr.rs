use super::{IoError, Mode, open_plain};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
enum XdrInner {
    Reader(BufReader<File>),
    Writer(BufWriter<File>),
}

/// Big-endian (XDR) binary access to a plain file.
///
/// Files opened for reading know their length, which lets codecs detect
/// truncated records before reading them. Files opened for writing or
/// appending only write.
#[derive(Debug)]
pub struct XdrFile {
    path: PathBuf,
    inner: XdrInner,
    position: u64,
    len: u64,
}

impl XdrFile {
    pub fn open(path: &Path, mode: Mode) -> Result<Self, IoError> {
        let file = open_plain(path, mode)?;
        let len = file
            .metadata()
            .map_err(|source| IoError::open(path, source))?
            .len();
        let (inner, position) = match mode {
            Mode::Read => (XdrInner::Reader(BufReader::new(file)), 0),
            Mode::Write => (XdrInner::Writer(BufWriter::new(file)), 0),
            Mode::Append => (XdrInner::Writer(BufWriter::new(file)), len),
        };
        Ok(Self {
            path: path.to_path_buf(),
            inner,
            position,
            len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length of the file when it was opened, in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn tell(&self) -> u64 {
        self.position
    }

    fn wrong_mode(&self, operation: &'static str) -> IoError {
        IoError::WrongMode {
            path: self.path.display().to_string(),
            operation,
        }
    }

    fn reader(&mut self) -> Result<&mut BufReader<File>, IoError> {
        match &mut self.inner {
            XdrInner::Reader(reader) => Ok(reader),
            XdrInner::Writer(_) => Err(IoError::WrongMode {
                path: self.path.display().to_string(),
                operation: "reading",
            }),
        }
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>, IoError> {
        match &mut self.inner {
            XdrInner::Writer(writer) => Ok(writer),
            XdrInner::Reader(_) => Err(IoError::WrongMode {
                path: self.path.display().to_string(),
                operation: "writing",
            }),
        }
    }

    /// Returns `true` when the read position is at the end of the file.
    pub fn eof(&mut self) -> Result<bool, IoError> {
        Ok(self.reader()?.fill_buf()?.is_empty())
    }

    pub fn seek(&mut self, position: u64) -> Result<(), IoError> {
        match &mut self.inner {
            XdrInner::Reader(reader) => {
                reader.seek(SeekFrom::Start(position))?;
            }
            XdrInner::Writer(_) => return Err(self.wrong_mode("seeking")),
        }
        self.position = position;
        Ok(())
    }

    /// Skips `count` bytes without reading them.
    pub fn skip(&mut self, count: u64) -> Result<(), IoError> {
        let offset = i64::try_from(count).map_err(|_| IoError::UnexpectedEof)?;
        self.reader()?.seek_relative(offset)?;
        self.position += count;
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], IoError> {
        let mut bytes = [0u8; N];
        self.reader()?
            .read_exact(&mut bytes)
            .map_err(IoError::from_read)?;
        self.position += N as u64;
        Ok(bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32, IoError> {
        self.read_array().map(i32::from_be_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, IoError> {
        self.read_array().map(u32::from_be_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32, IoError> {
        self.read_array().map(f32::from_be_bytes)
    }

    pub fn read_f64(&mut self) -> Result<f64, IoError> {
        self.read_array().map(f64::from_be_bytes)
    }

    /// Reads a real number stored with `precision` bytes (4 or 8).
    pub fn read_real(&mut self, precision: usize) -> Result<f64, IoError> {
        if precision == 8 {
            self.read_f64()
        } else {
            self.read_f32().map(f64::from)
        }
    }

    /// Fills `values` with reals stored with `precision` bytes each.
    pub fn read_reals(&mut self, precision: usize, values: &mut [f64]) -> Result<(), IoError> {
        for value in values.iter_mut() {
            *value = self.read_real(precision)?;
        }
        Ok(())
    }

    /// Reads a string in GROMACS layout: `i32` length + 1, `u32` length,
    /// then the bytes padded to a multiple of four.
    pub fn read_gmx_string(&mut self) -> Result<String, IoError> {
        let _with_terminator = self.read_i32()?;
        let length = self.read_u32()? as usize;
        let padded = length.div_ceil(4) * 4;
        let mut bytes = vec![0u8; padded];
        self.reader()?
            .read_exact(&mut bytes)
            .map_err(IoError::from_read)?;
        self.position += padded as u64;
        bytes.truncate(length);
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), IoError> {
        self.writer()?.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), IoError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), IoError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), IoError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<(), IoError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_gmx_string(&mut self, value: &str) -> Result<(), IoError> {
        let length = u32::try_from(value.len()).map_err(|_| {
            IoError::Stream(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "string is too long for XDR",
            ))
        })?;
        self.write_i32(length as i32 + 1)?;
        self.write_u32(length)?;
        let mut bytes = value.as_bytes().to_vec();
        bytes.resize(value.len().div_ceil(4) * 4, 0);
        self.write_bytes(&bytes)
    }

    pub fn flush(&mut self) -> Result<(), IoError> {
        if let XdrInner::Writer(writer) = &mut self.inner {
            writer.flush()?;
        }
        Ok(())
    }
}
