//! Stream adapters shared by every codec.
//!
//! [`text::TextFile`] gives line-oriented access to plain or gzip-compressed
//! files, [`xdr::XdrFile`] gives big-endian binary access to plain files, and
//! [`gzip::GzHandle`] is the single-use compressed handle underneath text
//! files. Compressed streams can only be read or written from the start; they
//! support seeking to any logical position, but never relative to the end.

pub mod gzip;
pub mod text;
pub mod xdr;

use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use gzip::GzHandle;

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Read,
    Write,
    Append,
}

impl Mode {
    pub fn as_char(self) -> char {
        match self {
            Mode::Read => 'r',
            Mode::Write => 'w',
            Mode::Append => 'a',
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Error)]
#[error("invalid open mode '{0}', expected one of 'r', 'w' or 'a'")]
pub struct ParseModeError(String);

impl FromStr for Mode {
    type Err = ParseModeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "r" | "read" => Ok(Mode::Read),
            "w" | "write" => Ok(Mode::Write),
            "a" | "append" => Ok(Mode::Append),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Compression applied to the bytes on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Gzip for paths ending in `.gz`, none otherwise.
    #[default]
    Default,
    None,
    Gzip,
}

impl Compression {
    /// Replaces [`Compression::Default`] with the policy implied by `path`.
    pub fn resolve(self, path: &Path) -> Compression {
        match self {
            Compression::Default => {
                let gzipped = path
                    .extension()
                    .is_some_and(|extension| extension.eq_ignore_ascii_case("gz"));
                if gzipped {
                    Compression::Gzip
                } else {
                    Compression::None
                }
            }
            other => other,
        }
    }
}

#[derive(Debug, Error)]
pub enum IoError {
    #[error("Could not open '{path}': {source}")]
    Open { path: String, source: io::Error },
    #[error("Appending (open mode 'a') is not supported with gzipped file '{path}'")]
    AppendToCompressed { path: String },
    #[error("Can not open a gzip handle twice")]
    AlreadyOpen,
    #[error("Seeking relative to the end is not supported for gzip streams")]
    SeekFromEnd,
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("File '{path}' was not opened for {operation}")]
    WrongMode {
        path: String,
        operation: &'static str,
    },
    #[error("I/O error: {0}")]
    Stream(#[from] io::Error),
}

impl IoError {
    pub(crate) fn open(path: &Path, source: io::Error) -> Self {
        IoError::Open {
            path: path.display().to_string(),
            source,
        }
    }

    /// Maps a short read to [`IoError::UnexpectedEof`].
    pub(crate) fn from_read(error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            IoError::UnexpectedEof
        } else {
            IoError::Stream(error)
        }
    }
}

impl From<IoError> for io::Error {
    fn from(error: IoError) -> Self {
        match error {
            IoError::Stream(inner) => inner,
            IoError::UnexpectedEof => io::Error::from(io::ErrorKind::UnexpectedEof),
            IoError::SeekFromEnd => io::Error::new(io::ErrorKind::Unsupported, IoError::SeekFromEnd),
            other => io::Error::other(other),
        }
    }
}

/// Opens a plain file with the access `mode` implies. Append mode also
/// allows reading so codecs can index existing content.
pub(crate) fn open_plain(path: &Path, mode: Mode) -> Result<File, IoError> {
    let result = match mode {
        Mode::Read => File::open(path),
        Mode::Write => File::create(path),
        Mode::Append => std::fs::OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path),
    };
    result.map_err(|source| IoError::open(path, source))
}

/// A plain or gzip-compressed file handle.
#[derive(Debug)]
pub(crate) enum FileHandle {
    Plain(File),
    Gzip(GzHandle),
}

impl FileHandle {
    pub(crate) fn open(path: &Path, mode: Mode, compression: Compression) -> Result<Self, IoError> {
        match compression.resolve(path) {
            Compression::Gzip => Ok(FileHandle::Gzip(GzHandle::open_path(path, mode)?)),
            _ => Ok(FileHandle::Plain(open_plain(path, mode)?)),
        }
    }

    pub(crate) fn finish(&mut self) -> Result<(), IoError> {
        match self {
            FileHandle::Plain(file) => file.flush().map_err(IoError::from),
            FileHandle::Gzip(handle) => handle.finish(),
        }
    }
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            FileHandle::Plain(file) => file.read(buf),
            FileHandle::Gzip(handle) => handle.read(buf),
        }
    }
}

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileHandle::Plain(file) => file.write(buf),
            FileHandle::Gzip(handle) => handle.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileHandle::Plain(file) => file.flush(),
            FileHandle::Gzip(handle) => handle.flush(),
        }
    }
}

impl Seek for FileHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            FileHandle::Plain(file) => file.seek(pos),
            FileHandle::Gzip(handle) => handle.seek(pos),
        }
    }
}

/// Returns the path with a trailing `.gz` removed, used for extension
/// lookups on compressed files.
pub fn strip_gz_suffix(path: &Path) -> PathBuf {
    let gzipped = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("gz"));
    if gzipped {
        path.with_extension("")
    } else {
        path.to_path_buf()
    }
}
