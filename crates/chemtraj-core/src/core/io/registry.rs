//! Picks the codec for a path.
//!
//! Dispatch first looks at the file extension (after stripping `.gz`), then,
//! in read mode only, at the first bytes of the file.

use super::error::{Error, Result};
use super::files::{IoError, Mode, strip_gz_suffix};
use super::format::{Format, FormatMetadata};
use super::inchi::{INCHI_METADATA, InchiCodec};
use super::options::{ConfigError, OpenOptions};
use super::text::TextFormat;
use super::trr::{TRR_METADATA, TrrFormat};
use super::xyz::{XYZ_METADATA, XyzCodec};
use flate2::read::MultiGzDecoder;
use phf::{Map, phf_map};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Trr,
    Xyz,
    Inchi,
}

static EXTENSIONS: Map<&'static str, FormatKind> = phf_map! {
    "trr" => FormatKind::Trr,
    "xyz" => FormatKind::Xyz,
    "inchi" => FormatKind::Inchi,
};

const ALL: [FormatKind; 3] = [FormatKind::Trr, FormatKind::Xyz, FormatKind::Inchi];

const TRR_MAGIC: [u8; 4] = 1993_i32.to_be_bytes();
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const SNIFF_LENGTH: u64 = 4096;

impl FormatKind {
    pub fn metadata(self) -> &'static FormatMetadata {
        match self {
            FormatKind::Trr => &TRR_METADATA,
            FormatKind::Xyz => &XYZ_METADATA,
            FormatKind::Inchi => &INCHI_METADATA,
        }
    }

    /// Looks a format up by its name, ignoring case.
    pub fn by_name(name: &str) -> Option<Self> {
        ALL.into_iter()
            .find(|kind| kind.metadata().name.eq_ignore_ascii_case(name.trim()))
    }

    /// Looks a format up by extension, with or without the leading dot.
    pub fn by_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        EXTENSIONS.get(extension.as_str()).copied()
    }
}

/// Metadata of every known format.
pub fn formats() -> impl Iterator<Item = &'static FormatMetadata> {
    ALL.into_iter().map(FormatKind::metadata)
}

/// Finds the format of `path` from its extension, or from its content when
/// the extension is unknown and the file is opened for reading.
pub fn guess_format(path: &Path, mode: Mode) -> Result<FormatKind> {
    let stripped = strip_gz_suffix(path);
    if let Some(kind) = stripped
        .extension()
        .and_then(|extension| extension.to_str())
        .and_then(FormatKind::by_extension)
    {
        return Ok(kind);
    }
    if mode == Mode::Read {
        if let Some(kind) = sniff(path)? {
            debug!(path = %path.display(), format = kind.metadata().name, "format detected from content");
            return Ok(kind);
        }
    }
    Err(Error::format(format!(
        "can not find a format for '{}'",
        path.display()
    )))
}

fn sniff(path: &Path) -> Result<Option<FormatKind>> {
    let file = File::open(path).map_err(|source| IoError::open(path, source))?;
    let mut head = Vec::new();
    file.take(SNIFF_LENGTH).read_to_end(&mut head)?;

    if head.starts_with(&TRR_MAGIC) {
        return Ok(Some(FormatKind::Trr));
    }
    if head.starts_with(&GZIP_MAGIC) {
        let file = File::open(path).map_err(|source| IoError::open(path, source))?;
        let mut text = Vec::new();
        // A truncated member still yields the bytes decoded so far.
        if let Err(error) = MultiGzDecoder::new(BufReader::new(file))
            .take(SNIFF_LENGTH)
            .read_to_end(&mut text)
        {
            debug!(path = %path.display(), %error, decoded = text.len(), "gzip content is corrupt");
        }
        return Ok(sniff_text(&text));
    }
    Ok(sniff_text(&head))
}

fn sniff_text(head: &[u8]) -> Option<FormatKind> {
    let mut lines = head.lines().map_while(|line| line.ok());
    let first = lines.next()?;
    if first.trim_start().starts_with("InChI=") {
        return Some(FormatKind::Inchi);
    }
    if first.trim().parse::<usize>().is_ok() {
        return Some(FormatKind::Xyz);
    }
    if lines.any(|line| line.trim_start().starts_with("InChI=")) {
        return Some(FormatKind::Inchi);
    }
    None
}

/// Opens `path` with the codec chosen from `options` or from the path.
///
/// # Errors
///
/// Fails when the format override is unknown, when no format matches the
/// path, when the chosen codec can not be opened, and with
/// [`Error::Unsupported`] when InChI is requested without a toolkit.
pub fn open(path: &Path, options: &OpenOptions) -> Result<Box<dyn Format>> {
    let config = options.config();
    let kind = match &config.format {
        Some(name) => {
            FormatKind::by_name(name).ok_or_else(|| ConfigError::UnknownFormat(name.clone()))?
        }
        None => guess_format(path, config.mode)?,
    };
    debug!(path = %path.display(), format = kind.metadata().name, mode = %config.mode, "opening trajectory");

    let format: Box<dyn Format> = match kind {
        FormatKind::Trr => Box::new(TrrFormat::open(path, config.mode, config.compression)?),
        FormatKind::Xyz => Box::new(TextFormat::open(
            path,
            config.mode,
            config.compression,
            XyzCodec,
        )?),
        FormatKind::Inchi => {
            let toolkit = options.identifier_toolkit().ok_or_else(|| {
                Error::unsupported("the InChI format needs an identifier toolkit, none is configured")
            })?;
            let codec = InchiCodec::new(toolkit, options.diagnostics_sink().clone());
            Box::new(TextFormat::open(path, config.mode, config.compression, codec)?)
        }
    };
    Ok(format)
}
