//! Shared driver for line-oriented text formats.
//!
//! A [`TextCodec`] only knows how to read, write and skip one frame at the
//! current position of a [`TextFile`]. [`TextFormat`] turns it into a full
//! [`Format`] by remembering where each frame starts, so `read_step` can seek
//! straight to a frame that was already located.

use super::error::{Error, Result};
use super::files::text::TextFile;
use super::files::{Compression, IoError, Mode};
use super::format::{Format, FormatMetadata};
use crate::core::models::frame::Frame;
use std::path::Path;
use tracing::debug;

pub trait TextCodec {
    fn metadata(&self) -> &'static FormatMetadata;

    /// Reads the frame starting at the current position.
    fn read_next(&mut self, file: &mut TextFile, frame: &mut Frame) -> Result<()>;

    /// Writes `frame` at the current position.
    fn write_next(&mut self, file: &mut TextFile, frame: &Frame) -> Result<()>;

    /// Skips the frame starting at or after the current position, returning
    /// where it starts, or `None` if no frame is left.
    fn forward(&mut self, file: &mut TextFile) -> Result<Option<u64>>;
}

/// A [`Format`] over any [`TextCodec`].
#[derive(Debug)]
pub struct TextFormat<C> {
    file: TextFile,
    codec: C,
    offsets: Vec<u64>,
    scan_position: u64,
    index_complete: bool,
    step: u64,
}

impl<C: TextCodec> TextFormat<C> {
    /// Opens `path` with the given codec.
    ///
    /// # Errors
    ///
    /// Fails when the file can not be opened, when appending to a compressed
    /// file, or when gzip is requested for a codec that can not use it.
    pub fn open(path: &Path, mode: Mode, compression: Compression, codec: C) -> Result<Self> {
        let metadata = codec.metadata();
        if compression.resolve(path) == Compression::Gzip && !metadata.compression {
            return Err(Error::format(format!(
                "{} format does not support compression",
                metadata.name
            )));
        }
        let file = TextFile::open(path, mode, compression)?;
        Ok(Self {
            file,
            codec,
            offsets: Vec::new(),
            scan_position: 0,
            index_complete: mode != Mode::Read,
            step: 0,
        })
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn codec_mut(&mut self) -> &mut C {
        &mut self.codec
    }

    /// Offsets of the frames located so far.
    pub fn frame_offsets(&self) -> &[u64] {
        &self.offsets
    }

    fn index_until(&mut self, step: u64) -> Result<()> {
        if self.index_complete || (self.offsets.len() as u64) > step {
            return Ok(());
        }
        if self.file.tellpos() != self.scan_position {
            self.file.seek(self.scan_position)?;
        }
        while (self.offsets.len() as u64) <= step {
            match self.codec.forward(&mut self.file)? {
                Some(start) => {
                    self.offsets.push(start);
                    self.scan_position = self.file.tellpos();
                }
                None => {
                    self.index_complete = true;
                    debug!(
                        format = self.codec.metadata().name,
                        frames = self.offsets.len(),
                        "text index complete"
                    );
                    break;
                }
            }
        }
        Ok(())
    }
}

impl<C: TextCodec> Format for TextFormat<C> {
    fn metadata(&self) -> &'static FormatMetadata {
        self.codec.metadata()
    }

    fn read_step(&mut self, step: u64, frame: &mut Frame) -> Result<()> {
        self.index_until(step)?;
        let Some(&offset) = usize::try_from(step)
            .ok()
            .and_then(|index| self.offsets.get(index))
        else {
            return Err(Error::OutOfBounds {
                step,
                nsteps: self.offsets.len() as u64,
            });
        };
        self.file.seek(offset)?;
        self.codec.read_next(&mut self.file, frame)?;
        frame.set_step(step);
        self.step = step + 1;
        Ok(())
    }

    fn read(&mut self, frame: &mut Frame) -> Result<()> {
        self.read_step(self.step, frame)
    }

    fn write(&mut self, frame: &Frame) -> Result<()> {
        let start = self.file.tellpos();
        self.codec.write_next(&mut self.file, frame)?;
        self.offsets.push(start);
        self.step += 1;
        Ok(())
    }

    fn nsteps(&mut self) -> Result<u64> {
        self.index_until(u64::MAX)?;
        Ok(self.offsets.len() as u64)
    }

    fn finish(&mut self) -> Result<()> {
        self.file.finish()?;
        Ok(())
    }
}

/// Reads a line, reporting the end of the file as a truncated frame.
pub(crate) fn read_frame_line(file: &mut TextFile, format: &str) -> Result<String> {
    file.readline().map_err(|error| match error {
        IoError::UnexpectedEof => Error::format(format!(
            "unexpected end of file in {format} frame in '{}'",
            file.path().display()
        )),
        other => Error::Io(other),
    })
}
