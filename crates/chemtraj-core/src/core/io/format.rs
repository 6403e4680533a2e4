use super::error::Result;
use crate::core::models::frame::Frame;

/// Static description of a format and of what it can store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatMetadata {
    pub name: &'static str,
    /// Canonical extension, including the leading dot.
    pub extension: Option<&'static str>,
    pub description: &'static str,
    /// Link to the format documentation.
    pub reference: &'static str,

    pub read: bool,
    pub write: bool,
    /// `read_step` jumps to a frame without decoding the ones before it.
    pub random_access: bool,

    pub positions: bool,
    pub velocities: bool,
    pub unit_cell: bool,
    pub atoms: bool,
    pub bonds: bool,
    /// The format can be read from and written to gzip streams.
    pub compression: bool,
}

/// The contract every codec implements.
///
/// A format is bound at construction to one path, one access mode and one
/// compression policy. Steps are counted from 0 in file order.
pub trait Format {
    fn metadata(&self) -> &'static FormatMetadata;

    /// Reads the frame at `step` into `frame`, replacing its content. The next
    /// call to [`Format::read`] continues from `step + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`](super::error::Error::OutOfBounds) if the
    /// file holds `step` frames or fewer, and a format error if the frame (or
    /// a frame before it, while indexing) is malformed.
    fn read_step(&mut self, step: u64, frame: &mut Frame) -> Result<()>;

    /// Reads the next frame into `frame`.
    fn read(&mut self, frame: &mut Frame) -> Result<()>;

    /// Appends `frame` at the end of the file.
    fn write(&mut self, frame: &Frame) -> Result<()>;

    /// Number of frames in the file. The first call may scan the whole file;
    /// later calls reuse what was learned.
    fn nsteps(&mut self) -> Result<u64>;

    /// Flushes pending output. Called when a trajectory is closed.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
