//! The user-facing entry point: a file of frames, opened once in one mode.

use crate::core::io::error::{Error, Result};
use crate::core::io::files::Mode;
use crate::core::io::format::{Format, FormatMetadata};
use crate::core::io::options::OpenOptions;
use crate::core::io::registry;
use crate::core::models::frame::Frame;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{instrument, warn};

/// A trajectory file.
///
/// The codec is chosen from the options, the file extension or the file
/// content. Pending output is flushed by [`Trajectory::close`], or when the
/// trajectory is dropped.
pub struct Trajectory {
    path: PathBuf,
    mode: Mode,
    format: Box<dyn Format>,
    step: u64,
    closed: bool,
}

impl fmt::Debug for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trajectory")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("format", &self.format.metadata().name)
            .field("step", &self.step)
            .finish()
    }
}

impl Trajectory {
    /// Opens `path` in `mode`, guessing the format and compression.
    pub fn open(path: impl AsRef<Path>, mode: Mode) -> Result<Self> {
        Self::open_with(path, &OpenOptions::new().mode(mode))
    }

    #[instrument(skip_all, name = "trajectory_open", fields(path = %path.as_ref().display()))]
    pub fn open_with(path: impl AsRef<Path>, options: &OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        let format = registry::open(path, options)?;
        Ok(Self {
            path: path.to_path_buf(),
            mode: options.config().mode,
            format,
            step: 0,
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn metadata(&self) -> &'static FormatMetadata {
        self.format.metadata()
    }

    /// Reads the next frame.
    #[instrument(skip_all, name = "trajectory_read", fields(path = %self.path.display(), step = self.step))]
    pub fn read(&mut self) -> Result<Frame> {
        self.check_mode(Mode::Read, "read from")?;
        let mut frame = Frame::new();
        self.format.read(&mut frame)?;
        self.step += 1;
        Ok(frame)
    }

    /// Reads the frame at `step`; the next [`Trajectory::read`] continues
    /// after it.
    #[instrument(skip_all, name = "trajectory_read_step", fields(path = %self.path.display(), step = step))]
    pub fn read_step(&mut self, step: u64) -> Result<Frame> {
        self.check_mode(Mode::Read, "read from")?;
        let mut frame = Frame::new();
        self.format.read_step(step, &mut frame)?;
        self.step = step + 1;
        Ok(frame)
    }

    #[instrument(skip_all, name = "trajectory_write", fields(path = %self.path.display(), atoms = frame.size()))]
    pub fn write(&mut self, frame: &Frame) -> Result<()> {
        if self.mode == Mode::Read {
            return Err(self.wrong_mode("write to"));
        }
        self.format.write(frame)?;
        self.step += 1;
        Ok(())
    }

    /// Number of frames in the file, or written so far.
    pub fn nsteps(&mut self) -> Result<u64> {
        self.format.nsteps()
    }

    /// Whether every frame has been read. Always true when writing.
    pub fn done(&mut self) -> Result<bool> {
        if self.mode != Mode::Read {
            return Ok(true);
        }
        Ok(self.step >= self.format.nsteps()?)
    }

    /// Flushes pending output and closes the file.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.format.finish()
    }

    fn check_mode(&self, expected: Mode, operation: &str) -> Result<()> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(self.wrong_mode(operation))
        }
    }

    fn wrong_mode(&self, operation: &str) -> Error {
        Error::unsupported(format!(
            "can not {operation} '{}' opened in mode '{}'",
            self.path.display(),
            self.mode
        ))
    }
}

impl Drop for Trajectory {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(error) = self.format.finish() {
            warn!(path = %self.path.display(), %error, "failed to finish trajectory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use nalgebra::Point3;
    use tempfile::tempdir;

    fn molecule(offset: f64) -> Frame {
        let mut frame = Frame::new();
        frame.add_atom(Atom::new("O"), Point3::new(offset, 0.0, 0.0), None);
        frame.add_atom(Atom::new("H"), Point3::new(offset + 1.0, 0.0, 0.0), None);
        frame
    }

    #[test]
    fn written_frames_are_read_back_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("water.xyz");

        let mut output = Trajectory::open(&path, Mode::Write).unwrap();
        for i in 0..3 {
            output.write(&molecule(f64::from(i))).unwrap();
        }
        assert_eq!(output.nsteps().unwrap(), 3);
        output.close().unwrap();

        let mut input = Trajectory::open(&path, Mode::Read).unwrap();
        assert_eq!(input.metadata().name, "XYZ");
        assert!(!input.done().unwrap());
        let mut count = 0u32;
        while !input.done().unwrap() {
            let frame = input.read().unwrap();
            assert_eq!(frame.positions()[0].x, f64::from(count));
            assert_eq!(frame.step(), u64::from(count));
            count += 1;
        }
        assert_eq!(count, 3);
        assert_eq!(input.read_step(1).unwrap().positions()[0].x, 1.0);
        assert_eq!(input.read().unwrap().positions()[0].x, 2.0);
    }

    #[test]
    fn using_the_wrong_mode_is_unsupported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frames.xyz");

        let mut output = Trajectory::open(&path, Mode::Write).unwrap();
        assert!(matches!(output.read(), Err(Error::Unsupported(_))));
        output.write(&molecule(0.0)).unwrap();
        drop(output);

        let mut input = Trajectory::open(&path, Mode::Read).unwrap();
        assert!(matches!(input.write(&molecule(0.0)), Err(Error::Unsupported(_))));
        assert_eq!(input.read().unwrap().size(), 2);
    }

    #[test]
    fn missing_files_fail_to_open() {
        let dir = tempdir().unwrap();
        let result = Trajectory::open(dir.path().join("absent.xyz"), Mode::Read);
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
