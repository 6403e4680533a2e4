use super::{IoError, Mode};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

enum GzState {
    Closed,
    Reading(MultiGzDecoder<BufReader<File>>),
    Writing(GzEncoder<File>),
}

/// A single-use gzip stream over a file.
///
/// A handle is opened once, for reading or writing. Positions are counted in
/// decompressed bytes. Seeking forward decompresses and discards; seeking
/// backward restarts decompression from the beginning of the file. The gzip
/// member is finished when the handle is closed or dropped.
pub struct GzHandle {
    path: PathBuf,
    state: GzState,
    position: u64,
}

impl fmt::Debug for GzHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            GzState::Closed => "closed",
            GzState::Reading(_) => "reading",
            GzState::Writing(_) => "writing",
        };
        f.debug_struct("GzHandle")
            .field("path", &self.path)
            .field("state", &state)
            .field("position", &self.position)
            .finish()
    }
}

impl Default for GzHandle {
    fn default() -> Self {
        Self::new()
    }
}

fn open_decoder(path: &Path) -> Result<MultiGzDecoder<BufReader<File>>, IoError> {
    let file = File::open(path).map_err(|source| IoError::open(path, source))?;
    Ok(MultiGzDecoder::new(BufReader::new(file)))
}

impl GzHandle {
    /// Creates a closed handle.
    pub fn new() -> Self {
        Self {
            path: PathBuf::new(),
            state: GzState::Closed,
            position: 0,
        }
    }

    /// Creates a handle and opens it on `path`.
    pub fn open_path(path: &Path, mode: Mode) -> Result<Self, IoError> {
        let mut handle = Self::new();
        handle.open(path, mode)?;
        Ok(handle)
    }

    /// Opens the handle on `path`.
    ///
    /// # Errors
    ///
    /// * [`IoError::AlreadyOpen`] if this handle is already open.
    /// * [`IoError::AppendToCompressed`] for [`Mode::Append`]; nothing is
    ///   created or written in that case.
    /// * [`IoError::Open`] if the file can not be opened or created.
    pub fn open(&mut self, path: &Path, mode: Mode) -> Result<(), IoError> {
        if !matches!(self.state, GzState::Closed) {
            return Err(IoError::AlreadyOpen);
        }
        let state = match mode {
            Mode::Append => {
                return Err(IoError::AppendToCompressed {
                    path: path.display().to_string(),
                });
            }
            Mode::Read => GzState::Reading(open_decoder(path)?),
            Mode::Write => {
                let file = File::create(path).map_err(|source| IoError::open(path, source))?;
                GzState::Writing(GzEncoder::new(file, flate2::Compression::default()))
            }
        };
        self.path = path.to_path_buf();
        self.state = state;
        self.position = 0;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, GzState::Closed)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current position in the decompressed stream.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Moves to a position in the decompressed stream.
    ///
    /// # Errors
    ///
    /// [`IoError::SeekFromEnd`] for [`SeekFrom::End`], since the decompressed
    /// length is unknown, and [`IoError::UnexpectedEof`] when the target lies
    /// past the end of the data.
    pub fn seek_logical(&mut self, pos: SeekFrom) -> Result<u64, IoError> {
        let target = match pos {
            SeekFrom::End(_) => return Err(IoError::SeekFromEnd),
            SeekFrom::Start(offset) => offset,
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta).ok_or_else(|| {
                IoError::Stream(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "invalid seek to a negative position",
                ))
            })?,
        };

        if !matches!(self.state, GzState::Reading(_)) {
            if matches!(self.state, GzState::Writing(_)) && target == self.position {
                return Ok(target);
            }
            return Err(self.wrong_mode("seeking"));
        }

        if target < self.position {
            self.state = GzState::Reading(open_decoder(&self.path)?);
            self.position = 0;
        }
        if let GzState::Reading(decoder) = &mut self.state {
            let remaining = target - self.position;
            let skipped = io::copy(&mut decoder.by_ref().take(remaining), &mut io::sink())?;
            self.position += skipped;
            if skipped < remaining {
                return Err(IoError::UnexpectedEof);
            }
        }
        Ok(self.position)
    }

    /// Writes the gzip trailer if the handle is writing, and closes it.
    pub fn finish(&mut self) -> Result<(), IoError> {
        if let GzState::Writing(encoder) = &mut self.state {
            encoder.try_finish()?;
            self.state = GzState::Closed;
        }
        Ok(())
    }

    /// Finishes any pending output and closes the handle.
    pub fn close(&mut self) -> Result<(), IoError> {
        let result = self.finish();
        self.state = GzState::Closed;
        self.position = 0;
        result
    }

    fn wrong_mode(&self, operation: &'static str) -> IoError {
        IoError::WrongMode {
            path: self.path.display().to_string(),
            operation,
        }
    }
}

impl Read for GzHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.state {
            GzState::Reading(decoder) => {
                let count = decoder.read(buf)?;
                self.position += count as u64;
                Ok(count)
            }
            _ => Err(self.wrong_mode("reading").into()),
        }
    }
}

impl Write for GzHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.state {
            GzState::Writing(encoder) => {
                let count = encoder.write(buf)?;
                self.position += count as u64;
                Ok(count)
            }
            _ => Err(self.wrong_mode("writing").into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.state {
            GzState::Writing(encoder) => encoder.flush(),
            _ => Ok(()),
        }
    }
}

impl Seek for GzHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seek_logical(pos).map_err(io::Error::from)
    }
}

impl Drop for GzHandle {
    fn drop(&mut self) {
        if let Err(error) = self.finish() {
            warn!(path = %self.path.display(), %error, "failed to finish gzip stream");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_gz(path: &Path, content: &str) {
        let mut handle = GzHandle::open_path(path, Mode::Write).unwrap();
        handle.write_all(content.as_bytes()).unwrap();
        handle.close().unwrap();
    }

    #[test]
    fn written_data_reads_back_decompressed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.txt.gz");
        write_gz(&path, "hello\nworld\n");

        let mut handle = GzHandle::open_path(&path, Mode::Read).unwrap();
        let mut content = String::new();
        handle.read_to_string(&mut content).unwrap();
        assert_eq!(content, "hello\nworld\n");
        assert_eq!(handle.position(), 12);
    }

    #[test]
    fn dropping_a_writer_finishes_the_stream() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dropped.gz");
        {
            let mut handle = GzHandle::open_path(&path, Mode::Write).unwrap();
            handle.write_all(b"kept").unwrap();
        }
        let mut handle = GzHandle::open_path(&path, Mode::Read).unwrap();
        let mut content = String::new();
        handle.read_to_string(&mut content).unwrap();
        assert_eq!(content, "kept");
    }

    #[test]
    fn opening_an_open_handle_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("twice.gz");
        write_gz(&path, "x");

        let mut handle = GzHandle::open_path(&path, Mode::Read).unwrap();
        assert!(matches!(
            handle.open(&path, Mode::Read),
            Err(IoError::AlreadyOpen)
        ));
        assert!(handle.is_open());
    }

    #[test]
    fn append_mode_fails_before_creating_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("append.gz");
        let error = GzHandle::open_path(&path, Mode::Append).unwrap_err();
        assert!(matches!(error, IoError::AppendToCompressed { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn seeking_moves_forward_and_backward_in_logical_stream() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seek.gz");
        write_gz(&path, "0123456789");

        let mut handle = GzHandle::open_path(&path, Mode::Read).unwrap();
        let mut byte = [0u8; 1];

        assert_eq!(handle.seek_logical(SeekFrom::Start(7)).unwrap(), 7);
        handle.read_exact(&mut byte).unwrap();
        assert_eq!(&byte, b"7");

        assert_eq!(handle.seek_logical(SeekFrom::Start(2)).unwrap(), 2);
        handle.read_exact(&mut byte).unwrap();
        assert_eq!(&byte, b"2");

        assert_eq!(handle.seek_logical(SeekFrom::Current(-3)).unwrap(), 0);
        handle.read_exact(&mut byte).unwrap();
        assert_eq!(&byte, b"0");
    }

    #[test]
    fn seeking_from_end_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("end.gz");
        write_gz(&path, "abc");

        let mut handle = GzHandle::open_path(&path, Mode::Read).unwrap();
        assert!(matches!(
            handle.seek_logical(SeekFrom::End(0)),
            Err(IoError::SeekFromEnd)
        ));
        let error = handle.seek(SeekFrom::End(-1)).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::Unsupported);
    }

    #[test]
    fn seeking_past_the_end_reports_eof() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.gz");
        write_gz(&path, "abc");

        let mut handle = GzHandle::open_path(&path, Mode::Read).unwrap();
        assert!(matches!(
            handle.seek_logical(SeekFrom::Start(10)),
            Err(IoError::UnexpectedEof)
        ));
    }

    #[test]
    fn reading_from_a_writer_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("writer.gz");
        let mut handle = GzHandle::open_path(&path, Mode::Write).unwrap();
        let mut buffer = [0u8; 4];
        assert!(handle.read(&mut buffer).is_err());
    }
}
