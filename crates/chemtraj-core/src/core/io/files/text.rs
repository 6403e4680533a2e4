use super::{Compression, FileHandle, IoError, Mode};
use std::fmt;
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
enum TextInner {
    Reader(BufReader<FileHandle>),
    Writer(BufWriter<FileHandle>),
}

/// Line-oriented access to a plain or gzip-compressed text file.
///
/// Positions returned by [`TextFile::tellpos`] are byte offsets in the
/// decompressed content and can be handed back to [`TextFile::seek`].
#[derive(Debug)]
pub struct TextFile {
    path: PathBuf,
    mode: Mode,
    inner: TextInner,
    position: u64,
}

impl TextFile {
    /// Opens `path` for line-oriented access.
    ///
    /// # Arguments
    ///
    /// * `path` - The file to open.
    /// * `mode` - Read, write (truncating) or append.
    /// * `compression` - The compression policy; [`Compression::Default`]
    ///   picks gzip for `.gz` paths.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Open`] if the file can not be opened, or
    /// [`IoError::AppendToCompressed`] when appending to a gzip file.
    pub fn open(path: &Path, mode: Mode, compression: Compression) -> Result<Self, IoError> {
        let handle = FileHandle::open(path, mode, compression)?;
        let inner = match mode {
            Mode::Read => TextInner::Reader(BufReader::new(handle)),
            Mode::Write | Mode::Append => TextInner::Writer(BufWriter::new(handle)),
        };
        Ok(Self {
            path: path.to_path_buf(),
            mode,
            inner,
            position: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn reader(&mut self) -> Result<&mut BufReader<FileHandle>, IoError> {
        match &mut self.inner {
            TextInner::Reader(reader) => Ok(reader),
            TextInner::Writer(_) => Err(IoError::WrongMode {
                path: self.path.display().to_string(),
                operation: "reading",
            }),
        }
    }

    fn writer(&mut self) -> Result<&mut BufWriter<FileHandle>, IoError> {
        match &mut self.inner {
            TextInner::Writer(writer) => Ok(writer),
            TextInner::Reader(_) => Err(IoError::WrongMode {
                path: self.path.display().to_string(),
                operation: "writing",
            }),
        }
    }

    /// Reads the next line, without its `\n` or `\r\n` terminator.
    ///
    /// # Errors
    ///
    /// [`IoError::UnexpectedEof`] if there is nothing left to read.
    pub fn readline(&mut self) -> Result<String, IoError> {
        let mut line = String::new();
        let count = self.reader()?.read_line(&mut line)?;
        if count == 0 {
            return Err(IoError::UnexpectedEof);
        }
        self.position += count as u64;
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    /// Reads exactly `count` lines.
    ///
    /// # Errors
    ///
    /// [`IoError::UnexpectedEof`] if fewer than `count` lines remain. Lines
    /// read before the failure are consumed.
    pub fn readlines(&mut self, count: usize) -> Result<Vec<String>, IoError> {
        (0..count).map(|_| self.readline()).collect()
    }

    /// Returns `true` when no data is left to read.
    pub fn eof(&mut self) -> Result<bool, IoError> {
        match &mut self.inner {
            TextInner::Reader(reader) => Ok(reader.fill_buf()?.is_empty()),
            TextInner::Writer(_) => Ok(true),
        }
    }

    /// Current position in the (decompressed) content.
    pub fn tellpos(&self) -> u64 {
        self.position
    }

    /// Moves to a position previously returned by [`TextFile::tellpos`].
    pub fn seek(&mut self, position: u64) -> Result<(), IoError> {
        let reached = match &mut self.inner {
            TextInner::Reader(reader) => reader.seek(SeekFrom::Start(position)),
            TextInner::Writer(writer) => writer.seek(SeekFrom::Start(position)),
        };
        self.position = reached.map_err(|error| match error.kind() {
            std::io::ErrorKind::UnexpectedEof => IoError::UnexpectedEof,
            _ => IoError::Stream(error),
        })?;
        Ok(())
    }

    /// Goes back to the start of the content.
    pub fn rewind(&mut self) -> Result<(), IoError> {
        self.seek(0)
    }

    /// Writes formatted text, so `write!`/`writeln!` work on a text file.
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<(), IoError> {
        let text = args.to_string();
        self.writer()?.write_all(text.as_bytes())?;
        self.position += text.len() as u64;
        Ok(())
    }

    /// Writes `line` followed by a newline.
    pub fn print(&mut self, line: &str) -> Result<(), IoError> {
        self.write_fmt(format_args!("{line}\n"))
    }

    /// Flushes buffered output and, for gzip files, writes the trailer.
    pub fn finish(&mut self) -> Result<(), IoError> {
        if let TextInner::Writer(writer) = &mut self.inner {
            writer.flush()?;
            writer.get_mut().finish()?;
        }
        Ok(())
    }
}

impl Drop for TextFile {
    fn drop(&mut self) {
        if let TextInner::Writer(writer) = &mut self.inner {
            if let Err(error) = writer.flush() {
                tracing::warn!(path = %self.path.display(), %error, "failed to flush text file");
            }
        }
    }
}
