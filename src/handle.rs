//! Archive handle lifecycle: `CLOSED → OPEN → CLOSED`.
//!
//! # Invariants
//! - One handle per invocation; the handle owns the stream the reader or
//!   writer drives.
//! - Compression is invisible to the reader/writer: compressed archives are
//!   staged through an anonymous scratch file at open (read side) or close
//!   (write side).
//! - The scratch file is unlinked from birth; nothing is left on disk after
//!   the process exits, on any path.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use crate::gzip;
use crate::writer::FileId;

/// Whether the operation reads or writes the archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveMode {
    Read,
    Write,
}

/// An open archive stream, optionally staged through gzip.
pub struct ArchiveHandle {
    file: File,
    /// Set in compressed write mode: the scratch is re-compressed to this
    /// path at close.
    destination: Option<PathBuf>,
    archive_id: Option<FileId>,
}

impl ArchiveHandle {
    pub fn open(path: &Path, mode: ArchiveMode, compress: bool) -> io::Result<Self> {
        match (mode, compress) {
            (ArchiveMode::Read, true) => {
                let mut scratch = tempfile::tempfile()?;
                gzip::decompress(path, &mut scratch)?;
                Ok(Self {
                    file: scratch,
                    destination: None,
                    archive_id: None,
                })
            }
            (ArchiveMode::Read, false) => Ok(Self {
                file: File::open(path)?,
                destination: None,
                archive_id: None,
            }),
            (ArchiveMode::Write, true) => {
                // The destination is only written at close; its identity is
                // observable now only when the file already exists.
                let archive_id = std::fs::metadata(path).ok().map(|m| (m.dev(), m.ino()));
                Ok(Self {
                    file: tempfile::tempfile()?,
                    destination: Some(path.to_path_buf()),
                    archive_id,
                })
            }
            (ArchiveMode::Write, false) => {
                let file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)?;
                let meta = file.metadata()?;
                Ok(Self {
                    file,
                    destination: None,
                    archive_id: Some((meta.dev(), meta.ino())),
                })
            }
        }
    }

    /// The stream the reader or writer drives.
    pub fn stream(&mut self) -> &mut File {
        &mut self.file
    }

    /// Device+inode of the destination archive, for the self-inclusion
    /// guard, when it could be observed at open time.
    pub fn archive_id(&self) -> Option<FileId> {
        self.archive_id
    }

    /// Finish the lifecycle. In compressed write mode this is where the
    /// destination file is produced; any failure here is fatal.
    pub fn close(mut self) -> io::Result<()> {
        if let Some(destination) = self.destination.take() {
            gzip::compress(&mut self.file, &destination)?;
        }
        Ok(())
    }
}
