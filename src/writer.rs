//! Filesystem walk serializing paths into archive entries.
//!
//! # Invariants
//! - Candidate paths are classified with `lstat`; symlinks are archived as
//!   links, never followed.
//! - A regular entry's payload is written in 512-byte blocks with the final
//!   block zero-padded; symlinks and directories carry no data blocks.
//! - The archive ends with exactly two zero blocks.
//!
//! # Design Notes
//! - The self-inclusion guard compares device+inode so the archive under
//!   construction is never swallowed into itself.
//! - Names that do not fit the 100-byte field are skipped with a warning;
//!   there is no long-name extension.

use std::fs::{self, File, Metadata};
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use crate::entry::{TYPEFLAG_DIRECTORY, TYPEFLAG_REGULAR, TYPEFLAG_SYMLINK};
use crate::header::{TarHeader, BLOCK_LEN};
use crate::outcome::{ScanStats, Warning};
use crate::util::{group_name, read_full, user_name};

/// Device+inode pair identifying the archive being written.
pub type FileId = (u64, u64);

const NAME_FIELD_LEN: usize = 100;

/// Serializes filesystem paths into an archive stream.
pub struct ArchiveWriter<'a, W: Write> {
    out: &'a mut W,
    archive_id: Option<FileId>,
    stats: ScanStats,
}

impl<'a, W: Write> ArchiveWriter<'a, W> {
    /// `archive_id` is the destination's device+inode when observable; the
    /// self-inclusion guard is skipped when it is not.
    pub fn new(out: &'a mut W, archive_id: Option<FileId>) -> Self {
        Self {
            out,
            archive_id,
            stats: ScanStats::new(),
        }
    }

    /// Serialize every input path, then write the end-of-archive marker.
    pub fn create(mut self, paths: &[PathBuf]) -> io::Result<ScanStats> {
        for path in paths {
            self.append_path(path)?;
        }
        self.out.write_all(&[0u8; 2 * BLOCK_LEN])?;
        Ok(self.stats)
    }

    fn append_path(&mut self, path: &Path) -> io::Result<()> {
        let meta = fs::symlink_metadata(path)?;

        if Some((meta.dev(), meta.ino())) == self.archive_id {
            eprintln!(
                "ustar: {}: is the archive being written, skipping",
                path.display()
            );
            self.stats.note(Warning::SelfInclusion);
            return Ok(());
        }

        let name = path.as_os_str().as_bytes();
        if name.len() > NAME_FIELD_LEN {
            eprintln!(
                "ustar: {}: name longer than {} bytes, skipping",
                path.display(),
                NAME_FIELD_LEN
            );
            self.stats.note(Warning::NameTooLong);
            return Ok(());
        }

        let mut header = TarHeader::new();
        header.set_name(name);
        header.set_mode(meta.mode() & 0o7777);
        header.set_uid(meta.uid());
        header.set_gid(meta.gid());
        header.set_mtime(meta.mtime().max(0) as u64);
        header.set_uname(user_name(meta.uid()).as_bytes());
        header.set_gname(group_name(meta.gid()).as_bytes());

        let file_type = meta.file_type();
        if file_type.is_file() {
            self.append_regular(path, &meta, header)
        } else if file_type.is_symlink() {
            self.append_symlink(path, header)
        } else if file_type.is_dir() {
            self.append_directory(path, header)
        } else {
            eprintln!(
                "ustar: {}: unsupported file type, skipping",
                path.display()
            );
            self.stats.note(Warning::UnsupportedType);
            Ok(())
        }
    }

    fn append_regular(
        &mut self,
        path: &Path,
        meta: &Metadata,
        mut header: TarHeader,
    ) -> io::Result<()> {
        header.set_size(meta.size());
        header.set_typeflag(TYPEFLAG_REGULAR);
        header.apply_checksum();
        self.out.write_all(&header.encode())?;

        let mut file = File::open(path)?;
        loop {
            // A fresh zeroed block per read gives the final short chunk its
            // padding for free.
            let mut block = [0u8; BLOCK_LEN];
            let n = read_full(&mut file, &mut block)?;
            if n == 0 {
                break;
            }
            self.out.write_all(&block)?;
        }
        self.stats.entries += 1;
        Ok(())
    }

    fn append_symlink(&mut self, path: &Path, mut header: TarHeader) -> io::Result<()> {
        let target = fs::read_link(path)?;
        header.set_linkname(target.as_os_str().as_bytes());
        header.set_size(0);
        header.set_typeflag(TYPEFLAG_SYMLINK);
        header.apply_checksum();
        self.out.write_all(&header.encode())?;
        self.stats.entries += 1;
        Ok(())
    }

    fn append_directory(&mut self, path: &Path, mut header: TarHeader) -> io::Result<()> {
        header.set_size(0);
        header.set_typeflag(TYPEFLAG_DIRECTORY);
        header.apply_checksum();
        self.out.write_all(&header.encode())?;
        self.stats.entries += 1;

        // `join` drops any trailing slash on the directory's own name.
        for child in fs::read_dir(path)? {
            let child = child?;
            self.append_path(&path.join(child.file_name()))?;
        }
        Ok(())
    }
}
