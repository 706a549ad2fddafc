//! Streaming archive scan shared by list and extract.
//!
//! # Invariants
//! - The archive is processed in a single forward pass; skips are forward
//!   seeks only.
//! - Two consecutive blank blocks end the scan; a lone blank block is
//!   skipped and the counter resets on the next non-blank block.
//! - A checksum mismatch is recoverable: the entry is reported, its data
//!   blocks are skipped using the untrusted size so the cursor stays
//!   aligned, and scanning continues.
//!
//! # Design Notes
//! - Visitors receive the stream positioned at the entry's first data block
//!   and must consume or skip exactly `ceil(size/512)` blocks.
//! - Ownership and mtime recorded in headers are never reapplied to
//!   extracted files.

use std::ffi::OsStr;
use std::fs::{DirBuilder, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{symlink, DirBuilderExt, OpenOptionsExt};
use std::path::Path;

use crate::entry::EntryType;
use crate::header::{is_blank_block, padded_size, TarHeader, BLOCK_LEN};
use crate::outcome::{ScanStats, Warning};
use crate::util::{format_epoch, read_exact_or_eof};

/// Drive the shared scan loop, dispatching each validated entry to `visit`.
fn scan_archive<R, F>(archive: &mut R, stats: &mut ScanStats, mut visit: F) -> io::Result<()>
where
    R: Read + Seek,
    F: FnMut(&mut R, &TarHeader, EntryType, &mut ScanStats) -> io::Result<()>,
{
    let mut block = [0u8; BLOCK_LEN];
    let mut blanks = 0u32;
    loop {
        if !read_exact_or_eof(archive, &mut block)? {
            break;
        }
        if is_blank_block(&block) {
            blanks += 1;
            if blanks >= 2 {
                break;
            }
            continue;
        }
        blanks = 0;

        let header = TarHeader::decode(&block);
        if !header.validate() {
            eprintln!(
                "ustar: {}: invalid header checksum, skipping entry",
                String::from_utf8_lossy(header.name())
            );
            stats.note(Warning::ChecksumMismatch);
            skip_data_blocks(archive, &header)?;
            continue;
        }

        stats.entries += 1;
        let kind = EntryType::from_typeflag(header.typeflag());
        visit(archive, &header, kind, stats)?;
    }
    Ok(())
}

/// Seek past the entry's data blocks, using the (possibly untrusted) size.
fn skip_data_blocks<R: Read + Seek>(archive: &mut R, header: &TarHeader) -> io::Result<()> {
    let len = padded_size(header.size());
    let step = i64::try_from(len).unwrap_or(i64::MAX);
    archive.seek(SeekFrom::Current(step))?;
    Ok(())
}

/// Read one data block; EOF inside entry data is fatal.
fn read_data_block<R: Read>(archive: &mut R, block: &mut [u8; BLOCK_LEN]) -> io::Result<()> {
    if !read_exact_or_eof(archive, block)? {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "archive ended inside entry data",
        ));
    }
    Ok(())
}

/// List the archive's entries to `out`.
pub fn list_archive<R, W>(archive: &mut R, verbose: bool, out: &mut W) -> io::Result<ScanStats>
where
    R: Read + Seek,
    W: Write,
{
    let mut stats = ScanStats::new();
    scan_archive(archive, &mut stats, |archive, header, kind, _stats| {
        write_listing_line(header, kind, verbose, out)?;
        skip_data_blocks(archive, header)
    })?;
    Ok(stats)
}

/// One listing line: every valid entry is listed, whatever its type; that is
/// what the `h`/`c`/`b`/`p` type characters are for.
fn write_listing_line<W: Write>(
    header: &TarHeader,
    kind: EntryType,
    verbose: bool,
    out: &mut W,
) -> io::Result<()> {
    let name = String::from_utf8_lossy(header.name());
    if !verbose {
        return writeln!(out, "{name}");
    }
    let line = format!(
        "{} {}/{} {:>7} {} {}",
        mode_string(header.typeflag(), header.mode()),
        String::from_utf8_lossy(header.uname()),
        String::from_utf8_lossy(header.gname()),
        header.size(),
        format_epoch(header.mtime()),
        name,
    );
    if kind == EntryType::Symlink {
        writeln!(
            out,
            "{line} -> {}",
            String::from_utf8_lossy(header.linkname())
        )
    } else {
        writeln!(out, "{line}")
    }
}

/// `ls -l` style 10-character mode string keyed by typeflag and mode bits.
fn mode_string(typeflag: u8, mode: u32) -> String {
    let kind = match typeflag {
        0 | b'0' | b'7' => '-',
        b'1' => 'h',
        b'2' => 'l',
        b'3' => 'c',
        b'4' => 'b',
        b'5' => 'd',
        b'6' => 'p',
        _ => '-',
    };
    let exec = |set_id: bool, x: bool| match (set_id, x) {
        (true, true) => 's',
        (true, false) => 'S',
        (false, true) => 'x',
        (false, false) => '-',
    };
    let mut s = String::with_capacity(10);
    s.push(kind);
    s.push(if mode & 0o400 != 0 { 'r' } else { '-' });
    s.push(if mode & 0o200 != 0 { 'w' } else { '-' });
    s.push(exec(mode & 0o4000 != 0, mode & 0o100 != 0));
    s.push(if mode & 0o040 != 0 { 'r' } else { '-' });
    s.push(if mode & 0o020 != 0 { 'w' } else { '-' });
    s.push(exec(mode & 0o2000 != 0, mode & 0o010 != 0));
    s.push(if mode & 0o004 != 0 { 'r' } else { '-' });
    s.push(if mode & 0o002 != 0 { 'w' } else { '-' });
    s.push(if mode & 0o001 != 0 { 'x' } else { '-' });
    s
}

/// Extract the archive's entries onto the filesystem, relative to the
/// current working directory.
pub fn extract_archive<R, W>(archive: &mut R, verbose: bool, out: &mut W) -> io::Result<ScanStats>
where
    R: Read + Seek,
    W: Write,
{
    let mut stats = ScanStats::new();
    scan_archive(archive, &mut stats, |archive, header, kind, stats| {
        if verbose {
            writeln!(out, "{}", String::from_utf8_lossy(header.name()))?;
        }
        match kind {
            EntryType::Regular => extract_regular(archive, header),
            EntryType::Symlink => {
                extract_symlink(header)?;
                skip_data_blocks(archive, header)
            }
            EntryType::Directory => {
                extract_directory(header)?;
                skip_data_blocks(archive, header)
            }
            EntryType::Unsupported(_) => {
                eprintln!(
                    "ustar: {}: {}, skipping",
                    String::from_utf8_lossy(header.name()),
                    kind
                );
                stats.note(Warning::UnsupportedType);
                skip_data_blocks(archive, header)
            }
        }
    })?;
    Ok(stats)
}

fn entry_path(bytes: &[u8]) -> &Path {
    Path::new(OsStr::from_bytes(bytes))
}

/// Parent directories are created with mode 0755; already-existing
/// directories are tolerated.
fn create_parent_dirs(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            DirBuilder::new().recursive(true).mode(0o755).create(parent)
        }
        _ => Ok(()),
    }
}

/// Copy exactly `size` bytes out of full data blocks; the final block's
/// padding is read from the archive but never written to the file.
fn extract_regular<R: Read>(archive: &mut R, header: &TarHeader) -> io::Result<()> {
    let path = entry_path(header.name());
    create_parent_dirs(path)?;
    let mut dest = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(header.mode())
        .open(path)?;

    let mut remaining = header.size();
    let mut block = [0u8; BLOCK_LEN];
    while remaining > 0 {
        read_data_block(archive, &mut block)?;
        let take = remaining.min(BLOCK_LEN as u64) as usize;
        dest.write_all(&block[..take])?;
        remaining -= take as u64;
    }
    Ok(())
}

fn extract_symlink(header: &TarHeader) -> io::Result<()> {
    symlink(entry_path(header.linkname()), entry_path(header.name()))
}

fn extract_directory(header: &TarHeader) -> io::Result<()> {
    DirBuilder::new()
        .recursive(true)
        .mode(header.mode())
        .create(entry_path(header.name()))
}
