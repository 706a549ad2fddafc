//! Gzip staging bridge between a plain archive stream and a compressed file.
//!
//! # Invariants
//! - Streaming is done in fixed 16 KiB chunks; memory use is independent of
//!   archive size.
//! - Both directions rewind the plain stream to offset 0 before and after,
//!   so the caller always receives a cursor at the start of the archive.
//!
//! # Design Notes
//! - The reader/writer never see compression; the archive handle is the only
//!   caller of this module.
//! - `MultiGzDecoder` treats concatenated gzip members as a single stream.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// gzip magic bytes (RFC 1952).
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Chunk size for both compression directions.
pub const CHUNK_LEN: usize = 16 * 1024;

#[inline]
pub fn is_gzip_magic(header: &[u8]) -> bool {
    header.len() >= 2 && header[0] == GZIP_MAGIC[0] && header[1] == GZIP_MAGIC[1]
}

/// Compress every byte of `plain` into a newly created gzip file at `path`.
///
/// `plain` is rewound to 0 before reading and again after, and is left open.
pub fn compress(plain: &mut File, path: &Path) -> io::Result<()> {
    plain.seek(SeekFrom::Start(0))?;

    let out = File::create(path)?;
    let mut encoder = GzEncoder::new(out, Compression::default());

    let mut buf = [0u8; CHUNK_LEN];
    loop {
        let n = plain.read(&mut buf)?;
        if n == 0 {
            break;
        }
        encoder.write_all(&buf[..n])?;
    }
    encoder.finish()?;

    plain.seek(SeekFrom::Start(0))?;
    Ok(())
}

/// Inflate the gzip file at `path` into `plain`.
///
/// `plain` is rewound to 0 before writing and again after, and is left open.
pub fn decompress(path: &Path, plain: &mut File) -> io::Result<()> {
    plain.seek(SeekFrom::Start(0))?;

    let mut source = File::open(path)?;
    let mut magic = [0u8; 2];
    let got = crate::util::read_full(&mut source, &mut magic)?;
    if got < 2 || !is_gzip_magic(&magic) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: not a gzip archive", path.display()),
        ));
    }
    source.seek(SeekFrom::Start(0))?;

    let mut decoder = MultiGzDecoder::new(source);
    let mut buf = [0u8; CHUNK_LEN];
    loop {
        let n = decoder.read(&mut buf)?;
        if n == 0 {
            break;
        }
        plain.write_all(&buf[..n])?;
    }

    plain.seek(SeekFrom::Start(0))?;
    Ok(())
}
