//! Minimal USTAR archiver engine with optional gzip compression.
//!
//! ## Scope
//! This crate lists, extracts, and creates tar-compatible (USTAR) archives:
//! fixed 512-byte header blocks with octal text fields and a byte-sum
//! checksum, data padded to block boundaries, and a two-zero-block
//! end-of-archive marker. Archives can be transparently staged through gzip
//! at the open/close boundary.
//!
//! ## Key invariants
//! - One forward pass per operation; skips are forward seeks, never random
//!   access.
//! - Headers are validated by checksum before an entry is trusted; a
//!   mismatch skips the entry (using its untrusted size for realignment)
//!   and the scan continues.
//! - Recoverable conditions are reported on stderr and counted in
//!   [`ScanStats`]; fatal I/O errors abort the operation with no cleanup of
//!   partial output.
//! - Supported entry kinds are regular files, symlinks, and directories;
//!   everything else is explicitly [`EntryType::Unsupported`].
//!
//! ## Flow
//! [`ArchiveHandle::open`] (optionally inflating through a scratch stream)
//! → [`list_archive`] / [`extract_archive`] / [`ArchiveWriter::create`]
//! → [`ArchiveHandle::close`] (optionally deflating the scratch to the
//! destination).

pub mod config;
pub mod entry;
pub mod gzip;
pub mod handle;
pub mod header;
pub mod outcome;
pub mod reader;
pub mod util;
pub mod writer;

pub use config::{ArchiveOptions, Operation, OptionsError};
pub use entry::EntryType;
pub use handle::{ArchiveHandle, ArchiveMode};
pub use header::{TarHeader, BLOCK_LEN};
pub use outcome::{ScanStats, Warning};
pub use reader::{extract_archive, list_archive};
pub use writer::{ArchiveWriter, FileId};
