//! USTAR archiver CLI.
//!
//! Exactly one of `-l`, `-e`, `-c` selects the operation; `-d` changes the
//! working directory for the duration of the operation (the archive path is
//! resolved before the change, and a compressed archive is written after it
//! is restored); `-z` stages the archive through gzip; `-v` enables the long
//! listing / per-entry extraction trace.
//!
//! # Exit Codes
//!
//! - `0`: success
//! - `1`: fatal I/O or archive error
//! - `2`: usage or configuration error

use std::env;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::PathBuf;
use std::process;

use ustar_rs::{
    extract_archive, list_archive, ArchiveHandle, ArchiveMode, ArchiveOptions, ArchiveWriter,
    Operation,
};

fn print_usage(exe: &OsStr) {
    println!(
        "usage: {} {{-l|-e|-c}} ARCHIVE [-d DIR] [-zvh] [FILES...]

OPTIONS:
    -l, --list ARCHIVE      List the entries of ARCHIVE
    -e, --extract ARCHIVE   Extract the entries of ARCHIVE
    -c, --create ARCHIVE    Create ARCHIVE from FILES
    -d, --directory DIR     Change to DIR before the operation, restore after
    -z, --compress          Treat the archive as gzip-compressed
    -v, --verbose           Long listing / per-entry extraction trace
    -h, --help              Show this help message

    FILES: paths to add to the archive (create only)",
        exe.to_string_lossy()
    );
}

fn usage_error(exe: &OsStr, msg: &str) -> ! {
    eprintln!("ustar: {msg}");
    eprintln!(
        "Try '{} -h' or '{} --help' for more information.",
        exe.to_string_lossy(),
        exe.to_string_lossy()
    );
    process::exit(2);
}

fn main() {
    let mut args = env::args_os();
    let exe = args.next().unwrap_or_else(|| "ustar".into());

    let mut operation: Option<(Operation, PathBuf)> = None;
    let mut directory: Option<PathBuf> = None;
    let mut compress = false;
    let mut verbose = false;
    let mut paths: Vec<PathBuf> = Vec::new();

    let mut select = |op: Operation, archive: Option<OsString>, exe: &OsStr| {
        if operation.is_some() {
            usage_error(exe, "exactly one of -l, -e, -c must be given");
        }
        let Some(archive) = archive else {
            usage_error(exe, "missing ARCHIVE operand");
        };
        operation = Some((op, PathBuf::from(archive)));
    };

    while let Some(arg) = args.next() {
        if let Some(flag) = arg.to_str() {
            if let Some(value) = flag.strip_prefix("--list=") {
                select(Operation::List, Some(OsString::from(value)), &exe);
                continue;
            }
            if let Some(value) = flag.strip_prefix("--extract=") {
                select(Operation::Extract, Some(OsString::from(value)), &exe);
                continue;
            }
            if let Some(value) = flag.strip_prefix("--create=") {
                select(Operation::Create, Some(OsString::from(value)), &exe);
                continue;
            }
            if let Some(value) = flag.strip_prefix("--directory=") {
                directory = Some(PathBuf::from(value));
                continue;
            }
            match flag {
                "-l" | "--list" => {
                    select(Operation::List, args.next(), &exe);
                    continue;
                }
                "-e" | "--extract" => {
                    select(Operation::Extract, args.next(), &exe);
                    continue;
                }
                "-c" | "--create" => {
                    select(Operation::Create, args.next(), &exe);
                    continue;
                }
                "-d" | "--directory" => {
                    let Some(dir) = args.next() else {
                        usage_error(&exe, "missing DIR operand");
                    };
                    directory = Some(PathBuf::from(dir));
                    continue;
                }
                "-z" | "--compress" => {
                    compress = true;
                    continue;
                }
                "-v" | "--verbose" => {
                    verbose = true;
                    continue;
                }
                "-h" | "--help" => {
                    print_usage(&exe);
                    process::exit(0);
                }
                _ if flag.len() > 1 && flag.starts_with('-') => {
                    usage_error(&exe, &format!("unknown flag: {flag}"));
                }
                _ => {}
            }
        }

        paths.push(PathBuf::from(arg));
    }

    let Some((operation, archive)) = operation else {
        usage_error(&exe, "exactly one of -l, -e, -c must be given");
    };

    let opts = ArchiveOptions {
        operation,
        archive,
        directory,
        compress,
        verbose,
        paths,
    };
    if let Err(err) = opts.validate() {
        usage_error(&exe, &err.to_string());
    }

    if let Err(err) = run(&opts) {
        eprintln!("ustar: {err}");
        process::exit(1);
    }
}

fn run(opts: &ArchiveOptions) -> io::Result<()> {
    let mode = match opts.operation {
        Operation::Create => ArchiveMode::Write,
        Operation::List | Operation::Extract => ArchiveMode::Read,
    };
    // The archive path is resolved against the original working directory.
    let mut handle = ArchiveHandle::open(&opts.archive, mode, opts.compress)?;

    let previous_dir = match &opts.directory {
        Some(dir) => {
            let previous = env::current_dir()?;
            env::set_current_dir(dir)?;
            Some(previous)
        }
        None => None,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let archive_id = handle.archive_id();
    match opts.operation {
        Operation::List => {
            list_archive(handle.stream(), opts.verbose, &mut out)?;
        }
        Operation::Extract => {
            extract_archive(handle.stream(), opts.verbose, &mut out)?;
        }
        Operation::Create => {
            ArchiveWriter::new(handle.stream(), archive_id).create(&opts.paths)?;
        }
    }

    if let Some(previous) = previous_dir {
        env::set_current_dir(previous)?;
    }
    handle.close()
}
