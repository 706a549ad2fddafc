//! Octal field and checksum soundness over randomized inputs.

use proptest::prelude::*;

use ustar_rs::header::{decode_octal, encode_octal, TarHeader, BLOCK_LEN};

/// Largest value an 11-digit octal field (12 bytes with NUL) can carry.
const MAX_12: u64 = 0o77777777777;
/// Largest value a 7-digit octal field (8 bytes with NUL) can carry.
const MAX_8: u64 = 0o7777777;

fn sample_header(name: &str, size: u64, mtime: u64, mode: u32) -> TarHeader {
    let mut hdr = TarHeader::new();
    hdr.set_name(name.as_bytes());
    hdr.set_mode(mode);
    hdr.set_uid(1000);
    hdr.set_gid(1000);
    hdr.set_size(size);
    hdr.set_mtime(mtime);
    hdr.set_typeflag(b'0');
    hdr
}

proptest! {
    #[test]
    fn octal_roundtrip_size_field(n in 0u64..=MAX_12) {
        let mut field = [0u8; 12];
        encode_octal(n, &mut field);
        prop_assert_eq!(decode_octal(&field), n);
        prop_assert_eq!(field[11], 0);
    }

    #[test]
    fn octal_roundtrip_mode_field(n in 0u64..=MAX_8) {
        let mut field = [0u8; 8];
        encode_octal(n, &mut field);
        prop_assert_eq!(decode_octal(&field), n);
    }

    #[test]
    fn applied_checksum_always_validates(
        name in "[a-zA-Z0-9/_.-]{1,40}",
        size in 0u64..=MAX_12,
        mtime in 0u64..=u32::MAX as u64,
        mode in 0u32..0o10000u32,
    ) {
        let mut hdr = sample_header(&name, size, mtime, mode);
        hdr.apply_checksum();
        prop_assert!(hdr.validate());

        // Validation survives a trip through the wire representation.
        let back = TarHeader::decode(&hdr.encode());
        prop_assert!(back.validate());
        prop_assert_eq!(back.size(), size);
        prop_assert_eq!(back.mtime(), mtime);
        prop_assert_eq!(back.name(), name.as_bytes());
    }

    #[test]
    fn any_byte_flip_fails_validation(
        at in 0usize..BLOCK_LEN,
        xor in 1u8..=255u8,
        size in 0u64..=MAX_12,
    ) {
        let mut hdr = sample_header("flip/victim.bin", size, 1_700_000_000, 0o644);
        hdr.apply_checksum();

        let mut block = hdr.encode();
        block[at] ^= xor;
        prop_assert!(!TarHeader::decode(&block).validate());
    }
}
