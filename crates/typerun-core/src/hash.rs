//! Stable 64-bit content hashing.
//!
//! Storage entries in a compiled image carry a 64-bit hash of their text so
//! the VM can deduplicate identical entries at load time. The hash must be a
//! deterministic function of the bytes alone — no per-process seeding — and
//! identical on both sides of the image boundary, so we pin FNV-1a 64 here
//! rather than going through `std::hash`.
//!
//! NOTE: FNV-1a is not cryptographically secure. It is used strictly as a
//! collision-resistant-enough identity for storage texts.

/// 64-bit FNV-1a offset basis.
pub const FNV1A_OFFSET_BASIS_64: u64 = 0xcbf2_9ce4_8422_2325;
/// 64-bit FNV-1a prime.
pub const FNV1A_PRIME_64: u64 = 0x0000_0100_0000_01b3;

/// Mix bytes into an existing FNV-1a 64 state.
#[inline]
pub const fn fnv1a64_mix(mut hash: u64, bytes: &[u8]) -> u64 {
    let mut i = 0usize;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV1A_PRIME_64);
        i += 1;
    }
    hash
}

/// Hash a byte slice with FNV-1a 64.
#[inline]
pub const fn fnv1a64(bytes: &[u8]) -> u64 {
    fnv1a64_mix(FNV1A_OFFSET_BASIS_64, bytes)
}

/// Content hash of a storage text, as written into the image and checked by
/// the VM's load-time deduplication.
#[inline]
pub const fn content_hash(text: &str) -> u64 {
    fnv1a64(text.as_bytes())
}
