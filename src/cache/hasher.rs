//! Key hashing
//!
//! Deterministic, capacity-independent hash functions over raw key bytes.

/// Signature of a hash function the store can be built with.
pub type HashFn = fn(&[u8]) -> u32;

/// Cumulative sum of the key's byte values.
///
/// Anagrams collide; the store's probe sequence is what spreads them out.
pub fn byte_sum_hash(key: &[u8]) -> u32 {
    add_bytes(0, key)
}

fn add_bytes(start: u32, key: &[u8]) -> u32 {
    key.iter()
        .fold(start, |hash, &byte| hash.wrapping_add(u32::from(byte)))
}

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a.
pub fn fnv1a_hash(key: &[u8]) -> u32 {
    key.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_sum_hash() {
        assert_eq!(byte_sum_hash(b""), 0);
        assert_eq!(byte_sum_hash(b"a"), 97);
        // "apple" = 97 + 112 + 112 + 108 + 101
        assert_eq!(byte_sum_hash(b"apple"), 530);
        assert_eq!(byte_sum_hash(b"ab"), byte_sum_hash(b"ba"));
    }

    #[test]
    fn test_byte_sum_hash_wraps() {
        assert_eq!(add_bytes(u32::MAX - 1, b"\x03"), 1);
        assert_eq!(add_bytes(u32::MAX, &[0xff, 0xff]), 509);
    }

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(fnv1a_hash(b""), 0x811c_9dc5);
        assert_eq!(fnv1a_hash(b"a"), 0xe40c_292c);
        assert_ne!(fnv1a_hash(b"ab"), fnv1a_hash(b"ba"));
    }
}
