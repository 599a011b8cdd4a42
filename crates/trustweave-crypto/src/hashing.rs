use trustweave_core::Hash;

/// Hash arbitrary data using BLAKE3.
pub fn hash(data: &[u8]) -> Hash {
    Hash::new(*blake3::hash(data).as_bytes())
}

/// Hash a UTF-8 label, e.g. to build a relationship hash from a description.
pub fn hash_text(text: &str) -> Hash {
    hash(text.as_bytes())
}
