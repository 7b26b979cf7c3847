//! Hashlist persistence, §6. Serialized as MessagePack via `rmp-serde` — binary, unlike
//! the original implementation's text-mode write that the Resolved Open Questions in
//! SPEC_FULL.md §9 call out as a bug.

use crate::error::TransportError;
use crate::hash::{FullHash, HASH_LEN};
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use std::path::Path;

/// Hashes are concatenated into one flat byte string rather than a nested array-of-arrays
/// so MessagePack encodes them as a single bin blob instead of a 32-element-array-per-hash.
#[derive(Serialize, Deserialize)]
struct PersistedHashlist {
    hashes: ByteBuf,
}

pub fn load_hashlist(path: &Path) -> Result<Vec<FullHash>, TransportError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let bytes = std::fs::read(path)?;
    let persisted: PersistedHashlist = rmp_serde::from_slice(&bytes)?;
    Ok(persisted
        .hashes
        .chunks_exact(HASH_LEN)
        .map(|chunk| FullHash::from_raw(chunk.try_into().expect("chunk is HASH_LEN wide")))
        .collect())
}

pub fn save_hashlist(path: &Path, hashes: &[FullHash]) -> Result<(), TransportError> {
    let mut flat = Vec::with_capacity(hashes.len() * HASH_LEN);
    for hash in hashes {
        flat.extend_from_slice(&hash.to_bytes());
    }
    let persisted = PersistedHashlist { hashes: ByteBuf::from(flat) };
    let bytes = rmp_serde::to_vec(&persisted)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hashlist.msgpack");
        let hashes = vec![FullHash::from_data(b"one"), FullHash::from_data(b"two")];

        save_hashlist(&path, &hashes).unwrap();
        let loaded = load_hashlist(&path).unwrap();

        assert_eq!(loaded, hashes);
    }

    #[test]
    fn missing_file_yields_an_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.msgpack");
        assert!(load_hashlist(&path).unwrap().is_empty());
    }
}
