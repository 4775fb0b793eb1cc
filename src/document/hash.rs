// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

use serde::Serialize;

use crate::key::Hash;

/// Type constant for scope state hashes.
const TYPE_STATE: u8 = 0x10;

/// Hash the state of one scope.
pub fn hash_state<S: Serialize>(state: &S) -> Result<Hash, serde_json::Error> {
    let bytes = serde_json::to_vec(state)?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[TYPE_STATE]);
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(&bytes);
    return Ok(Hash(*hasher.finalize().as_bytes()));
}
