//! Fingerprints over the server-confirmed state of a node list

use crate::tree::node::FileNode;

/// Fingerprint: blake3 digest of a synced file set
pub type Fingerprint = [u8; 32];

/// Digest over the last-synced `(path, content)` of every file
///
/// Local edits, pending creates, and folders do not contribute, so two
/// lists loaded from the same server state hash identically.
pub fn synced_fingerprint(nodes: &[FileNode]) -> Fingerprint {
    let mut entries: Vec<(&str, &str)> = nodes
        .iter()
        .filter(|n| n.is_file())
        .filter_map(|n| {
            n.initial_path
                .as_deref()
                .map(|path| (path, n.initial_content.as_str()))
        })
        .collect();
    entries.sort();

    let mut hasher = blake3::Hasher::new();
    for (path, content) in entries {
        hasher.update(&(path.len() as u64).to_le_bytes());
        hasher.update(path.as_bytes());
        hasher.update(&(content.len() as u64).to_le_bytes());
        hasher.update(content.as_bytes());
    }
    *hasher.finalize().as_bytes()
}

/// Short hex form for display
pub fn short_hex(fingerprint: &Fingerprint) -> String {
    hex::encode(&fingerprint[..4])
}
