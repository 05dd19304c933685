use sha2::{Digest, Sha256};

/// Stable content fingerprint used to key summaries by text rather than by document.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
