#![forbid(unsafe_code)]

//! Deterministic lexical normalization (§1 Non-goals: no embeddings/ML).

use sha2::{Digest, Sha256};

/// Trim, collapse runs of whitespace to a single space, lowercase.
pub fn normalize(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut last_was_space = true; // suppresses leading whitespace
    for ch in content.trim().chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.extend(ch.to_lowercase());
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// `hash = section "::" normalize(content)`, per §3 Bullet.
pub fn bullet_hash(section: &str, content: &str) -> String {
    format!("{section}::{}", normalize(content))
}

/// SHA-256 hex digest of the bullet hash, used for the playbook's
/// provenance-comment integrity field (see SPEC_FULL.md's "Hashing" note).
pub fn bullet_hash_digest(section: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bullet_hash(section, content).as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}
