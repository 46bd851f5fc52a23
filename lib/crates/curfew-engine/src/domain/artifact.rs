//! Rendered, backend-specific enforcement output.

use std::path::PathBuf;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// A whole file the backend owns and replaces atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileArtifact {
    pub path: PathBuf,
    pub content: String,
}

/// One firewall rule, identified by its comment tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallRule {
    /// Tag written as the rule comment; used to read the live ruleset back.
    pub comment: String,
    /// nft match/verdict expression, without the comment.
    pub expression: String,
}

/// Backend-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactBody {
    /// Files written verbatim (proxy ACL + config, PAC file).
    Files { files: Vec<FileArtifact> },
    /// Lines of the managed block inside a shared hosts file. Empty means
    /// the block is removed.
    HostsBlock { path: PathBuf, lines: Vec<String> },
    /// Full replacement ruleset for a dedicated firewall table.
    Ruleset {
        table: String,
        script_path: PathBuf,
        script: String,
        rules: Vec<FirewallRule>,
    },
}

/// What a backend renders for one policy revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcementArtifact {
    pub backend: String,
    pub revision: u64,
    pub body: ArtifactBody,
}

impl EnforcementArtifact {
    /// SHA-256 of the body. The revision is deliberately left out so that the
    /// same enforcement state at two revisions compares equal.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        // Serializing plain strings, paths and vectors cannot fail.
        let encoded = serde_json::to_vec(&self.body).unwrap_or_default();
        hasher.update(&encoded);
        hex_encode(&hasher.finalize())
    }
}

/// Lowercase hex encoding.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
