//! Client hash/info fingerprint sent on login, grounded on
//! `objects/client.py::ClientHash`/`ClientInfo`.
//!
//! Host fingerprinting internals (reading the actual network adapter
//! table, disk serials, etc.) are an excluded collaborator — this module
//! only knows how to fold an already-opaque adapter string into the
//! wire-format fingerprint.

use md5::{Digest, Md5};

fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// On Linux/macOS the reference client reports the literal
/// `"runningunderwine"` instead of real adapter MACs.
pub fn wine_adapter_string() -> &'static str {
    "runningunderwine"
}

/// Builds the adapter string from a list of MAC addresses the way the
/// reference client does on Windows: strip hyphens, join with `.`, with
/// an empty slot spliced in at index 3.
pub fn adapter_string_from_macs(macs: &[String]) -> String {
    let mut adapters: Vec<String> = macs
        .iter()
        .filter(|mac| mac.matches('-').count() == 5)
        .map(|mac| mac.replace('-', ""))
        .collect();
    adapters.insert(3.min(adapters.len()), String::new());
    adapters.join(".")
}

/// The `{hash}:{adapter_string}:{adapter_hash}:{uninstall_id}:{disk_signature}:`
/// fingerprint string sent in the login request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHash {
    pub executable_hash: String,
    pub adapter_string: String,
}

impl ClientHash {
    pub fn new(executable_hash: impl Into<String>, adapter_string: impl Into<String>) -> Self {
        Self {
            executable_hash: executable_hash.into(),
            adapter_string: adapter_string.into(),
        }
    }

    pub fn adapter_hash(&self) -> String {
        md5_hex(self.adapter_string.as_bytes())
    }

    /// The original leaves these as `TODO: unknown` MD5s of the literal
    /// string `unknown` — unimplementable without real disk/install
    /// introspection, so this client reproduces the same placeholder.
    pub fn uninstall_id(&self) -> String {
        md5_hex(b"unknown")
    }

    pub fn disk_signature(&self) -> String {
        md5_hex(b"unknown")
    }
}

impl std::fmt::Display for ClientHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}:",
            self.executable_hash,
            self.adapter_string,
            self.adapter_hash(),
            self.uninstall_id(),
            self.disk_signature(),
        )
    }
}

/// The `osu-version` login line, sent as the third newline-delimited
/// field of the login request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub version: String,
    pub utc_offset: i32,
    pub display_city: bool,
    pub hash: ClientHash,
    pub friendonly_dms: bool,
}

impl ClientInfo {
    pub fn new(version: impl Into<String>, hash: ClientHash, utc_offset: i32) -> Self {
        Self {
            version: version.into(),
            utc_offset,
            display_city: false,
            hash,
            friendonly_dms: false,
        }
    }
}

impl std::fmt::Display for ClientInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}",
            self.version,
            self.utc_offset,
            i32::from(self.display_city),
            self.hash,
            i32::from(self.friendonly_dms),
        )
    }
}

pub fn password_md5(password: &str) -> String {
    md5_hex(password.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_string_splices_empty_slot_at_index_3() {
        let macs = vec![
            "AA-BB-CC-DD-EE-01".to_string(),
            "AA-BB-CC-DD-EE-02".to_string(),
            "AA-BB-CC-DD-EE-03".to_string(),
        ];
        let s = adapter_string_from_macs(&macs);
        assert_eq!(s, "AABBCCDDEE01.AABBCCDDEE02.AABBCCDDEE03.");
    }

    #[test]
    fn client_info_display_matches_pipe_format() {
        let hash = ClientHash::new("deadbeef", wine_adapter_string());
        let info = ClientInfo::new("b20220829", hash, 2);
        let rendered = info.to_string();
        assert!(rendered.starts_with("b20220829|2|0|deadbeef:runningunderwine:"));
        assert!(rendered.ends_with("|0"));
    }

    #[test]
    fn password_hash_is_md5_hex() {
        assert_eq!(password_md5("").len(), 32);
    }
}
