//! `known_hosts` parsing and host key verification.

use std::path::Path;

use russh::keys::key::PublicKey;
use tracing::{debug, trace, warn};

/// Outcome of checking a server key against `known_hosts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKeyStatus {
    /// Key matches the recorded entry
    Verified,
    /// No entry for the host
    Unknown,
    /// An entry exists with a different key
    Mismatch,
}

/// One `known_hosts` line.
#[derive(Debug, Clone)]
struct KnownHostEntry {
    patterns: Vec<String>,
    key: PublicKey,
}

/// The parsed contents of a `known_hosts` file.
#[derive(Debug, Clone, Default)]
pub struct KnownHosts {
    entries: Vec<KnownHostEntry>,
}

impl KnownHosts {
    /// Loads `<home>/.ssh/known_hosts`. A missing or unreadable file yields
    /// an empty set.
    pub fn load_from_home(home: &Path) -> Self {
        Self::load(&home.join(".ssh").join("known_hosts"))
    }

    /// Loads a `known_hosts` file.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let hosts = Self::parse(&content);
                debug!(path = %path.display(), entries = hosts.len(), "Loaded known_hosts");
                hosts
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No usable known_hosts file");
                Self::default()
            }
        }
    }

    /// Parses `known_hosts` text, skipping lines it cannot use.
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(parse_line)
            .collect();
        Self { entries }
    }

    /// Number of usable entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no usable entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks `server_key` for `host`:`port`.
    pub fn verify(&self, host: &str, port: u16, server_key: &PublicKey) -> HostKeyStatus {
        for entry in &self.entries {
            if entry
                .patterns
                .iter()
                .any(|pattern| pattern_matches(pattern, host, port))
            {
                if entry.key.fingerprint() == server_key.fingerprint() {
                    return HostKeyStatus::Verified;
                }
                warn!(host = %host, "Host key differs from known_hosts entry");
                return HostKeyStatus::Mismatch;
            }
        }
        HostKeyStatus::Unknown
    }
}

/// `hostname[,hostname...] keytype base64key [comment]`
fn parse_line(line: &str) -> Option<KnownHostEntry> {
    let mut parts = line.split_whitespace();
    let hosts = parts.next()?;
    let key_type = parts.next()?;
    let key_data = parts.next()?;

    // Hashed and marker lines are not supported.
    if hosts.starts_with('|') || hosts.starts_with('@') {
        return None;
    }

    let key_bytes =
        base64::Engine::decode(&base64::engine::general_purpose::STANDARD, key_data).ok()?;
    let key = match russh::keys::key::parse_public_key(&key_bytes, None) {
        Ok(key) => key,
        Err(_) => {
            trace!(key_type = %key_type, "Skipping unparseable known_hosts key");
            return None;
        }
    };

    Some(KnownHostEntry {
        patterns: hosts.split(',').map(str::to_string).collect(),
        key,
    })
}

/// Matches a `known_hosts` host pattern: `host`, `[host]:port`, or a glob.
pub(crate) fn pattern_matches(pattern: &str, host: &str, port: u16) -> bool {
    if let Some(rest) = pattern.strip_prefix('[') {
        if let Some((pattern_host, tail)) = rest.split_once(']') {
            let pattern_port = tail
                .strip_prefix(':')
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(22);
            return pattern_host == host && pattern_port == port;
        }
    }

    if port != 22 {
        return false;
    }

    if pattern.contains('*') || pattern.contains('?') {
        return wildcard_match(pattern, host);
    }

    pattern == host
}

fn wildcard_match(pattern: &str, text: &str) -> bool {
    let mut pattern_chars = pattern.chars();
    let mut text_chars = text.chars();

    while let Some(pc) = pattern_chars.next() {
        match pc {
            '*' => {
                let rest_pattern = pattern_chars.as_str();
                if rest_pattern.is_empty() {
                    return true;
                }
                let rest_text = text_chars.as_str();
                return rest_text
                    .char_indices()
                    .map(|(i, _)| i)
                    .chain(std::iter::once(rest_text.len()))
                    .any(|i| wildcard_match(rest_pattern, &rest_text[i..]));
            }
            '?' => {
                if text_chars.next().is_none() {
                    return false;
                }
            }
            c => {
                if text_chars.next() != Some(c) {
                    return false;
                }
            }
        }
    }

    text_chars.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_bracketed_patterns() {
        assert!(pattern_matches("mon1", "mon1", 22));
        assert!(!pattern_matches("mon1", "mon1", 2222));
        assert!(pattern_matches("[mon1]:2222", "mon1", 2222));
        assert!(!pattern_matches("[mon1]:2222", "mon1", 22));
    }

    #[test]
    fn test_wildcards() {
        assert!(pattern_matches("osd*", "osd12", 22));
        assert!(pattern_matches("osd?", "osd1", 22));
        assert!(!pattern_matches("osd?", "osd12", 22));
        assert!(pattern_matches("*.ceph.local", "mon1.ceph.local", 22));
        assert!(!pattern_matches("*.ceph.local", "mon1.example.com", 22));
    }

    #[test]
    fn test_unusable_lines_are_skipped() {
        let hosts = KnownHosts::parse(
            "# comment\n\
             \n\
             mon1 ssh-ed25519 not-base64!!\n\
             |1|hashed|entry ssh-ed25519 AAAA\n\
             short line\n",
        );
        assert!(hosts.is_empty());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let hosts = KnownHosts::load_from_home(Path::new("/nonexistent/copilot-home"));
        assert_eq!(hosts.len(), 0);
    }
}
