//! Patching and restoring `ansible.cfg` around a copilot session.
//!
//! Deprecation warnings printed by the engine land on the terminal and
//! corrupt the live display, so they are switched off in the ceph-ansible
//! `ansible.cfg` for the duration of a session. The original file is kept
//! next to it with a `_bak` suffix and put back afterwards.
//!
//! The file is edited line by line: untouched lines, comments and ordering
//! survive the patch.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default ceph-ansible installation directory.
pub const DEFAULT_CEPH_ANSIBLE_DIR: &str = "/usr/share/ceph-ansible";

/// Name of the engine configuration file.
pub const ANSIBLE_CFG: &str = "ansible.cfg";

/// Suffix appended to the file name of the backup copy.
pub const BACKUP_SUFFIX: &str = "_bak";

/// Settings the copilot needs: (section, key, value).
const CFG_CHANGES: &[(&str, &str, &str)] = &[("defaults", "deprecation_warnings", "False")];

// ============================================================================
// INI document
// ============================================================================

/// A minimal `section` / `key = value` document that preserves its layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    lines: Vec<String>,
}

/// What a single line of an INI document holds.
enum IniLine<'a> {
    Section(&'a str),
    Entry { key: &'a str, value: &'a str },
    Other,
}

fn classify(line: &str) -> IniLine<'_> {
    let trimmed = line.trim();

    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
        return IniLine::Other;
    }

    // Anything after the closing bracket, such as an inline comment, is
    // ignored.
    if let Some(header) = trimmed.strip_prefix('[') {
        if let Some(end) = header.find(']') {
            return IniLine::Section(header[..end].trim());
        }
    }

    // Continuation lines belong to the previous value.
    if line.starts_with(char::is_whitespace) {
        return IniLine::Other;
    }

    let split = match (trimmed.find('='), trimmed.find(':')) {
        (Some(eq), Some(colon)) => Some(eq.min(colon)),
        (eq, colon) => eq.or(colon),
    };

    match split {
        Some(pos) => IniLine::Entry {
            key: trimmed[..pos].trim(),
            value: trimmed[pos + 1..].trim(),
        },
        None => IniLine::Other,
    }
}

impl IniDocument {
    /// Parses document text.
    pub fn parse(content: &str) -> Self {
        Self {
            lines: content.lines().map(str::to_string).collect(),
        }
    }

    /// Returns the value of `key` in `section`. Keys match case-insensitively.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let mut current: Option<&str> = None;

        for line in &self.lines {
            match classify(line) {
                IniLine::Section(name) => current = Some(name),
                IniLine::Entry { key: k, value }
                    if current == Some(section) && k.eq_ignore_ascii_case(key) =>
                {
                    return Some(value);
                }
                _ => {}
            }
        }

        None
    }

    /// Whether the document has a `[section]` header.
    pub fn has_section(&self, section: &str) -> bool {
        self.lines
            .iter()
            .any(|line| matches!(classify(line), IniLine::Section(name) if name == section))
    }

    /// Sets `key` in `section`, creating either as needed.
    ///
    /// Returns `true` if the document changed.
    pub fn set(&mut self, section: &str, key: &str, value: &str) -> bool {
        if self.get(section, key) == Some(value) {
            return false;
        }

        let entry = format!("{key} = {value}");
        let mut current: Option<&str> = None;
        let mut existing: Option<usize> = None;
        let mut section_end: Option<usize> = None;

        for (idx, line) in self.lines.iter().enumerate() {
            match classify(line) {
                IniLine::Section(name) => current = Some(name),
                IniLine::Entry { key: k, .. }
                    if current == Some(section) && k.eq_ignore_ascii_case(key) =>
                {
                    existing = Some(idx);
                    break;
                }
                _ => {}
            }

            if current == Some(section) && !line.trim().is_empty() {
                section_end = Some(idx);
            }
        }

        if let Some(idx) = existing {
            self.lines[idx] = entry;
            return true;
        }

        match section_end {
            Some(idx) => self.lines.insert(idx + 1, entry),
            None => {
                if self.lines.last().is_some_and(|l| !l.trim().is_empty()) {
                    self.lines.push(String::new());
                }
                self.lines.push(format!("[{section}]"));
                self.lines.push(entry);
            }
        }

        true
    }

    /// Renders the document, newline-terminated.
    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        format!("{}\n", self.lines.join("\n"))
    }
}

// ============================================================================
// ansible.cfg handling
// ============================================================================

/// The `ansible.cfg` of a ceph-ansible checkout and its backup location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsibleCfg {
    path: PathBuf,
    backup: PathBuf,
}

impl AnsibleCfg {
    /// Locates `ansible.cfg` inside `ceph_ansible_dir`.
    pub fn in_dir(ceph_ansible_dir: impl AsRef<Path>) -> Self {
        let path = ceph_ansible_dir.as_ref().join(ANSIBLE_CFG);
        let backup = PathBuf::from(format!("{}{}", path.display(), BACKUP_SUFFIX));
        Self { path, backup }
    }

    /// Path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the backup copy.
    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    /// Applies the copilot's settings, backing the file up first.
    ///
    /// Returns `true` if the file was changed. A file that already carries
    /// the settings is left alone and no backup is made.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Environment`] if the file does not exist.
    pub fn setup(&self) -> Result<bool> {
        if !self.path.exists() {
            return Err(Error::environment(
                &self.path,
                "ansible.cfg is not in the ceph-ansible directory - unable to continue",
            ));
        }

        let content = fs::read_to_string(&self.path)?;
        let mut doc = IniDocument::parse(&content);

        let mut changes_made = false;
        for (section, key, value) in CFG_CHANGES {
            if doc.set(section, key, value) {
                debug!(section = %section, key = %key, value = %value, "Updated ansible.cfg setting");
                changes_made = true;
            }
        }

        if !changes_made {
            debug!(path = %self.path.display(), "ansible.cfg already configured");
            return Ok(false);
        }

        fs::copy(&self.path, &self.backup)?;

        let mut file = File::create(&self.path)?;
        file.write_all(doc.render().as_bytes())?;
        file.sync_all()?;

        info!(
            path = %self.path.display(),
            backup = %self.backup.display(),
            "Patched ansible.cfg"
        );
        Ok(true)
    }

    /// Puts the backup back in place and removes it.
    ///
    /// Returns `true` if a backup was restored; without a backup this is a
    /// no-op.
    pub fn restore(&self) -> Result<bool> {
        if !self.backup.exists() {
            return Ok(false);
        }

        fs::copy(&self.backup, &self.path)?;
        fs::remove_file(&self.backup)?;

        info!(path = %self.path.display(), "Restored ansible.cfg");
        Ok(true)
    }
}

/// Turns off deprecation warnings in `<ceph_ansible_dir>/ansible.cfg`.
///
/// See [`AnsibleCfg::setup`].
pub fn setup_ansible_cfg(ceph_ansible_dir: impl AsRef<Path>) -> Result<bool> {
    AnsibleCfg::in_dir(ceph_ansible_dir).setup()
}

/// Restores `<ceph_ansible_dir>/ansible.cfg` from its backup, if any.
///
/// See [`AnsibleCfg::restore`].
pub fn restore_ansible_cfg(ceph_ansible_dir: impl AsRef<Path>) -> Result<bool> {
    AnsibleCfg::in_dir(ceph_ansible_dir).restore()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
# ceph-ansible defaults
[defaults]
ansible_managed = Please do not change this file directly
retry_files_enabled = False

[ssh_connection]
pipelining = True
";

    #[test]
    fn test_get_respects_sections() {
        let doc = IniDocument::parse(SAMPLE);
        assert_eq!(doc.get("defaults", "retry_files_enabled"), Some("False"));
        assert_eq!(doc.get("ssh_connection", "pipelining"), Some("True"));
        assert_eq!(doc.get("defaults", "pipelining"), None);
    }

    #[test]
    fn test_section_header_with_inline_comment() {
        let mut doc = IniDocument::parse("[defaults] ; main\ndeprecation_warnings = True\n");
        assert!(doc.has_section("defaults"));
        assert_eq!(doc.get("defaults", "deprecation_warnings"), Some("True"));

        assert!(doc.set("defaults", "deprecation_warnings", "False"));
        let rendered = doc.render();
        assert_eq!(rendered, "[defaults] ; main\ndeprecation_warnings = False\n");
        assert_eq!(rendered.matches("[defaults]").count(), 1);
    }

    #[test]
    fn test_set_inserts_at_end_of_section() {
        let mut doc = IniDocument::parse(SAMPLE);
        assert!(doc.set("defaults", "deprecation_warnings", "False"));
        assert_eq!(
            doc.render(),
            "\
# ceph-ansible defaults
[defaults]
ansible_managed = Please do not change this file directly
retry_files_enabled = False
deprecation_warnings = False

[ssh_connection]
pipelining = True
"
        );
    }

    #[test]
    fn test_set_replaces_existing_value() {
        let mut doc = IniDocument::parse("[defaults]\ndeprecation_warnings: True\n");
        assert!(doc.set("defaults", "deprecation_warnings", "False"));
        assert_eq!(doc.render(), "[defaults]\ndeprecation_warnings = False\n");
        assert!(!doc.set("defaults", "deprecation_warnings", "False"));
    }

    #[test]
    fn test_set_creates_missing_section() {
        let mut doc = IniDocument::parse("[ssh_connection]\npipelining = True\n");
        assert!(doc.set("defaults", "deprecation_warnings", "False"));
        assert!(doc.has_section("defaults"));
        assert_eq!(
            doc.render(),
            "[ssh_connection]\npipelining = True\n\n[defaults]\ndeprecation_warnings = False\n"
        );
    }

    #[test]
    fn test_setup_is_noop_when_already_configured() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join(ANSIBLE_CFG);
        fs::write(&cfg, "[defaults]\ndeprecation_warnings = False\n").unwrap();

        let patch = AnsibleCfg::in_dir(dir.path());
        assert!(!patch.setup().unwrap());
        assert!(!patch.backup_path().exists());
    }

    #[test]
    fn test_backup_path_naming() {
        let patch = AnsibleCfg::in_dir("/usr/share/ceph-ansible");
        assert_eq!(
            patch.backup_path(),
            Path::new("/usr/share/ceph-ansible/ansible.cfg_bak")
        );
    }
}
