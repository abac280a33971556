//! Tests for patching and restoring ansible.cfg on disk

use std::fs;

use ceph_copilot::cfg_patch::{restore_ansible_cfg, setup_ansible_cfg, AnsibleCfg, ANSIBLE_CFG};
use ceph_copilot::error::Error;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const CEPH_ANSIBLE_CFG: &str = "\
# Comment kept on purpose
[defaults]
ansible_managed = Please do not change this file directly since it is managed by Ansible
deprecation_warnings = True
callback_whitelist = profile_tasks
forks = 20

[ssh_connection]
control_path = %(directory)s/%%h-%%r
pipelining = True
";

#[test]
fn test_setup_then_restore_is_byte_identical() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(ANSIBLE_CFG);
    fs::write(&path, CEPH_ANSIBLE_CFG).unwrap();

    assert!(setup_ansible_cfg(dir.path()).unwrap());
    let patched = fs::read_to_string(&path).unwrap();
    assert!(patched.contains("deprecation_warnings = False"));
    assert!(!patched.contains("deprecation_warnings = True"));
    assert!(patched.contains("control_path = %(directory)s/%%h-%%r"));
    assert!(patched.starts_with("# Comment kept on purpose\n"));

    let backup = AnsibleCfg::in_dir(dir.path()).backup_path().to_path_buf();
    assert_eq!(fs::read_to_string(&backup).unwrap(), CEPH_ANSIBLE_CFG);

    assert!(restore_ansible_cfg(dir.path()).unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), CEPH_ANSIBLE_CFG);
    assert!(!backup.exists());
}

#[test]
fn test_only_the_warning_setting_changes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(ANSIBLE_CFG);
    fs::write(&path, CEPH_ANSIBLE_CFG).unwrap();

    setup_ansible_cfg(dir.path()).unwrap();
    let patched = fs::read_to_string(&path).unwrap();

    let original: Vec<&str> = CEPH_ANSIBLE_CFG.lines().collect();
    let changed: Vec<&str> = patched.lines().collect();
    assert_eq!(original.len(), changed.len());

    let diffs: Vec<(&&str, &&str)> = original
        .iter()
        .zip(changed.iter())
        .filter(|(a, b)| a != b)
        .collect();
    assert_eq!(diffs.len(), 1);
    assert_eq!(*diffs[0].1, "deprecation_warnings = False");
}

#[test]
fn test_setup_adds_missing_setting() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(ANSIBLE_CFG);
    fs::write(&path, "[defaults]\nforks = 20\n").unwrap();

    assert!(setup_ansible_cfg(dir.path()).unwrap());
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "[defaults]\nforks = 20\ndeprecation_warnings = False\n"
    );
}

#[test]
fn test_second_setup_keeps_first_backup() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(ANSIBLE_CFG);
    fs::write(&path, CEPH_ANSIBLE_CFG).unwrap();

    assert!(setup_ansible_cfg(dir.path()).unwrap());
    assert!(!setup_ansible_cfg(dir.path()).unwrap());

    assert!(restore_ansible_cfg(dir.path()).unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), CEPH_ANSIBLE_CFG);
}

#[test]
fn test_missing_cfg_is_environment_error() {
    let dir = tempdir().unwrap();

    let err = setup_ansible_cfg(dir.path()).unwrap_err();
    assert!(matches!(err, Error::Environment { .. }));
    assert_eq!(err.exit_code(), 3);
    assert!(err.to_string().contains("ansible.cfg"));
}

#[test]
fn test_restore_without_backup_is_noop() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(ANSIBLE_CFG);
    fs::write(&path, CEPH_ANSIBLE_CFG).unwrap();

    assert!(!restore_ansible_cfg(dir.path()).unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), CEPH_ANSIBLE_CFG);
}
