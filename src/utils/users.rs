//! Local account lookups.

use std::path::PathBuf;

use nix::unistd::{getuid, User};

/// Whether a local account called `username` exists.
pub fn user_exists(username: &str) -> bool {
    matches!(User::from_name(username), Ok(Some(_)))
}

/// Name of the user running the copilot.
///
/// Falls back to `$USER` when the password database has no entry for the
/// current uid.
pub fn current_user() -> Option<String> {
    match User::from_uid(getuid()) {
        Ok(Some(user)) => Some(user.name),
        _ => std::env::var("USER").ok(),
    }
}

/// Home directory of `username`, if the account exists.
pub fn home_dir_of(username: &str) -> Option<PathBuf> {
    match User::from_name(username) {
        Ok(Some(user)) => Some(user.dir),
        _ => None,
    }
}
