//! Path helpers for the Zellij sandbox environment.
//!
//! Inside the plugin sandbox the host filesystem is reachable under `/host`,
//! which typically maps to the directory Zellij was started from (usually the
//! user's home directory).

use std::path::PathBuf;

/// Sandbox mount point of the host filesystem.
const HOST_ROOT: &str = "/host";

/// Returns the data directory for aclwatch state and traces.
///
/// Resolves to `/host/.local/share/zellij/aclwatch`, i.e.
/// `~/.local/share/zellij/aclwatch` on the host.
///
/// # Examples
///
/// ```
/// use aclwatch::infrastructure::get_data_dir;
///
/// let data_dir = get_data_dir();
/// assert_eq!(data_dir.to_str(), Some("/host/.local/share/zellij/aclwatch"));
/// ```
#[must_use]
pub fn get_data_dir() -> PathBuf {
    PathBuf::from(HOST_ROOT)
        .join(".local/share/zellij")
        .join("aclwatch")
}

/// Expands a leading `~` to the sandbox host mount.
///
/// # Examples
///
/// ```
/// use aclwatch::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("~/devices.toml"), "/host/devices.toml");
/// assert_eq!(expand_tilde("~"), "/host");
/// assert_eq!(expand_tilde("/etc/aclwatch.toml"), "/etc/aclwatch.toml");
/// assert_eq!(expand_tilde("~user/file"), "~user/file");
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    if path == "~" {
        HOST_ROOT.to_string()
    } else if let Some(rest) = path.strip_prefix("~/") {
        format!("{HOST_ROOT}/{rest}")
    } else {
        path.to_string()
    }
}
