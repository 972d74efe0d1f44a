//! Size-rotated, append-only trace file.
//!
//! Each exported batch is one line. When the live file grows past the
//! configured size it is renamed with a UTC timestamp suffix and a fresh file
//! is started; only the newest backups are kept.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

/// Limits for trace file rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size in bytes after which the live file is rotated.
    pub max_bytes: u64,
    /// Number of rotated files kept next to the live file.
    pub backups: usize,
}

/// Thread-safe line writer with size-based rotation.
pub struct RotatingFile {
    path: PathBuf,
    policy: RotationPolicy,
    /// Opened lazily on first write so construction never fails.
    handle: Mutex<Option<File>>,
}

impl RotatingFile {
    pub const fn new(path: PathBuf, policy: RotationPolicy) -> Self {
        Self {
            path,
            policy,
            handle: Mutex::new(None),
        }
    }

    /// Appends `line` plus a newline, rotating first if the file is too big.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors or a poisoned lock.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut handle = self
            .handle
            .lock()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("trace writer lock poisoned: {e}")))?;

        let oversized = fs::metadata(&self.path).is_ok_and(|m| m.len() >= self.policy.max_bytes);
        if oversized {
            *handle = None;
            self.rotate()?;
        }

        if handle.is_none() {
            *handle = Some(OpenOptions::new().create(true).append(true).open(&self.path)?);
        }
        let file = handle
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "trace file unavailable"))?;

        writeln!(file, "{line}")?;
        file.flush()
    }

    fn rotate(&self) -> io::Result<()> {
        let backup = self.backup_path();
        fs::rename(&self.path, &backup)?;
        self.prune_backups()
    }

    /// Picks an unused backup name; rotations within the same millisecond
    /// get a counter appended.
    fn backup_path(&self) -> PathBuf {
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f").to_string();
        let mut backup = self.path.with_extension(format!("json.{stamp}"));
        let mut seq = 1u32;
        while backup.exists() {
            backup = self.path.with_extension(format!("json.{stamp}-{seq:03}"));
            seq += 1;
        }
        backup
    }

    /// Deletes the oldest backups beyond the retention limit.
    fn prune_backups(&self) -> io::Result<()> {
        let Some(dir) = self.path.parent() else {
            return Ok(());
        };
        let prefix = format!("{}.", self.file_name());

        // Timestamp suffixes sort chronologically as strings.
        let mut backups: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&prefix))
            })
            .collect();
        backups.sort();

        let excess = backups.len().saturating_sub(self.policy.backups);
        for stale in backups.iter().take(excess) {
            // A leftover backup only costs disk space.
            let _ = fs::remove_file(stale);
        }
        Ok(())
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    #[cfg(test)]
    fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl std::fmt::Debug for RotatingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFile")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
