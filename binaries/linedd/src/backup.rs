//! Backing up an existing output file before it is overwritten.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use crate::config::OutputConfig;

/// Pick the path an existing `output` should be moved to.
///
/// Tries `<output>.backup`, then `<output>.backup1` up to
/// `<output>.backup<max_backups>`. When every name is taken the last one is
/// returned and the flag is `true`, meaning it will be overwritten.
pub fn backup_path(output: &Path, max_backups: u32) -> (PathBuf, bool) {
    let base = with_suffix(output, ".backup");
    if !base.exists() {
        return (base, false);
    }

    let mut last = base;
    for n in 1..=max_backups {
        last = with_suffix(output, &format!(".backup{n}"));
        if !last.exists() {
            return (last, false);
        }
    }
    (last, true)
}

/// Move an existing output file out of the way.
///
/// Returns the backup path, or `None` if there was nothing to back up.
pub fn backup_existing(output: &Path, config: &OutputConfig) -> anyhow::Result<Option<PathBuf>> {
    if !output.exists() {
        return Ok(None);
    }
    if config.abort_on_existing {
        anyhow::bail!("Output file {} already exists, aborting", output.display());
    }

    let (backup, overwrite) = backup_path(output, config.max_backups);
    if overwrite {
        warn!(
            output = %output.display(),
            backup = %backup.display(),
            "Too many backups already made, overwriting the last one"
        );
    }

    std::fs::rename(output, &backup).with_context(|| {
        format!(
            "Failed to move {} to {}",
            output.display(),
            backup.display()
        )
    })?;
    info!(
        output = %output.display(),
        backup = %backup.display(),
        "Output file already exists, moved it to backup"
    );

    Ok(Some(backup))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_to_back_up() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");

        let backup = backup_existing(&output, &OutputConfig::default()).unwrap();
        assert!(backup.is_none());
    }

    #[test]
    fn test_first_backup() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        std::fs::write(&output, "old\n").unwrap();

        let backup = backup_existing(&output, &OutputConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(backup, dir.path().join("out.txt.backup"));
        assert!(!output.exists());
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "old\n");
    }

    #[test]
    fn test_numbered_backups() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        std::fs::write(dir.path().join("out.txt.backup"), "0").unwrap();
        std::fs::write(dir.path().join("out.txt.backup1"), "1").unwrap();

        let (path, overwrite) = backup_path(&output, 9);
        assert_eq!(path, dir.path().join("out.txt.backup2"));
        assert!(!overwrite);
    }

    #[test]
    fn test_overwrites_last_backup_when_full() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        std::fs::write(dir.path().join("out.txt.backup"), "0").unwrap();
        for n in 1..=3 {
            std::fs::write(dir.path().join(format!("out.txt.backup{n}")), "x").unwrap();
        }
        std::fs::write(&output, "newest\n").unwrap();

        let config = OutputConfig {
            max_backups: 3,
            ..Default::default()
        };
        let (path, overwrite) = backup_path(&output, config.max_backups);
        assert_eq!(path, dir.path().join("out.txt.backup3"));
        assert!(overwrite);

        backup_existing(&output, &config).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out.txt.backup3")).unwrap(),
            "newest\n"
        );
    }

    #[test]
    fn test_abort_on_existing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        std::fs::write(&output, "keep me\n").unwrap();

        let config = OutputConfig {
            abort_on_existing: true,
            ..Default::default()
        };
        assert!(backup_existing(&output, &config).is_err());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "keep me\n");
    }
}
