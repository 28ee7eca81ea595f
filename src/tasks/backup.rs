//! Database and Media Backup
//!
//! Exports the record set to a timestamped JSON file, optionally copies the
//! media directory alongside it, and prunes old backups down to a fixed
//! retention count. One invocation succeeds or fails as a unit.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Local;
use tracing::{info, warn};

use crate::error::{DetectorError, Result};
use crate::records::RecordStore;

/// Backup file name prefixes, also used when pruning.
const DB_BACKUP_PREFIX: &str = "db_backup_";
const MEDIA_BACKUP_PREFIX: &str = "media_backup_";

// == Backup Policy ==
/// Where backups go and how many to keep.
#[derive(Debug, Clone)]
pub struct BackupPolicy {
    /// Directory receiving timestamped backups
    pub backup_dir: PathBuf,
    /// Directory holding uploaded image files
    pub media_root: PathBuf,
    /// Also copy the media directory
    pub include_media: bool,
    /// Backups of each kind to retain
    pub keep: usize,
}

// == Backup Report ==
/// What one backup run produced.
#[derive(Debug, Clone)]
pub struct BackupReport {
    /// Path of the database export
    pub database_file: PathBuf,
    /// Path of the media copy, when one was made
    pub media_dir: Option<PathBuf>,
    /// Old backups removed by the retention pass
    pub pruned: usize,
}

// == Run Backup ==
/// Executes one full backup run.
///
/// The database export is atomic: records are serialized to a temporary
/// file which is then renamed into place, so a crash mid-write never leaves
/// a half-written export under the backup name. Export and media-copy
/// failures fail the whole run; pruning failures only log.
pub fn run_backup(records: &RecordStore, policy: &BackupPolicy) -> Result<BackupReport> {
    fs::create_dir_all(&policy.backup_dir)?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();

    // Database export
    let database_file = policy
        .backup_dir
        .join(format!("{DB_BACKUP_PREFIX}{stamp}.json"));
    let payload = serde_json::to_vec_pretty(&records.snapshot())?;
    let staging = database_file.with_extension("json.tmp");
    fs::write(&staging, &payload)?;
    fs::rename(&staging, &database_file)?;
    info!(path = %database_file.display(), "database backup written");

    // Media copy
    let media_dir = if policy.include_media && policy.media_root.is_dir() {
        let destination = policy
            .backup_dir
            .join(format!("{MEDIA_BACKUP_PREFIX}{stamp}"));
        copy_dir_recursive(&policy.media_root, &destination).map_err(|e| {
            DetectorError::Backup(format!(
                "media copy to {} failed: {e}",
                destination.display()
            ))
        })?;
        info!(path = %destination.display(), "media files backed up");
        Some(destination)
    } else {
        None
    };

    let pruned = prune_old_backups(&policy.backup_dir, policy.keep);

    Ok(BackupReport {
        database_file,
        media_dir,
        pruned,
    })
}

// == Copy Dir Recursive ==
/// Copies a directory tree into `destination`, which must not exist yet.
fn copy_dir_recursive(source: &Path, destination: &Path) -> io::Result<()> {
    fs::create_dir_all(destination)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

// == Prune Old Backups ==
/// Keeps only the `keep` most recent backups of each kind.
///
/// Returns how many were removed. Removal failures are logged and skipped;
/// retention is advisory and must never fail a successful backup.
fn prune_old_backups(backup_dir: &Path, keep: usize) -> usize {
    let mut db_backups = Vec::new();
    let mut media_backups = Vec::new();

    let entries = match fs::read_dir(backup_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %backup_dir.display(), "could not scan backup dir for pruning: {e}");
            return 0;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if name.starts_with(DB_BACKUP_PREFIX) && !name.ends_with(".tmp") {
            db_backups.push((entry.path(), modified));
        } else if name.starts_with(MEDIA_BACKUP_PREFIX) {
            media_backups.push((entry.path(), modified));
        }
    }

    let mut pruned = 0;
    for backups in [&mut db_backups, &mut media_backups] {
        // Newest first; everything past `keep` goes
        backups.sort_by(|a, b| b.1.cmp(&a.1));
        for (path, _) in backups.iter().skip(keep) {
            let removed = if path.is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            };
            match removed {
                Ok(()) => {
                    info!(path = %path.display(), "removed old backup");
                    pruned += 1;
                }
                Err(e) => warn!(path = %path.display(), "could not remove old backup: {e}"),
            }
        }
    }
    pruned
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Analysis, ImageRecord};
    use std::thread::sleep;
    use std::time::Duration;

    fn temp_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "realface_backup_{}_{}_{}",
            std::process::id(),
            nanos,
            label
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn policy(backup_dir: PathBuf, media_root: PathBuf, include_media: bool) -> BackupPolicy {
        BackupPolicy {
            backup_dir,
            media_root,
            include_media,
            keep: 5,
        }
    }

    fn populated_store() -> RecordStore {
        let store = RecordStore::new();
        let mut analyzed = ImageRecord::new("uploads/a.jpg", "a.jpg", 100);
        analyzed.analysis = Some(Analysis::from_score(0.9));
        store.insert(analyzed);
        store.insert(ImageRecord::new("uploads/b.jpg", "b.jpg", 200));
        store
    }

    #[test]
    fn test_backup_exports_all_records() {
        let backup_dir = temp_dir("export");
        let store = populated_store();

        let report =
            run_backup(&store, &policy(backup_dir.clone(), "missing".into(), false)).unwrap();

        assert!(report.database_file.exists());
        assert!(report.media_dir.is_none());

        let exported: Vec<ImageRecord> =
            serde_json::from_slice(&fs::read(&report.database_file).unwrap()).unwrap();
        assert_eq!(exported.len(), 2);
        assert!(exported[0].is_analyzed());

        // No staging leftovers
        assert!(!report.database_file.with_extension("json.tmp").exists());
        fs::remove_dir_all(backup_dir).unwrap();
    }

    #[test]
    fn test_backup_copies_media_tree() {
        let backup_dir = temp_dir("media_dst");
        let media_root = temp_dir("media_src");
        fs::write(media_root.join("one.jpg"), b"x").unwrap();
        fs::create_dir_all(media_root.join("nested")).unwrap();
        fs::write(media_root.join("nested/two.jpg"), b"y").unwrap();

        let report = run_backup(
            &RecordStore::new(),
            &policy(backup_dir.clone(), media_root.clone(), true),
        )
        .unwrap();

        let copied = report.media_dir.expect("media copy expected");
        assert!(copied.join("one.jpg").exists());
        assert!(copied.join("nested/two.jpg").exists());

        fs::remove_dir_all(backup_dir).unwrap();
        fs::remove_dir_all(media_root).unwrap();
    }

    #[test]
    fn test_backup_skips_media_when_root_missing() {
        let backup_dir = temp_dir("no_media");

        let report = run_backup(
            &RecordStore::new(),
            &policy(backup_dir.clone(), "does_not_exist".into(), true),
        )
        .unwrap();

        assert!(report.media_dir.is_none());
        fs::remove_dir_all(backup_dir).unwrap();
    }

    #[test]
    fn test_prune_keeps_newest_per_kind() {
        let backup_dir = temp_dir("prune");
        for i in 0..7 {
            fs::write(backup_dir.join(format!("db_backup_2024010{i}.json")), b"{}").unwrap();
            sleep(Duration::from_millis(15));
        }
        fs::create_dir_all(backup_dir.join("media_backup_20240101")).unwrap();

        let pruned = prune_old_backups(&backup_dir, 5);

        assert_eq!(pruned, 2);
        let remaining = fs::read_dir(&backup_dir)
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with(DB_BACKUP_PREFIX))
            .count();
        assert_eq!(remaining, 5);
        // The newest survives
        assert!(backup_dir.join("db_backup_20240106.json").exists());
        // A single media backup is under the retention count
        assert!(backup_dir.join("media_backup_20240101").exists());

        fs::remove_dir_all(backup_dir).unwrap();
    }

    #[test]
    fn test_prune_missing_dir_is_quiet() {
        assert_eq!(prune_old_backups(Path::new("no_such_backup_dir"), 5), 0);
    }
}
