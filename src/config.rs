//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::tasks::backup::BackupPolicy;
use crate::tasks::cleanup::CleanupPolicy;
use crate::tasks::maintenance::InlineMaintenancePolicy;
use crate::tasks::runner::Cadence;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Delete analyzed records older than this many days
    pub cleanup_max_age_days: i64,
    /// Delete unanalyzed records older than this many hours
    pub cleanup_unanalyzed_max_age_hours: i64,
    /// Restrict the age-based pass to records that carry an analysis
    pub cleanup_analyzed_only: bool,
    /// Interval between scheduled cleanup runs, in seconds
    pub cleanup_interval_secs: u64,
    /// Local hour (0-23) at which the backup task fires
    pub backup_hour: u32,
    /// Copy the media directory alongside the database export
    pub backup_include_media: bool,
    /// Number of backups of each kind to retain
    pub backup_keep: usize,
    /// Directory receiving timestamped backups
    pub backup_dir: PathBuf,
    /// Directory holding uploaded image files
    pub media_root: PathBuf,
    /// Per-request probability of running cleanup inline
    pub inline_maintenance_probability: f64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8000)
    /// - `CLEANUP_MAX_AGE_DAYS` - Analyzed-record retention in days (default: 7)
    /// - `CLEANUP_UNANALYZED_MAX_AGE_HOURS` - Unanalyzed-record retention in hours (default: 24)
    /// - `CLEANUP_ANALYZED_ONLY` - Restrict age pass to analyzed records (default: true)
    /// - `CLEANUP_INTERVAL_SECS` - Cleanup cadence in seconds (default: 86400)
    /// - `BACKUP_HOUR` - Local hour gating the backup task (default: 0)
    /// - `BACKUP_INCLUDE_MEDIA` - Also copy the media directory (default: true)
    /// - `BACKUP_KEEP` - Retained backups per kind (default: 5)
    /// - `BACKUP_DIR` - Backup destination directory (default: "backups")
    /// - `MEDIA_ROOT` - Uploaded image directory (default: "media/uploads")
    /// - `INLINE_MAINTENANCE_PROBABILITY` - Request-path trigger odds (default: 0.01)
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            cleanup_max_age_days: env::var("CLEANUP_MAX_AGE_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
            cleanup_unanalyzed_max_age_hours: env::var("CLEANUP_UNANALYZED_MAX_AGE_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            cleanup_analyzed_only: env::var("CLEANUP_ANALYZED_ONLY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            cleanup_interval_secs: env::var("CLEANUP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(86_400),
            backup_hour: env::var("BACKUP_HOUR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            backup_include_media: env::var("BACKUP_INCLUDE_MEDIA")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            backup_keep: env::var("BACKUP_KEEP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            backup_dir: env::var("BACKUP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("backups")),
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("media/uploads")),
            inline_maintenance_probability: env::var("INLINE_MAINTENANCE_PROBABILITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.01),
        }
    }

    /// Cadence of the scheduled cleanup task.
    pub fn cleanup_cadence(&self) -> Cadence {
        Cadence::Every(Duration::from_secs(self.cleanup_interval_secs))
    }

    /// Cadence of the scheduled backup task.
    pub fn backup_cadence(&self) -> Cadence {
        Cadence::DailyAtHour(self.backup_hour)
    }

    /// Retention policy consumed by the cleanup work.
    pub fn cleanup_policy(&self) -> CleanupPolicy {
        CleanupPolicy {
            max_age_days: self.cleanup_max_age_days,
            unanalyzed_max_age_hours: self.cleanup_unanalyzed_max_age_hours,
            analyzed_only: self.cleanup_analyzed_only,
        }
    }

    /// Destination and retention policy consumed by the backup work.
    pub fn backup_policy(&self) -> BackupPolicy {
        BackupPolicy {
            backup_dir: self.backup_dir.clone(),
            media_root: self.media_root.clone(),
            include_media: self.backup_include_media,
            keep: self.backup_keep,
        }
    }

    /// Gate policy for the request-path maintenance trigger.
    ///
    /// A scheduled cleanup run within its own interval counts as "recent",
    /// which suppresses the inline path entirely on healthy deployments.
    pub fn inline_maintenance_policy(&self) -> InlineMaintenancePolicy {
        InlineMaintenancePolicy {
            probability: self.inline_maintenance_probability,
            freshness: Duration::from_secs(self.cleanup_interval_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8000,
            cleanup_max_age_days: 7,
            cleanup_unanalyzed_max_age_hours: 24,
            cleanup_analyzed_only: true,
            cleanup_interval_secs: 86_400,
            backup_hour: 0,
            backup_include_media: true,
            backup_keep: 5,
            backup_dir: PathBuf::from("backups"),
            media_root: PathBuf::from("media/uploads"),
            inline_maintenance_probability: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8000);
        assert_eq!(config.cleanup_max_age_days, 7);
        assert_eq!(config.cleanup_unanalyzed_max_age_hours, 24);
        assert!(config.cleanup_analyzed_only);
        assert_eq!(config.cleanup_interval_secs, 86_400);
        assert_eq!(config.backup_hour, 0);
        assert_eq!(config.backup_keep, 5);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SERVER_PORT");
        env::remove_var("CLEANUP_MAX_AGE_DAYS");
        env::remove_var("CLEANUP_INTERVAL_SECS");
        env::remove_var("BACKUP_HOUR");

        let config = Config::from_env();
        assert_eq!(config.server_port, 8000);
        assert_eq!(config.cleanup_max_age_days, 7);
        assert_eq!(config.cleanup_interval_secs, 86_400);
        assert_eq!(config.backup_hour, 0);
    }

    #[test]
    fn test_cleanup_policy_mirrors_config() {
        let config = Config {
            cleanup_max_age_days: 3,
            cleanup_analyzed_only: false,
            ..Config::default()
        };
        let policy = config.cleanup_policy();
        assert_eq!(policy.max_age_days, 3);
        assert!(!policy.analyzed_only);
    }

    #[test]
    fn test_inline_policy_freshness_tracks_interval() {
        let config = Config {
            cleanup_interval_secs: 120,
            ..Config::default()
        };
        let policy = config.inline_maintenance_policy();
        assert_eq!(policy.freshness, Duration::from_secs(120));
    }
}
