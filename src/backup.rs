//! Copies of record snapshots that could not be read at startup.
//!
//! Before a session starts over with an empty store, the unreadable `records.json` is copied to
//! `.backups/records-unreadable.YYYY-MM-DD-NNN.json` so the user can recover it by hand. Only the
//! newest `backup_copies` copies are kept.

use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::Local;
use std::path::{Path, PathBuf};

/// File name prefix of preserved snapshots.
pub const UNREADABLE: &str = "records-unreadable";

/// Preserves unreadable snapshots in the backups directory. Create one with `Config::backup()`.
#[derive(Debug, Clone)]
pub struct Backup {
    dir: PathBuf,
    keep: usize,
}

impl Backup {
    pub fn new(config: &Config) -> Self {
        Self {
            dir: config.backups().to_path_buf(),
            keep: config.backup_copies() as usize,
        }
    }

    /// Copies `snapshot` aside under the next free sequence number for today, then drops the
    /// oldest copies beyond the configured count. Returns the path of the new copy.
    pub async fn preserve_unreadable(&self, snapshot: &Path) -> Result<PathBuf> {
        let date = Local::now().format("%Y-%m-%d").to_string();
        let seq = self
            .copies()
            .await?
            .iter()
            .filter(|copy| copy.name.date == date)
            .map(|copy| copy.name.seq)
            .max()
            .unwrap_or(0)
            + 1;
        let path = self.dir.join(CopyName { date, seq }.file_name());
        utils::copy(snapshot, &path).await?;
        self.prune().await?;
        Ok(path)
    }

    /// The preserved copies, oldest first.
    async fn copies(&self) -> Result<Vec<StoredCopy>> {
        let mut copies = Vec::new();
        let mut entries = utils::read_dir(&self.dir).await?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Unable to list {}", self.dir.display()))?
        {
            if let Some(name) = CopyName::parse(&entry.file_name().to_string_lossy()) {
                copies.push(StoredCopy {
                    name,
                    path: entry.path(),
                });
            }
        }
        copies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(copies)
    }

    async fn prune(&self) -> Result<()> {
        let copies = self.copies().await?;
        let excess = copies.len().saturating_sub(self.keep);
        for copy in copies.into_iter().take(excess) {
            utils::remove(&copy.path).await?;
        }
        Ok(())
    }
}

struct StoredCopy {
    name: CopyName,
    path: PathBuf,
}

/// The date and sequence number in `records-unreadable.{date}-{seq}.json`. Orders oldest first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CopyName {
    date: String,
    seq: u32,
}

impl CopyName {
    fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name
            .strip_prefix(UNREADABLE)?
            .strip_prefix('.')?
            .strip_suffix(".json")?;
        let (date, seq) = stem.rsplit_once('-')?;
        if date.len() != 10 {
            return None;
        }
        Some(Self {
            date: date.to_string(),
            seq: seq.parse().ok()?,
        })
    }

    fn file_name(&self) -> String {
        format!("{UNREADABLE}.{}-{:03}.json", self.date, self.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[test]
    fn test_copy_name() {
        let name = CopyName::parse("records-unreadable.2025-12-14-042.json").unwrap();
        assert_eq!(name.date, "2025-12-14");
        assert_eq!(name.seq, 42);
        assert_eq!(name.file_name(), "records-unreadable.2025-12-14-042.json");

        assert!(CopyName::parse("records.json").is_none());
        assert!(CopyName::parse("records-unreadable.2025-12-14-001.txt").is_none());
        assert!(CopyName::parse("records-unreadable.2025-12-14-abc.json").is_none());
        assert!(CopyName::parse("other.2025-12-14-001.json").is_none());
    }

    #[test]
    fn test_copy_name_orders_by_number_not_text() {
        let a = CopyName::parse("records-unreadable.2025-12-14-999.json").unwrap();
        let b = CopyName::parse("records-unreadable.2025-12-14-1000.json").unwrap();
        let c = CopyName::parse("records-unreadable.2025-12-15-001.json").unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[tokio::test]
    async fn test_preserve_unreadable_numbers_and_prunes() {
        let env = TestEnv::new().await;
        let config = env.config();
        let snapshot = config.root().join("broken.json");
        utils::write(&snapshot, "{not json").await.unwrap();

        let backup = config.backup();
        let first = backup.preserve_unreadable(&snapshot).await.unwrap();
        assert!(first.to_string_lossy().ends_with("-001.json"));
        assert_eq!(utils::read(&first).await.unwrap(), "{not json");

        let mut last = first;
        for _ in 0..(config.backup_copies() + 1) {
            last = backup.preserve_unreadable(&snapshot).await.unwrap();
        }
        assert!(last.is_file());

        let copies = backup.copies().await.unwrap();
        assert_eq!(copies.len(), config.backup_copies() as usize);
        assert_eq!(copies.last().unwrap().path, last);
        assert!(copies.iter().all(|copy| copy.name.seq > 1));
    }
}
