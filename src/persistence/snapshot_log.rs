//! Append-only snapshot log.
//!
//! Each line is one self-contained [`Snapshot`] in NDJSON. Reads are a full
//! linear scan; lines that fail to parse (typically a torn trailing write)
//! are skipped rather than failing the read.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::Snapshot;
use crate::error::{LeaderboardError, Result};

pub struct SnapshotStore {
    path: PathBuf,
    /// Serializes appends from this process
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one snapshot as a single line.
    pub async fn append(&self, snapshot: &Snapshot) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut line = serde_json::to_string(snapshot)?;
        line.push('\n');
        // Isolate a torn line left behind by an interrupted write.
        if !self.ends_with_newline().await? {
            line.insert(0, '\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.sync_data().await?;

        debug!(
            "Appended snapshot ts={} ({} users) to {}",
            snapshot.timestamp,
            snapshot.totals.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Every well-formed snapshot, sorted by timestamp ascending.
    pub async fn read_all(&self) -> Result<Vec<Snapshot>> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LeaderboardError::Io(e)),
        };

        let (snapshots, skipped) = parse_log(&contents);
        if skipped > 0 {
            warn!(
                "Skipped {} malformed line(s) in snapshot log {}",
                skipped,
                self.path.display()
            );
        }
        Ok(snapshots)
    }

    /// True for a missing or empty file, or one whose last byte is `\n`.
    async fn ends_with_newline(&self) -> Result<bool> {
        let mut file = match tokio::fs::File::open(&self.path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(LeaderboardError::Io(e)),
        };
        if file.metadata().await?.len() == 0 {
            return Ok(true);
        }
        file.seek(SeekFrom::End(-1)).await?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last).await?;
        Ok(last[0] == b'\n')
    }
}

/// Parse NDJSON log contents. Returns the snapshots sorted by timestamp
/// (stable for equal timestamps) and the number of malformed lines skipped.
///
/// Works on raw bytes: a line cut inside a multi-byte character is just
/// another malformed line.
pub fn parse_log(contents: &[u8]) -> (Vec<Snapshot>, usize) {
    let mut skipped = 0;
    let mut snapshots: Vec<Snapshot> = contents
        .split(|b| *b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .filter_map(|line| match serde_json::from_slice::<Snapshot>(line) {
            Ok(s) => Some(s),
            Err(_) => {
                skipped += 1;
                None
            }
        })
        .collect();
    snapshots.sort_by_key(|s| s.timestamp);
    (snapshots, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn scratch_store(tag: &str) -> SnapshotStore {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "wagerboard_{}_{}",
            tag,
            Utc::now().timestamp_nanos_opt().unwrap_or(0)
        ));
        p.push("snapshots.jsonl");
        SnapshotStore::new(p)
    }

    fn snap(ts: i64, totals: &[(&str, f64)]) -> Snapshot {
        let totals: BTreeMap<String, f64> =
            totals.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        Snapshot::new(ts, totals)
    }

    #[test]
    fn parse_log_sorts_and_skips_garbage() {
        let contents = concat!(
            "{\"ts\":30,\"p\":{\"A\":3}}\n",
            "\n",
            "{\"ts\":10,\"p\":{\"A\":1}}\n",
            "{\"ts\":20,\"p\":\n",
            "{\"ts\":20,\"p\":{\"A\":2}}"
        );
        let (snapshots, skipped) = parse_log(contents.as_bytes());
        let ts: Vec<i64> = snapshots.iter().map(|s| s.timestamp).collect();
        assert_eq!(ts, vec![10, 20, 30]);
        assert_eq!(skipped, 1);
    }

    #[tokio::test]
    async fn torn_multibyte_tail_is_skipped() {
        let store = scratch_store("snap_utf8");
        store.append(&snap(1, &[("José", 1.0)])).await.unwrap();

        let mut f = tokio::fs::OpenOptions::new()
            .append(true)
            .open(store.path())
            .await
            .unwrap();
        f.write_all(b"{\"ts\":2,\"p\":{\"Jos\xC3").await.unwrap();
        drop(f);

        let snapshots = store.read_all().await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].totals.get("José"), Some(&1.0));

        store.append(&snap(3, &[("José", 4.0)])).await.unwrap();
        let ts: Vec<i64> = store
            .read_all()
            .await
            .unwrap()
            .iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(ts, vec![1, 3]);

        let _ = tokio::fs::remove_dir_all(store.path().parent().unwrap()).await;
    }

    #[tokio::test]
    async fn missing_log_reads_empty() {
        let store = scratch_store("snap_missing");
        assert!(store.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appends_survive_a_torn_trailing_line() {
        let store = scratch_store("snap_torn");
        store.append(&snap(1, &[("A", 1.0)])).await.unwrap();
        store.append(&snap(2, &[("A", 2.0)])).await.unwrap();

        // Simulate a crash mid-write.
        let mut f = tokio::fs::OpenOptions::new()
            .append(true)
            .open(store.path())
            .await
            .unwrap();
        f.write_all(b"{\"ts\":3,\"p\":{\"A\"").await.unwrap();
        drop(f);

        let before = store.read_all().await.unwrap();
        assert_eq!(before.len(), 2);

        store.append(&snap(4, &[("A", 4.0)])).await.unwrap();
        let after = store.read_all().await.unwrap();
        let ts: Vec<i64> = after.iter().map(|s| s.timestamp).collect();
        assert_eq!(ts, vec![1, 2, 4]);

        let _ = tokio::fs::remove_dir_all(store.path().parent().unwrap()).await;
    }
}
