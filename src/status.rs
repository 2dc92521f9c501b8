//! Per-unit processing status, one small record file per unit of work.
//!
//! Each record is `<dir>/<key>.status` holding a single `key:code` line,
//! with the codes of the old flat status files (`0` pending, `-1` running,
//! `1` done). Updating one unit rewrites only that unit's record, through a
//! temporary file renamed into place.
//!
//! Claiming a unit is exclusive across threads and processes: the claimer
//! first creates `<dir>/<key>.lock` without overwriting, then re-reads the
//! record and marks it running while it holds the lock.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

const EXTENSION: &str = "status";
const LOCK_EXTENSION: &str = "lock";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Pending,
    Running,
    Done,
}

impl Status {
    pub fn code(self) -> i8 {
        match self {
            Status::Pending => 0,
            Status::Running => -1,
            Status::Done => 1,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Pending => "pending",
            Status::Running => "running",
            Status::Done => "done",
        };
        f.write_str(name)
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Status::Pending),
            "-1" => Ok(Status::Running),
            "1" => Ok(Status::Done),
            other => Err(format!("unknown status code {other:?}")),
        }
    }
}

pub struct StatusStore {
    dir: PathBuf,
}

impl StatusStore {
    /// Open the store in `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(Error::io(&dir))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.starts_with('.') || key.contains(['/', '\\', '\0', '\n', ':']) {
            return Err(Error::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.{EXTENSION}")))
    }

    /// Status of `key`; units never seen before are pending.
    pub fn get(&self, key: &str) -> Result<Status> {
        let path = self.record_path(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => {
                let (stored_key, status) = parse_record(&text, &path)?;
                if stored_key != key {
                    return Err(Error::InvalidStatus {
                        path,
                        reason: format!("record is for {stored_key:?}, expected {key:?}"),
                    });
                }
                Ok(status)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Status::Pending),
            Err(e) => Err(Error::io(&path)(e)),
        }
    }

    /// Upsert the record of `key`.
    pub fn set(&self, key: &str, status: Status) -> Result<()> {
        let path = self.record_path(key)?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(Error::io(&self.dir))?;
        writeln!(tmp, "{key}:{}", status.code()).map_err(Error::io(tmp.path()))?;
        tmp.as_file().sync_all().map_err(Error::io(tmp.path()))?;
        tmp.persist(&path).map_err(|e| Error::io(&path)(e.error))?;
        debug!("Status of {key} set to {status}");
        Ok(())
    }

    /// Mark `key` running if it is pending. Returns whether it was claimed.
    ///
    /// At most one of several concurrent callers wins; the others see either
    /// the lock or the running record and get `false`.
    pub fn try_claim(&self, key: &str) -> Result<bool> {
        let Some(_lock) = self.lock(key)? else {
            debug!("{key} is being claimed elsewhere");
            return Ok(false);
        };
        if self.get(key)? != Status::Pending {
            return Ok(false);
        }
        self.set(key, Status::Running)?;
        Ok(true)
    }

    fn lock(&self, key: &str) -> Result<Option<ClaimLock>> {
        let path = self.record_path(key)?.with_extension(LOCK_EXTENSION);
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(Error::io(&self.dir))?;
        writeln!(tmp, "{}", std::process::id()).map_err(Error::io(tmp.path()))?;
        match tmp.persist_noclobber(&path) {
            Ok(_) => Ok(Some(ClaimLock { path })),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(Error::io(&path)(e.error)),
        }
    }

    /// All stored records, sorted by key.
    pub fn entries(&self) -> Result<BTreeMap<String, Status>> {
        let mut entries = BTreeMap::new();
        for entry in fs::read_dir(&self.dir).map_err(Error::io(&self.dir))? {
            let path = entry.map_err(Error::io(&self.dir))?.path();
            if path.extension().is_none_or(|ext| ext != EXTENSION) {
                continue;
            }
            let text = fs::read_to_string(&path).map_err(Error::io(&path))?;
            let (key, status) = parse_record(&text, &path)?;
            entries.insert(key, status);
        }
        Ok(entries)
    }

    /// Return every running unit to pending and drop leftover claim locks.
    /// Used to recover after a crash; no other process may be claiming.
    pub fn reset_running(&self) -> Result<Vec<String>> {
        for entry in fs::read_dir(&self.dir).map_err(Error::io(&self.dir))? {
            let path = entry.map_err(Error::io(&self.dir))?.path();
            if path.extension().is_some_and(|ext| ext == LOCK_EXTENSION) {
                warn!("Removing stale claim lock {}", path.display());
                fs::remove_file(&path).map_err(Error::io(&path))?;
            }
        }
        let mut reset = Vec::new();
        for (key, status) in self.entries()? {
            if status == Status::Running {
                self.set(&key, Status::Pending)?;
                reset.push(key);
            }
        }
        Ok(reset)
    }
}

/// Removes the lock file when the claim is over, successful or not.
struct ClaimLock {
    path: PathBuf,
}

impl Drop for ClaimLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Could not remove claim lock {}: {e}", self.path.display());
        }
    }
}

fn parse_record(text: &str, path: &Path) -> Result<(String, Status)> {
    let invalid = |reason: String| Error::InvalidStatus {
        path: path.to_path_buf(),
        reason,
    };
    let line = text.lines().next().unwrap_or_default();
    let (key, code) = line
        .rsplit_once(':')
        .ok_or_else(|| invalid(format!("expected key:code, found {line:?}")))?;
    let status = code.parse().map_err(invalid)?;
    Ok((key.to_string(), status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_are_pending() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::open(dir.path()).unwrap();
        assert_eq!(store.get("Arabidopsis_thaliana").unwrap(), Status::Pending);
        assert!(store.entries().unwrap().is_empty());
    }

    #[test]
    fn set_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::open(dir.path().join("status")).unwrap();
        store.set("Oryza_sativa", Status::Running).unwrap();
        store.set("Zea_mays", Status::Done).unwrap();
        store.set("Oryza_sativa", Status::Done).unwrap();

        assert_eq!(store.get("Oryza_sativa").unwrap(), Status::Done);
        let text = fs::read_to_string(dir.path().join("status/Zea_mays.status")).unwrap();
        assert_eq!(text, "Zea_mays:1\n");

        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.values().all(|s| *s == Status::Done));
    }

    #[test]
    fn claim_only_pending() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::open(dir.path()).unwrap();
        assert!(store.try_claim("chr1_1_4.fasta").unwrap());
        assert!(!store.try_claim("chr1_1_4.fasta").unwrap());
        store.set("chr1_1_4.fasta", Status::Done).unwrap();
        assert!(!store.try_claim("chr1_1_4.fasta").unwrap());
    }

    #[test]
    fn concurrent_claims_have_one_winner() {
        use std::sync::Barrier;

        let dir = tempfile::tempdir().unwrap();
        for trial in 0..100 {
            let key = format!("species_{trial}");
            let barrier = Barrier::new(2);
            let claims: Vec<bool> = std::thread::scope(|s| {
                let workers: Vec<_> = (0..2)
                    .map(|_| {
                        s.spawn(|| {
                            let store = StatusStore::open(dir.path()).unwrap();
                            barrier.wait();
                            store.try_claim(&key).unwrap()
                        })
                    })
                    .collect();
                workers.into_iter().map(|w| w.join().unwrap()).collect()
            });
            assert_eq!(claims.iter().filter(|&&c| c).count(), 1, "trial {trial}");
        }
        let store = StatusStore::open(dir.path()).unwrap();
        assert_eq!(store.entries().unwrap().len(), 100);
        assert!(store.entries().unwrap().values().all(|s| *s == Status::Running));
        // No lock is left behind.
        let locks = fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| {
                let path = e.as_ref().unwrap().path();
                path.extension().is_some_and(|ext| ext == LOCK_EXTENSION)
            })
            .count();
        assert_eq!(locks, 0);
    }

    #[test]
    fn stale_lock_blocks_claim_until_reset() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("Zea_mays.lock"), "12345\n").unwrap();
        assert!(!store.try_claim("Zea_mays").unwrap());
        assert_eq!(store.get("Zea_mays").unwrap(), Status::Pending);

        assert!(store.reset_running().unwrap().is_empty());
        assert!(!dir.path().join("Zea_mays.lock").exists());
        assert!(store.try_claim("Zea_mays").unwrap());
    }

    #[test]
    fn reset_running_recovers_stale_units() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::open(dir.path()).unwrap();
        store.set("a", Status::Running).unwrap();
        store.set("b", Status::Done).unwrap();
        store.set("c", Status::Running).unwrap();
        assert_eq!(store.reset_running().unwrap(), vec!["a", "c"]);
        assert_eq!(store.get("a").unwrap(), Status::Pending);
        assert_eq!(store.get("b").unwrap(), Status::Done);
    }

    #[test]
    fn bad_keys_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::open(dir.path()).unwrap();
        assert!(matches!(store.get("../x"), Err(Error::InvalidKey(_))));
        assert!(matches!(store.set("", Status::Done), Err(Error::InvalidKey(_))));

        fs::write(dir.path().join("broken.status"), "broken:7\n").unwrap();
        assert!(matches!(store.get("broken"), Err(Error::InvalidStatus { .. })));
        assert!(store.entries().is_err());
    }

    #[test]
    fn codes_match_legacy_files() {
        for status in [Status::Pending, Status::Running, Status::Done] {
            assert_eq!(status.code().to_string().parse::<Status>().unwrap(), status);
        }
    }
}
