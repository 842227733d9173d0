//! Append-only credential store
//!
//! The store owns the credential file and an in-memory index of known
//! usernames. One `RwLock` guards both, so the "username unused, then
//! append" sequence of an insert is atomic with respect to every other
//! insert, and readers never observe a half-written record.

use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{CodecError, StorageError};
use crate::storage::codec::{self, RECORD_TERMINATOR};
use crate::storage::record::CredentialRecord;

/// Storage seam used by the enrollment service.
pub trait CredentialRepository: Send + Sync {
    /// Appends the record iff no record exists for its username.
    fn insert(&self, record: CredentialRecord) -> Result<(), StorageError>;

    fn exists(&self, username: &str) -> Result<bool, StorageError>;

    /// Number of enrolled usernames.
    fn len(&self) -> Result<usize, StorageError>;

    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

/// Result of reading a credential file
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Well-formed records in file order, first occurrence per username
    pub records: Vec<CredentialRecord>,
    /// Lines that failed to decode
    pub skipped: usize,
    /// Later records for an already-seen username
    pub duplicates: usize,
    /// Whether the file ended in an unterminated (partially written) line
    pub truncated_tail: bool,
    /// Byte length of the file up to and including the last terminator
    pub valid_len: u64,
}

impl LoadReport {
    pub fn usernames(&self) -> HashSet<String> {
        self.records.iter().map(|r| r.username.clone()).collect()
    }
}

struct StoreState {
    file: File,
    usernames: HashSet<String>,
    /// File length after the last successful append
    committed_len: u64,
    /// Set when a failed append could not be rolled back
    needs_repair: bool,
}

/// Credential store backed by a line-per-record file.
pub struct FileCredentialStore {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl FileCredentialStore {
    /// Opens (creating if needed) the credential file and seeds the username
    /// index. A partially written final line is cut off so the next append
    /// starts on a fresh line.
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, LoadReport), StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = open_append(&path)?;
        let report = Self::load(&path)?;

        if report.truncated_tail {
            warn!(
                "Discarding partially written record at end of {}",
                path.display()
            );
            file.set_len(report.valid_len)?;
            file.sync_data()?;
        }

        info!(
            "Loaded {} credential records from {} ({} skipped, {} duplicates)",
            report.records.len(),
            path.display(),
            report.skipped,
            report.duplicates
        );

        let state = StoreState {
            file,
            usernames: report.usernames(),
            committed_len: report.valid_len,
            needs_repair: false,
        };

        Ok((
            Self {
                path,
                state: RwLock::new(state),
            },
            report,
        ))
    }

    /// Reads a credential file without modifying it. Corrupt lines are
    /// skipped and counted; only I/O errors fail the load.
    pub fn load(path: impl AsRef<Path>) -> Result<LoadReport, StorageError> {
        let path = path.as_ref();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LoadReport::default()),
            Err(e) => return Err(StorageError::from(e)),
        };

        let mut report = LoadReport::default();
        let mut seen = HashSet::new();
        let terminator = RECORD_TERMINATOR as u8;

        let valid_len = bytes
            .iter()
            .rposition(|&b| b == terminator)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        report.valid_len = valid_len as u64;
        report.truncated_tail = valid_len < bytes.len();

        for (idx, raw) in bytes[..valid_len]
            .split(|&b| b == terminator)
            .enumerate()
        {
            let line_no = idx + 1;
            let decoded = std::str::from_utf8(raw)
                .map_err(|e| CodecError::InvalidField {
                    field: "line",
                    reason: format!("{e}"),
                })
                .and_then(codec::decode);

            match decoded {
                Ok(record) => {
                    if seen.insert(record.username.clone()) {
                        report.records.push(record);
                    } else {
                        warn!("Ignoring duplicate record for existing username at line {}", line_no);
                        report.duplicates += 1;
                    }
                }
                Err(CodecError::Empty) => {}
                Err(e) => {
                    warn!("Skipping malformed record at line {}: {}", line_no, e);
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }

    /// Re-reads every record under the read lock.
    pub fn records(&self) -> Result<Vec<CredentialRecord>, StorageError> {
        let _state = self.state.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(Self::load(&self.path)?.records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialRepository for FileCredentialStore {
    fn insert(&self, record: CredentialRecord) -> Result<(), StorageError> {
        let mut line = codec::encode(&record)?;
        line.push(RECORD_TERMINATOR);

        let mut guard = self.state.write().map_err(|_| StorageError::LockPoisoned)?;
        let state = &mut *guard;

        if state.usernames.contains(&record.username) {
            return Err(StorageError::AlreadyExists(record.username));
        }

        if state.needs_repair {
            state.file.set_len(state.committed_len)?;
            state.needs_repair = false;
        }

        if let Err(e) = append_line(&mut state.file, line.as_bytes()) {
            error!("Append to {} failed: {}", self.path.display(), e);
            if let Err(rollback) = state.file.set_len(state.committed_len) {
                error!(
                    "Rollback of {} to {} bytes failed: {}",
                    self.path.display(),
                    state.committed_len,
                    rollback
                );
                state.needs_repair = true;
            }
            return Err(StorageError::Io(e));
        }

        state.committed_len += line.len() as u64;
        debug!("Stored credential record for {}", record.username);
        state.usernames.insert(record.username);
        Ok(())
    }

    fn exists(&self, username: &str) -> Result<bool, StorageError> {
        let state = self.state.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(state.usernames.contains(username))
    }

    fn len(&self) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(state.usernames.len())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}

/// Whole line in one write, then flushed to disk before the caller is acknowledged.
fn append_line(file: &mut File, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes)?;
    file.sync_data()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::HashParams;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn record(username: &str) -> CredentialRecord {
        CredentialRecord {
            username: username.to_string(),
            salt: vec![7; 16],
            hash: vec![9; 32],
            params: HashParams {
                memory_cost_kib: 64,
                time_cost: 1,
                parallelism: 1,
            },
            created_at: 1_700_000_000,
        }
    }

    fn store_path(dir: &TempDir) -> PathBuf {
        dir.path().join("users.txt")
    }

    #[test]
    fn insert_then_load_yields_one_record() {
        let dir = TempDir::new().unwrap();
        let (store, report) = FileCredentialStore::open(store_path(&dir)).unwrap();
        assert!(report.records.is_empty());

        store.insert(record("alice")).unwrap();
        assert!(store.exists("alice").unwrap());
        assert!(!store.exists("bob").unwrap());

        let loaded = FileCredentialStore::load(store_path(&dir)).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0], record("alice"));
        assert_eq!(store.records().unwrap(), loaded.records);
    }

    #[test]
    fn duplicate_insert_is_rejected_and_not_written() {
        let dir = TempDir::new().unwrap();
        let (store, _) = FileCredentialStore::open(store_path(&dir)).unwrap();

        store.insert(record("alice")).unwrap();
        let err = store.insert(record("alice")).unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(ref u) if u == "alice"));

        let contents = fs::read_to_string(store_path(&dir)).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn reopen_seeds_uniqueness_index() {
        let dir = TempDir::new().unwrap();
        {
            let (store, _) = FileCredentialStore::open(store_path(&dir)).unwrap();
            store.insert(record("alice")).unwrap();
            store.insert(record("bob")).unwrap();
        }

        let (store, report) = FileCredentialStore::open(store_path(&dir)).unwrap();
        assert_eq!(report.records.len(), 2);
        assert!(matches!(
            store.insert(record("bob")),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn concurrent_inserts_for_one_username_have_one_winner() {
        let dir = TempDir::new().unwrap();
        let (store, _) = FileCredentialStore::open(store_path(&dir)).unwrap();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.insert(record("mallory")))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let taken = results
            .iter()
            .filter(|r| matches!(r, Err(StorageError::AlreadyExists(_))))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(taken, 15);
        assert_eq!(FileCredentialStore::load(store_path(&dir)).unwrap().records.len(), 1);
    }

    #[test]
    fn truncated_tail_is_tolerated_and_repaired() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);

        let mut contents = String::new();
        for name in ["alice", "bob"] {
            contents.push_str(&codec::encode(&record(name)).unwrap());
            contents.push('\n');
        }
        let partial = codec::encode(&record("carol")).unwrap();
        contents.push_str(&partial[..partial.len() - 5]);
        fs::write(&path, &contents).unwrap();

        let loaded = FileCredentialStore::load(&path).unwrap();
        assert!(loaded.truncated_tail);
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.skipped, 0);

        let (store, _) = FileCredentialStore::open(&path).unwrap();
        store.insert(record("carol")).unwrap();

        let reloaded = FileCredentialStore::load(&path).unwrap();
        assert!(!reloaded.truncated_tail);
        assert_eq!(reloaded.skipped, 0);
        let names: Vec<_> = reloaded.records.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, ["alice", "bob", "carol"]);
    }

    #[test]
    fn malformed_lines_are_skipped_and_counted() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);

        let contents = format!(
            "{}\n{{username: \"legacy\", salt: \"x\", hash: \"y\"}}\n\n{}\n{}\n",
            codec::encode(&record("alice")).unwrap(),
            codec::encode(&record("bob")).unwrap(),
            codec::encode(&record("alice")).unwrap(),
        );
        fs::write(&path, contents).unwrap();

        let report = FileCredentialStore::load(&path).unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.duplicates, 1);
        assert!(!report.truncated_tail);
    }

    #[test]
    fn non_canonical_usernames_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);

        let contents = format!(
            "{}\n{}\n{}\n",
            codec::encode(&record("alice")).unwrap(),
            codec::encode(&record(" alice")).unwrap(),
            codec::encode(&record("a\nb")).unwrap(),
        );
        fs::write(&path, contents).unwrap();

        let report = FileCredentialStore::load(&path).unwrap();
        assert_eq!(report.skipped, 2);
        assert_eq!(report.usernames().len(), 1);
        assert!(report.usernames().contains("alice"));
    }

    #[test]
    fn load_of_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let report = FileCredentialStore::load(dir.path().join("absent.txt")).unwrap();
        assert!(report.records.is_empty());
        assert_eq!(report.valid_len, 0);
    }

    #[cfg(unix)]
    #[test]
    fn credential_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let (store, _) = FileCredentialStore::open(store_path(&dir)).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
