//! Append-only journal file.
//!
//! Record framing: a 4-byte big-endian length followed by that many bytes of
//! CBOR-encoded `JournalEntry`. A crash in the middle of an append leaves a
//! short final record; it was never acknowledged, so opening the journal
//! drops it. A length prefix above `MAX_RECORD_LEN` can't come from a torn
//! append and is reported as corruption instead.
//!
//! The file is held under an exclusive advisory lock for as long as the
//! journal is open. A second writer, in this process or another, is refused.

use super::traits::*;
use crate::serialization::{from_cbor, to_cbor};
use async_trait::async_trait;
use fs2::FileExt;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const LENGTH_PREFIX: usize = 4;

/// Largest encoded entry the journal accepts (1 MiB).
pub const MAX_RECORD_LEN: usize = 1024 * 1024;

/// File-backed `LedgerStore`.
pub struct FileJournal {
    path: PathBuf,
    inner: Mutex<JournalFile>,
}

struct JournalFile {
    file: File,
    /// Length of the acknowledged prefix of the file.
    len: u64,
}

impl FileJournal {
    /// Open (or create) the journal at `path`, dropping any torn tail record.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .await?;
        let file = lock_exclusive(file, &path).await?;

        let bytes = fs::read(&path).await?;
        let (entries, valid_len) = decode_records(&bytes)?;

        if valid_len < bytes.len() {
            warn!(
                path = %path.display(),
                dropped_bytes = bytes.len() - valid_len,
                "journal ends with an incomplete record; truncating"
            );
            file.set_len(valid_len as u64).await?;
            file.sync_data().await?;
        }

        debug!(path = %path.display(), entries = entries.len(), "journal opened");

        Ok(Self {
            path,
            inner: Mutex::new(JournalFile {
                file,
                len: valid_len as u64,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LedgerStore for FileJournal {
    async fn load(&self) -> StoreResult<Vec<JournalEntry>> {
        // Hold the lock so a concurrent append can't be read half-written.
        let inner = self.inner.lock().await;
        let bytes = fs::read(&self.path).await?;
        let end = (inner.len as usize).min(bytes.len());
        let (entries, _) = decode_records(&bytes[..end])?;
        Ok(entries)
    }

    async fn append(&self, entry: &JournalEntry) -> StoreResult<()> {
        let frame = encode_record(entry)?;
        let mut inner = self.inner.lock().await;

        let written: std::io::Result<()> = async {
            inner.file.write_all(&frame).await?;
            inner.file.sync_data().await
        }
        .await;

        if let Err(e) = written {
            warn!(error = %e, sequence = entry.sequence, "journal append failed; rolling back");
            if let Err(truncate_err) = inner.file.set_len(inner.len).await {
                warn!(error = %truncate_err, "failed to truncate journal after append error");
            }
            return Err(e.into());
        }

        inner.len += frame.len() as u64;
        Ok(())
    }
}

async fn lock_exclusive(file: File, path: &Path) -> StoreResult<File> {
    let file = file.into_std().await;
    if let Err(e) = FileExt::try_lock_exclusive(&file) {
        warn!(path = %path.display(), error = %e, "journal is already open elsewhere");
        return Err(StoreError::Unavailable(format!(
            "journal {} is locked by another process",
            path.display()
        )));
    }
    Ok(File::from_std(file))
}

fn encode_record(entry: &JournalEntry) -> StoreResult<Vec<u8>> {
    let body = to_cbor(entry)?;
    if body.len() > MAX_RECORD_LEN {
        return Err(StoreError::Unavailable(format!(
            "record of {} bytes exceeds the {} byte limit",
            body.len(),
            MAX_RECORD_LEN
        )));
    }
    let len = body.len() as u32;

    let mut frame = Vec::with_capacity(LENGTH_PREFIX + body.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Decode every complete record.
///
/// Returns the entries and the byte length they occupy. Anything after that
/// is an incomplete trailing record.
fn decode_records(bytes: &[u8]) -> StoreResult<(Vec<JournalEntry>, usize)> {
    let mut entries = Vec::new();
    let mut offset = 0;

    while bytes.len() - offset >= LENGTH_PREFIX {
        let mut prefix = [0u8; LENGTH_PREFIX];
        prefix.copy_from_slice(&bytes[offset..offset + LENGTH_PREFIX]);
        let len = u32::from_be_bytes(prefix) as usize;
        if len > MAX_RECORD_LEN {
            return Err(StoreError::Corrupt(format!(
                "record at byte {} claims {} bytes",
                offset, len
            )));
        }

        let start = offset + LENGTH_PREFIX;
        if bytes.len() - start < len {
            break;
        }

        let entry: JournalEntry = from_cbor(&bytes[start..start + len])
            .map_err(|e| StoreError::Corrupt(format!("record at byte {}: {}", offset, e)))?;
        entries.push(entry);
        offset = start + len;
    }

    Ok((entries, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AccountId;
    use crate::ledger::{LedgerDelta, ProposalId, VoteRecord};
    use tempfile::TempDir;

    fn vote_entry(sequence: u64, voter: &str) -> JournalEntry {
        JournalEntry {
            sequence,
            recorded_at: 1_700_000_000 + sequence,
            delta: LedgerDelta::VoteCast {
                record: VoteRecord {
                    proposal_id: ProposalId(1),
                    voter: AccountId::parse(voter).unwrap(),
                    support: sequence % 2 == 0,
                },
            },
        }
    }

    #[tokio::test]
    async fn test_open_creates_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("ledger.journal");

        let journal = FileJournal::open(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(journal.path(), path.as_path());
        assert!(journal.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.journal");

        {
            let journal = FileJournal::open(&path).await.unwrap();
            journal.append(&vote_entry(1, "0xB")).await.unwrap();
            journal.append(&vote_entry(2, "0xC")).await.unwrap();
        }

        let journal = FileJournal::open(&path).await.unwrap();
        let entries = journal.load().await.unwrap();
        assert_eq!(entries, vec![vote_entry(1, "0xB"), vote_entry(2, "0xC")]);
    }

    #[tokio::test]
    async fn test_torn_tail_is_truncated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.journal");

        {
            let journal = FileJournal::open(&path).await.unwrap();
            journal.append(&vote_entry(1, "0xB")).await.unwrap();
        }
        let good_len = std::fs::metadata(&path).unwrap().len();

        // Simulate a crash halfway through the second append.
        let frame = encode_record(&vote_entry(2, "0xC")).unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        bytes.extend_from_slice(&frame[..frame.len() / 2]);
        std::fs::write(&path, &bytes).unwrap();

        let journal = FileJournal::open(&path).await.unwrap();
        assert_eq!(journal.load().await.unwrap(), vec![vote_entry(1, "0xB")]);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), good_len);

        // New appends land right after the last good record.
        journal.append(&vote_entry(2, "0xD")).await.unwrap();
        drop(journal);
        let reopened = FileJournal::open(&path).await.unwrap();
        assert_eq!(reopened.load().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_garbage_record_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.journal");

        let mut bytes = 3u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0xff, 0xff, 0xff]);
        std::fs::write(&path, &bytes).unwrap();

        let result = FileJournal::open(&path).await;
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_damaged_length_prefix_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.journal");

        {
            let journal = FileJournal::open(&path).await.unwrap();
            for (sequence, voter) in [(1, "0xB"), (2, "0xC"), (3, "0xD")] {
                journal.append(&vote_entry(sequence, voter)).await.unwrap();
            }
        }
        let before = std::fs::read(&path).unwrap();

        // Flip the prefix of the middle record so it points past the end.
        let second = encode_record(&vote_entry(1, "0xB")).unwrap().len();
        let mut bytes = before.clone();
        bytes[second..second + LENGTH_PREFIX].copy_from_slice(&u32::MAX.to_be_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let result = FileJournal::open(&path).await;
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
        // Nothing was truncated away.
        assert_eq!(std::fs::metadata(&path).unwrap().len(), before.len() as u64);
    }

    #[tokio::test]
    async fn test_second_open_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.journal");

        let journal = FileJournal::open(&path).await.unwrap();
        let second = FileJournal::open(&path).await;
        assert!(matches!(second, Err(StoreError::Unavailable(_))));

        drop(journal);
        assert!(FileJournal::open(&path).await.is_ok());
    }

    #[test]
    fn test_oversized_record_rejected_on_encode() {
        let mut entry = vote_entry(1, "0xB");
        entry.delta = LedgerDelta::VoteCast {
            record: VoteRecord {
                proposal_id: ProposalId(1),
                voter: AccountId::parse(&"x".repeat(MAX_RECORD_LEN + 1)).unwrap(),
                support: true,
            },
        };
        assert!(matches!(encode_record(&entry), Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn test_decode_records_empty() {
        let (entries, len) = decode_records(&[]).unwrap();
        assert!(entries.is_empty());
        assert_eq!(len, 0);
    }

    #[test]
    fn test_decode_records_short_prefix() {
        let (entries, len) = decode_records(&[0, 0]).unwrap();
        assert!(entries.is_empty());
        assert_eq!(len, 0);
    }
}
