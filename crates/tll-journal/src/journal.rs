use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{JournalError, JournalResult};

/// Flush/sync strategy for the journal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    /// `fsync` after every append (safest, highest latency).
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    OsDefault,
}

impl Default for SyncMode {
    fn default() -> Self {
        // Lending traffic is sparse; durable-by-default costs little here.
        Self::EveryWrite
    }
}

/// Configuration for the journal.
#[derive(Clone, Copy, Debug, Default)]
pub struct JournalConfig {
    /// Sync/flush strategy.
    pub sync_mode: SyncMode,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Internal mutable state for the journal writer.
struct JournalWriter {
    writer: BufWriter<File>,
    /// Current write offset in the segment file.
    offset: u64,
}

/// Crash-recoverable append-only journal.
///
/// On-disk format, one frame per record:
/// ```text
/// [4 bytes: record length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized record)]
/// ```
///
/// On recovery the file is read front-to-back; entries that fail the CRC
/// check are skipped (they represent incomplete/torn writes from a crash).
/// The journal holds the permanent history, so there is no checkpointing;
/// the only destructive operation is [`Journal::truncate`].
pub struct Journal<R> {
    /// Path to the segment file.
    path: PathBuf,
    /// Writer state behind a mutex for thread safety.
    writer: Mutex<JournalWriter>,
    /// Configuration.
    config: JournalConfig,
    _record: PhantomData<fn() -> R>,
}

impl<R> Journal<R>
where
    R: Serialize + DeserializeOwned,
{
    /// Open (or create) a journal segment file at the given path.
    pub fn open(path: &Path, config: JournalConfig) -> JournalResult<Self> {
        // Ensure parent directory exists.
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let offset = file.metadata()?.len();
        let writer = BufWriter::new(file);

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(JournalWriter { writer, offset }),
            config,
            _record: PhantomData,
        })
    }

    /// Append a single record. Returns the byte offset of the frame.
    pub fn append(&self, record: &R) -> JournalResult<u64> {
        let payload =
            bincode::serialize(record).map_err(|e| JournalError::Serialization(e.to_string()))?;

        let length = payload.len() as u32;
        let crc = crc32fast::hash(&payload);

        let mut w = self.writer.lock().expect("journal mutex poisoned");
        let frame_offset = w.offset;

        // Write header: [length: u32 LE] [crc: u32 LE]
        w.writer.write_all(&length.to_le_bytes())?;
        w.writer.write_all(&crc.to_le_bytes())?;
        // Write payload
        w.writer.write_all(&payload)?;

        w.writer.flush()?;
        if matches!(self.config.sync_mode, SyncMode::EveryWrite) {
            w.writer.get_ref().sync_all()?;
        }

        w.offset += HEADER_SIZE as u64 + payload.len() as u64;

        debug!(offset = frame_offset, len = payload.len(), "journal append");
        Ok(frame_offset)
    }

    /// Recover all valid records from the segment.
    ///
    /// Reads the file front-to-back. Entries that fail CRC validation are
    /// logged and skipped; a short or zero-length frame stops recovery at
    /// the last intact record.
    pub fn recover(&self) -> JournalResult<Vec<R>> {
        let mut file = BufReader::new(File::open(&self.path)?);
        let file_len = file.get_ref().metadata()?.len();
        let mut records = Vec::new();
        let mut offset: u64 = 0;

        while offset + HEADER_SIZE as u64 <= file_len {
            file.seek(SeekFrom::Start(offset))?;

            // Read header
            let mut header_buf = [0u8; HEADER_SIZE];
            match file.read_exact(&mut header_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let length =
                u32::from_le_bytes([header_buf[0], header_buf[1], header_buf[2], header_buf[3]]);
            let expected_crc =
                u32::from_le_bytes([header_buf[4], header_buf[5], header_buf[6], header_buf[7]]);

            // Validate length
            if length == 0 || (offset + HEADER_SIZE as u64 + length as u64) > file_len {
                warn!(
                    offset,
                    length, file_len, "invalid journal frame length; stopping recovery"
                );
                break;
            }

            // Read payload
            let mut payload = vec![0u8; length as usize];
            match file.read_exact(&mut payload) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    warn!(offset, "truncated journal frame; stopping recovery");
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            // CRC check
            let actual_crc = crc32fast::hash(&payload);
            if actual_crc != expected_crc {
                warn!(
                    offset,
                    expected = expected_crc,
                    actual = actual_crc,
                    "CRC mismatch; skipping frame"
                );
                offset += HEADER_SIZE as u64 + length as u64;
                continue;
            }

            // Deserialize
            match bincode::deserialize::<R>(&payload) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(offset, error = %e, "failed to deserialize journal frame; skipping");
                }
            }

            offset += HEADER_SIZE as u64 + length as u64;
        }

        debug!(recovered = records.len(), "journal recovery complete");
        Ok(records)
    }

    /// Truncate the entire journal (remove all data). Supports the
    /// administrative bulk clear; there is no partial truncation.
    pub fn truncate(&self) -> JournalResult<()> {
        let mut w = self.writer.lock().expect("journal mutex poisoned");

        // Truncate the file to zero.
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;

        w.writer = BufWriter::new(file);
        w.offset = 0;

        debug!("journal truncated");
        Ok(())
    }

    /// Current write offset.
    pub fn offset(&self) -> u64 {
        self.writer.lock().expect("journal mutex poisoned").offset
    }

    /// Path to the segment file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct Note {
        seq: u32,
        text: String,
    }

    fn note(seq: u32) -> Note {
        Note {
            seq,
            text: format!("note-{seq}"),
        }
    }

    #[test]
    fn append_and_recover_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.journal");
        let journal: Journal<Note> = Journal::open(&path, JournalConfig::default()).unwrap();

        journal.append(&note(1)).unwrap();
        journal.append(&note(2)).unwrap();
        journal.append(&note(3)).unwrap();

        let recovered = journal.recover().unwrap();
        assert_eq!(recovered, vec![note(1), note(2), note(3)]);
    }

    #[test]
    fn recover_empty_journal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.journal");
        let journal: Journal<Note> = Journal::open(&path, JournalConfig::default()).unwrap();

        let recovered = journal.recover().unwrap();
        assert!(recovered.is_empty());
    }

    #[test]
    fn reopen_appends_after_existing_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reopen.journal");

        let journal: Journal<Note> = Journal::open(&path, JournalConfig::default()).unwrap();
        journal.append(&note(1)).unwrap();
        let first_len = journal.offset();
        drop(journal);

        let journal: Journal<Note> = Journal::open(&path, JournalConfig::default()).unwrap();
        assert_eq!(journal.offset(), first_len);
        journal.append(&note(2)).unwrap();

        let recovered = journal.recover().unwrap();
        assert_eq!(recovered, vec![note(1), note(2)]);
    }

    #[test]
    fn crc_detects_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.journal");
        let journal: Journal<Note> = Journal::open(&path, JournalConfig::default()).unwrap();

        journal.append(&note(1)).unwrap();
        journal.append(&note(2)).unwrap();
        drop(journal);

        // Corrupt the payload of the first frame (byte 8 is first payload byte).
        {
            let mut file = OpenOptions::new()
                .write(true)
                .read(true)
                .open(&path)
                .unwrap();
            file.seek(SeekFrom::Start(HEADER_SIZE as u64)).unwrap();
            let mut buf = [0u8; 1];
            file.read_exact(&mut buf).unwrap();
            buf[0] ^= 0xFF;
            file.seek(SeekFrom::Start(HEADER_SIZE as u64)).unwrap();
            file.write_all(&buf).unwrap();
            file.sync_all().unwrap();
        }

        let journal: Journal<Note> = Journal::open(&path, JournalConfig::default()).unwrap();
        let recovered = journal.recover().unwrap();

        // First frame is skipped on CRC failure; the second survives.
        assert_eq!(recovered, vec![note(2)]);
    }

    #[test]
    fn recovery_survives_truncated_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tail.journal");
        let journal: Journal<Note> = Journal::open(&path, JournalConfig::default()).unwrap();

        journal.append(&note(1)).unwrap();
        journal.append(&note(2)).unwrap();
        let total_len = journal.offset();
        drop(journal);

        // Truncate the file mid-frame (remove last 4 bytes).
        {
            let file = OpenOptions::new().write(true).open(&path).unwrap();
            file.set_len(total_len - 4).unwrap();
        }

        let journal: Journal<Note> = Journal::open(&path, JournalConfig::default()).unwrap();
        let recovered = journal.recover().unwrap();

        // Only the first complete frame is recovered.
        assert_eq!(recovered, vec![note(1)]);
    }

    #[test]
    fn truncate_clears_journal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trunc.journal");
        let journal: Journal<Note> = Journal::open(&path, JournalConfig::default()).unwrap();

        journal.append(&note(1)).unwrap();
        journal.append(&note(2)).unwrap();
        assert!(journal.offset() > 0);

        journal.truncate().unwrap();
        assert_eq!(journal.offset(), 0);

        let recovered = journal.recover().unwrap();
        assert!(recovered.is_empty());
    }

    #[test]
    fn append_returns_increasing_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offsets.journal");
        let journal: Journal<Note> = Journal::open(&path, JournalConfig::default()).unwrap();

        let off1 = journal.append(&note(1)).unwrap();
        let off2 = journal.append(&note(2)).unwrap();
        let off3 = journal.append(&note(3)).unwrap();

        assert_eq!(off1, 0);
        assert!(off2 > off1);
        assert!(off3 > off2);
    }

    #[test]
    fn os_default_sync_mode_still_recovers_after_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lazy.journal");
        let config = JournalConfig {
            sync_mode: SyncMode::OsDefault,
        };
        let journal: Journal<Note> = Journal::open(&path, config).unwrap();

        journal.append(&note(1)).unwrap();
        let recovered = journal.recover().unwrap();
        assert_eq!(recovered.len(), 1);
    }
}
