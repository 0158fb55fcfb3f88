//! Persistent alarm log.
//!
//! Stores up to [`LOG_SLOTS`] [`ErrorLogEntry`] records in a ring buffer
//! under the `errlog` storage namespace. Each slot holds one
//! postcard-encoded entry; the next write position is persisted
//! alongside so the ring survives restarts. When full, the oldest entry
//! is overwritten.
//!
//! The in-memory write position and count only move once storage has
//! accepted the write. If storage fails part-way through an append or a
//! clear, both are re-read from storage so they never disagree with it.

use log::{info, warn};

use crate::app::events::ErrorLogEntry;
use crate::app::ports::{ErrorLogPort, StorageError, StoragePort};

pub const LOG_SLOTS: usize = 16;
const LOG_NAMESPACE: &str = "errlog";
const INDEX_KEY: &str = "idx";

/// Encoded entries are well under this.
const SLOT_BUF: usize = 64;

pub struct NvsErrorLog<S> {
    storage: S,
    write_index: usize,
    stored: usize,
}

impl<S: StoragePort> NvsErrorLog<S> {
    /// Attach to `storage`, recovering the write position and the number
    /// of occupied slots.
    pub fn new(storage: S) -> Self {
        let mut log = Self {
            storage,
            write_index: 0,
            stored: 0,
        };
        log.resync();
        info!(
            "Error log: {} entries, next slot {}",
            log.stored, log.write_index
        );
        log
    }

    /// Reload the write position and occupied-slot count from storage.
    fn resync(&mut self) {
        let mut buf = [0u8; 4];
        self.write_index = match self.storage.read(LOG_NAMESPACE, INDEX_KEY, &mut buf) {
            Ok(4) => u32::from_le_bytes(buf) as usize % LOG_SLOTS,
            _ => 0,
        };
        self.stored = (0..LOG_SLOTS)
            .filter(|&i| self.storage.exists(LOG_NAMESPACE, &Self::slot_key(i)))
            .count();
    }

    fn write_entry(&mut self, slot: usize, bytes: &[u8]) -> Result<(), StorageError> {
        self.storage
            .write(LOG_NAMESPACE, &Self::slot_key(slot), bytes)?;
        let next = ((slot + 1) % LOG_SLOTS) as u32;
        self.storage
            .write(LOG_NAMESPACE, INDEX_KEY, &next.to_le_bytes())
    }

    fn erase_all(&mut self) -> Result<(), StorageError> {
        for i in 0..LOG_SLOTS {
            self.storage.delete(LOG_NAMESPACE, &Self::slot_key(i))?;
        }
        self.storage.delete(LOG_NAMESPACE, INDEX_KEY)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn slot_key(index: usize) -> heapless::String<8> {
        let mut s = heapless::String::new();
        let _ = core::fmt::Write::write_fmt(&mut s, format_args!("e{}", index));
        s
    }

    fn read_slot(&self, index: usize) -> Option<ErrorLogEntry> {
        let mut buf = [0u8; SLOT_BUF];
        let len = self
            .storage
            .read(LOG_NAMESPACE, &Self::slot_key(index), &mut buf)
            .ok()?;
        match postcard::from_bytes(&buf[..len]) {
            Ok(entry) => Some(entry),
            Err(_) => {
                warn!("Error log slot {} unreadable, skipped", index);
                None
            }
        }
    }
}

impl<S: StoragePort> ErrorLogPort for NvsErrorLog<S> {
    fn append(&mut self, entry: &ErrorLogEntry) -> Result<(), StorageError> {
        let bytes = postcard::to_allocvec(entry).map_err(|_| StorageError::Corrupted)?;
        if let Err(e) = self.write_entry(self.write_index, &bytes) {
            self.resync();
            return Err(e);
        }
        self.write_index = (self.write_index + 1) % LOG_SLOTS;
        self.stored = (self.stored + 1).min(LOG_SLOTS);
        Ok(())
    }

    fn read(&self, max: usize) -> Vec<ErrorLogEntry> {
        (0..self.stored.min(max))
            .filter_map(|age| {
                let slot = (self.write_index + LOG_SLOTS - 1 - age) % LOG_SLOTS;
                self.read_slot(slot)
            })
            .collect()
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        if let Err(e) = self.erase_all() {
            self.resync();
            return Err(e);
        }
        self.write_index = 0;
        self.stored = 0;
        info!("Error log cleared");
        Ok(())
    }

    fn count(&self) -> usize {
        self.stored
    }
}
