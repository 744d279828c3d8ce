//! Durable storage for the two session token slots.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::Error;

/// One of the two persisted token slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenSlot {
    Access,
    Refresh,
}

impl TokenSlot {
    /// Storage key of the slot.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Access => "accessToken",
            Self::Refresh => "refreshToken",
        }
    }
}

/// Persistent key-value surface holding the token slots.
///
/// `get` never fails: an absent or unreadable slot is `None`. Writes report
/// failure so callers can tell that the session will not survive a restart.
pub trait TokenStore: Send + Sync + 'static {
    fn get(&self, slot: TokenSlot) -> Option<String>;

    /// Overwrite a slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the backing storage is unavailable.
    fn set(&self, slot: TokenSlot, value: &str) -> Result<(), Error>;

    /// Remove a slot. Removing an absent slot succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the backing storage is unavailable.
    fn clear(&self, slot: TokenSlot) -> Result<(), Error>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local token store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slots: Mutex<BTreeMap<TokenSlot, String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with an access/refresh pair.
    #[must_use]
    pub fn with_tokens(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        let slots = BTreeMap::from([
            (TokenSlot::Access, access.into()),
            (TokenSlot::Refresh, refresh.into()),
        ]);
        Self {
            slots: Mutex::new(slots),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, slot: TokenSlot) -> Option<String> {
        lock(&self.slots).get(&slot).cloned()
    }

    fn set(&self, slot: TokenSlot, value: &str) -> Result<(), Error> {
        lock(&self.slots).insert(slot, value.to_owned());
        Ok(())
    }

    fn clear(&self, slot: TokenSlot) -> Result<(), Error> {
        lock(&self.slots).remove(&slot);
        Ok(())
    }
}

/// Token store backed by a small JSON file.
///
/// The file holds `{"accessToken": "...", "refreshToken": "..."}` and is
/// rewritten atomically (temp file + rename) on every change. Reads are
/// served from the copy loaded at [`open`](FileTokenStore::open).
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    slots: Mutex<BTreeMap<String, String>>,
}

impl FileTokenStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the file exists but cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let slots = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable token file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(Error::Storage(format!("{}: {e}", path.display())));
            }
        };
        Ok(Self {
            path,
            slots: Mutex::new(slots),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), Error> {
        let mut slots = lock(&self.slots);
        let mut next = slots.clone();
        apply(&mut next);
        if next == *slots {
            return Ok(());
        }
        self.persist(&next)
            .map_err(|e| Error::Storage(format!("{}: {e}", self.path.display())))?;
        *slots = next;
        Ok(())
    }

    fn persist(&self, slots: &BTreeMap<String, String>) -> io::Result<()> {
        let contents = serde_json::to_vec_pretty(slots)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, slot: TokenSlot) -> Option<String> {
        lock(&self.slots).get(slot.key()).cloned()
    }

    fn set(&self, slot: TokenSlot, value: &str) -> Result<(), Error> {
        self.update(|slots| {
            slots.insert(slot.key().to_owned(), value.to_owned());
        })
    }

    fn clear(&self, slot: TokenSlot) -> Result<(), Error> {
        self.update(|slots| {
            slots.remove(slot.key());
        })
    }
}
