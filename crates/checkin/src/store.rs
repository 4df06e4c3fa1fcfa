//! The attendee list and its persistence.
//!
//! The in-memory list is authoritative for the session. Every append writes
//! the whole list back to the item store under a single key; read and write
//! failures are logged and never reach the caller.

use tracing::{debug, info, warn};

use crate::attendee::AttendeeRecord;
use crate::error::{Error, Result};
use crate::storage::ItemStore;

/// Outcome of writing the snapshot after an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persisted {
    /// The full list was written to storage.
    Yes,
    /// The write failed; the record exists only in memory.
    No,
}

/// Ordered, append-only attendee list backed by an [`ItemStore`].
#[derive(Debug)]
pub struct AttendeeStore<S> {
    backend: S,
    key: String,
    attendees: Vec<AttendeeRecord>,
}

impl<S: ItemStore> AttendeeStore<S> {
    /// Load the attendee list stored under `key`.
    ///
    /// Missing, unreadable or malformed snapshots yield an empty list.
    pub fn load(backend: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let attendees = match backend.get_item(&key) {
            Ok(Some(raw)) => from_snapshot(&raw).unwrap_or_else(|e| {
                warn!("Failed to parse stored attendees under '{}': {}", key, e);
                Vec::new()
            }),
            Ok(None) => {
                debug!("No attendees stored under '{}'", key);
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to read attendees under '{}': {}", key, e);
                Vec::new()
            }
        };

        info!("Loaded {} attendees", attendees.len());
        Self {
            backend,
            key,
            attendees,
        }
    }

    /// Append a record and persist the full list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateAttendee`] if a record with the same id is
    /// already present. Persistence failures are not errors; they are
    /// reported as [`Persisted::No`].
    pub fn append(&mut self, record: AttendeeRecord) -> Result<Persisted> {
        if self.attendees.iter().any(|a| a.id == record.id) {
            return Err(Error::DuplicateAttendee { id: record.id });
        }

        debug!("Appending attendee {}", record.id);
        self.attendees.push(record);
        Ok(self.persist())
    }

    /// Current list in insertion order.
    #[must_use]
    pub fn all(&self) -> &[AttendeeRecord] {
        &self.attendees
    }

    /// Number of attendees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attendees.len()
    }

    /// Whether no attendees are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attendees.is_empty()
    }

    /// The persistence backend.
    #[must_use]
    pub fn backend(&self) -> &S {
        &self.backend
    }

    fn persist(&self) -> Persisted {
        let written = to_snapshot(&self.attendees)
            .and_then(|snapshot| self.backend.set_item(&self.key, &snapshot));

        match written {
            Ok(()) => Persisted::Yes,
            Err(e) => {
                warn!("Failed to save attendees under '{}': {}", self.key, e);
                Persisted::No
            }
        }
    }
}

/// Serialize an attendee list to its stored JSON form.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_snapshot(attendees: &[AttendeeRecord]) -> Result<String> {
    Ok(serde_json::to_string(attendees)?)
}

/// Parse a stored JSON snapshot.
///
/// # Errors
///
/// Returns an error if `raw` is not a JSON array of attendee records.
pub fn from_snapshot(raw: &str) -> Result<Vec<AttendeeRecord>> {
    Ok(serde_json::from_str(raw)?)
}
