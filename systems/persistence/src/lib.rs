#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Content-hashed persistence of the grid into per-slot storage keys.
//!
//! Grid changes are coalesced: any number of `GridChanged` events observed
//! before [`Persistence::prepare`] produce a single [`HashJob`] describing
//! the terminal state. Jobs are tagged with the slot, the load generation and
//! the grid revision they were prepared from, so [`Persistence::commit`] can
//! discard jobs that complete after a newer one has already been stored.

mod store;

use gridsly_core::{Event, GridSnapshot, MapSlot};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use store::{DirectoryStore, KeyValueStore, MemoryStore, StoreError};

const LAYERS_KEY: &str = "gridsly-map-layers";
const SHA_KEY: &str = "gridsly-map-sha";

/// Errors raised while persisting the grid.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The grid could not be serialised.
    #[error("failed to serialise grid")]
    Serialize(#[from] serde_json::Error),
    /// The storage backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Storage keys used by a map slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotKeys {
    /// Key holding the serialised grid.
    pub layers: String,
    /// Key holding the grid's content hash.
    pub sha: String,
}

impl SlotKeys {
    /// Keys for the provided slot; slot 0 uses the unsuffixed names.
    #[must_use]
    pub fn for_slot(slot: MapSlot) -> Self {
        match slot.get() {
            0 => Self {
                layers: LAYERS_KEY.to_owned(),
                sha: SHA_KEY.to_owned(),
            },
            index => Self {
                layers: format!("{LAYERS_KEY}-{index}"),
                sha: format!("{SHA_KEY}-{index}"),
            },
        }
    }
}

/// Serialises the canonical form of a snapshot.
pub fn serialize_grid(snapshot: &GridSnapshot) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(&snapshot.canonical())?)
}

/// Hex-encoded SHA-256 of the canonical serialisation of a snapshot.
pub fn content_hash(snapshot: &GridSnapshot) -> Result<String, PersistenceError> {
    Ok(digest_hex(&serialize_grid(snapshot)?))
}

fn digest_hex(payload: &str) -> String {
    format!("{:x}", Sha256::digest(payload.as_bytes()))
}

/// Owned grid state awaiting hashing.
#[derive(Clone, Debug)]
pub struct HashJob {
    slot: MapSlot,
    generation: u64,
    revision: u64,
    snapshot: GridSnapshot,
}

impl HashJob {
    /// Serialises and hashes the captured grid.
    pub fn run(self) -> Result<HashedGrid, PersistenceError> {
        let payload = serialize_grid(&self.snapshot)?;
        let hash = digest_hex(&payload);
        Ok(HashedGrid {
            slot: self.slot,
            generation: self.generation,
            revision: self.revision,
            payload,
            hash,
        })
    }
}

/// Result of a completed hash job, ready to be committed.
#[derive(Clone, Debug)]
pub struct HashedGrid {
    slot: MapSlot,
    generation: u64,
    revision: u64,
    payload: String,
    hash: String,
}

impl HashedGrid {
    /// Content hash of the captured grid.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

/// Outcome of committing a hashed grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The grid and its hash were written to storage.
    Written,
    /// The hash matched the recorded one; nothing was written.
    Unchanged,
    /// A newer state was already committed, or the slot changed meanwhile.
    Stale,
}

/// Grid loaded from a slot together with how it was obtained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedGrid {
    /// Grid contents to restore.
    pub snapshot: GridSnapshot,
    /// Whether the contents were read from storage rather than defaulted.
    pub from_storage: bool,
}

/// Persistence system tracking the active slot and its recorded hash.
#[derive(Debug, Default)]
pub struct Persistence {
    active_slot: MapSlot,
    generation: u64,
    recorded_hash: Option<String>,
    committed_revision: Option<u64>,
    dirty_revision: Option<u64>,
}

impl Persistence {
    /// Creates a persistence system bound to the provided slot.
    #[must_use]
    pub fn new(slot: MapSlot) -> Self {
        Self {
            active_slot: slot,
            ..Self::default()
        }
    }

    /// Slot currently receiving writes.
    #[must_use]
    pub const fn active_slot(&self) -> MapSlot {
        self.active_slot
    }

    /// Hash last written to or read from the active slot.
    #[must_use]
    pub fn recorded_hash(&self) -> Option<&str> {
        self.recorded_hash.as_deref()
    }

    /// Records grid changes announced by the world.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            if let Event::GridChanged { revision } = event {
                self.mark_dirty(*revision);
            }
        }
    }

    fn mark_dirty(&mut self, revision: u64) {
        let latest = self.dirty_revision.map_or(revision, |r| r.max(revision));
        self.dirty_revision = Some(latest);
    }

    /// Captures the pending change, if any, as a hash job.
    ///
    /// The `snapshot` closure should mirror the world's `query::snapshot`
    /// helper and is only invoked when a change is pending.
    pub fn prepare<F>(&mut self, snapshot: F) -> Option<HashJob>
    where
        F: FnOnce() -> GridSnapshot,
    {
        let revision = self.dirty_revision.take()?;
        Some(HashJob {
            slot: self.active_slot,
            generation: self.generation,
            revision,
            snapshot: snapshot(),
        })
    }

    /// Writes a hashed grid to storage when it is current and differs from
    /// the recorded hash.
    pub fn commit<S>(
        &mut self,
        hashed: HashedGrid,
        store: &mut S,
    ) -> Result<CommitOutcome, PersistenceError>
    where
        S: KeyValueStore + ?Sized,
    {
        let current = hashed.slot == self.active_slot && hashed.generation == self.generation;
        let newer_committed = self
            .committed_revision
            .is_some_and(|committed| committed >= hashed.revision);
        if !current || newer_committed {
            debug!(revision = hashed.revision, "discarding stale hash job");
            return Ok(CommitOutcome::Stale);
        }

        if self.recorded_hash.as_deref() == Some(hashed.hash.as_str()) {
            self.committed_revision = Some(hashed.revision);
            debug!(revision = hashed.revision, "grid hash unchanged; skipping write");
            return Ok(CommitOutcome::Unchanged);
        }

        let keys = SlotKeys::for_slot(self.active_slot);
        let written = store
            .set(&keys.layers, &hashed.payload)
            .and_then(|()| store.set(&keys.sha, &hashed.hash));
        if let Err(error) = written {
            // Either key may already hold the new value.
            self.recorded_hash = None;
            self.mark_dirty(hashed.revision);
            return Err(error.into());
        }
        self.committed_revision = Some(hashed.revision);
        info!(
            slot = self.active_slot.get(),
            revision = hashed.revision,
            hash = %hashed.hash,
            "grid persisted"
        );
        self.recorded_hash = Some(hashed.hash);
        Ok(CommitOutcome::Written)
    }

    /// Switches to the provided slot and reads its grid.
    ///
    /// Missing or unreadable data yields the default grid, which is then
    /// written on the next commit. Pending changes and in-flight jobs from the
    /// previous slot are discarded.
    pub fn load_slot<S>(&mut self, slot: MapSlot, store: &S) -> LoadedGrid
    where
        S: KeyValueStore + ?Sized,
    {
        self.active_slot = slot;
        self.generation = self.generation.wrapping_add(1);
        self.committed_revision = None;
        self.dirty_revision = None;
        self.recorded_hash = None;

        let keys = SlotKeys::for_slot(slot);
        let stored = match store.get(&keys.layers) {
            Ok(stored) => stored,
            Err(error) => {
                warn!(
                    slot = slot.get(),
                    error = %error,
                    "failed to read stored grid; using default"
                );
                None
            }
        };
        let Some(payload) = stored else {
            debug!(slot = slot.get(), "no stored grid; using default");
            return LoadedGrid {
                snapshot: GridSnapshot::default(),
                from_storage: false,
            };
        };

        match serde_json::from_str::<GridSnapshot>(&payload) {
            Ok(snapshot) => {
                self.recorded_hash = content_hash(&snapshot).ok();
                info!(slot = slot.get(), "loaded stored grid");
                LoadedGrid {
                    snapshot,
                    from_storage: true,
                }
            }
            Err(error) => {
                warn!(
                    slot = slot.get(),
                    error = %error,
                    "stored grid is malformed; using default"
                );
                LoadedGrid {
                    snapshot: GridSnapshot::default(),
                    from_storage: false,
                }
            }
        }
    }
}
