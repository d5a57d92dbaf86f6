//! Snapshot persistence.
//!
//! The whole catalog (users with their albums, photos and tags, plus the tag
//! type registry) is read and written as one [`Snapshot`]. There are no
//! partial updates: the catalog saves the full snapshot after every mutating
//! operation.
//!
//! ## Storage
//!
//! [`PhotoStore`] is the seam between the catalog and storage. The production
//! implementation, [`JsonFileStore`], keeps the snapshot as pretty-printed
//! JSON:
//!
//! ```text
//! {
//!   "version": 1,
//!   "users": [ { "username": "stock", "albums": [ ... ] } ],
//!   "tag_types": ["Item", "Person", "Place"],
//!   "restricted_tag_types": ["Place"]
//! }
//! ```
//!
//! Saves go to a sibling `*.tmp` file that is renamed over the target, so a
//! reader never observes half a snapshot. A snapshot with a different
//! `version` is refused rather than guessed at.
//!
//! ## First run
//!
//! When the file does not exist yet, `load` synthesizes the initial state:
//! the configured [`Seed`] (a stock user whose album is scanned from an image
//! directory), or an empty catalog with the stock tag types if no seed is set.

use crate::model::User;
use crate::scan::{self, ScanError, Seed};
use crate::tags::TagTypeRegistry;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Version of the snapshot format. Bump when the layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("Could not build initial snapshot: {0}")]
    Seed(#[from] ScanError),
}

/// The entire persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(flatten)]
    pub tag_types: TagTypeRegistry,
}

impl Snapshot {
    pub fn new(users: Vec<User>, tag_types: TagTypeRegistry) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            users,
            tag_types,
        }
    }

    /// No users, stock tag types.
    pub fn empty() -> Self {
        Self::new(Vec::new(), TagTypeRegistry::stock())
    }

    /// Parse and validate a snapshot from JSON text.
    pub fn from_json(content: &str) -> Result<Self, StoreError> {
        let mut snapshot: Self = serde_json::from_str(content)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        let orphans = snapshot.tag_types.repair();
        if !orphans.is_empty() {
            warn!("Restricted tag types missing from known types, re-added: {orphans:?}");
        }
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Storage for whole snapshots.
///
/// `save` replaces everything previously stored. Implementations are used
/// from a single thread; `&self` receivers let a store be shared by reference.
pub trait PhotoStore {
    /// Read the entire persisted state.
    fn load(&self) -> Result<Snapshot, StoreError>;

    /// Overwrite the entire persisted state.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

impl<S: PhotoStore + ?Sized> PhotoStore for &S {
    fn load(&self) -> Result<Snapshot, StoreError> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        (**self).save(snapshot)
    }
}

/// JSON snapshot file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    seed: Option<Seed>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed: None,
        }
    }

    /// Synthesize the initial snapshot from `seed` when the file is missing.
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn initial_snapshot(&self) -> Result<Snapshot, StoreError> {
        match &self.seed {
            Some(seed) => {
                info!(
                    "No snapshot at {}, seeding from {}",
                    self.path.display(),
                    seed.image_dir.display()
                );
                Ok(scan::seed_snapshot(seed)?)
            }
            None => {
                info!("No snapshot at {}, starting empty", self.path.display());
                Ok(Snapshot::empty())
            }
        }
    }
}

impl PhotoStore for JsonFileStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return self.initial_snapshot(),
            Err(e) => return Err(e.into()),
        };
        let snapshot = Snapshot::from_json(&content)?;
        debug!(
            "Loaded snapshot from {} ({} users)",
            self.path.display(),
            snapshot.users.len()
        );
        Ok(snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = snapshot.to_json()?;
        let tmp = self.temp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Saved snapshot to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store. Holds the last saved snapshot and counts saves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: RefCell<Option<Snapshot>>,
    saves: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose first `load` returns `snapshot`.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: RefCell::new(Some(snapshot)),
            saves: Cell::new(0),
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.get()
    }

    /// The most recently stored snapshot, if any.
    pub fn stored(&self) -> Option<Snapshot> {
        self.snapshot.borrow().clone()
    }
}

impl PhotoStore for MemoryStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        Ok(self.snapshot.borrow().clone().unwrap_or_default())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.snapshot.borrow_mut() = Some(snapshot.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
