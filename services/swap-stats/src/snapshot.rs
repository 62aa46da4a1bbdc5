//! Point-in-time snapshots of every venue's tables
//!
//! State is serialized with bincode over `BTreeMap`s, so the SHA-256
//! checksum is deterministic for equal state. Files are written to a
//! temporary path, synced, then renamed into place.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use types::ids::VenueId;

use crate::store::VenueTables;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Integrity check failed: expected {expected}, got {actual}")]
    IntegrityFailure { expected: String, actual: String },

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),
}

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub version: u32,
    /// Unix seconds when the snapshot was taken.
    pub taken_at: i64,
    pub venues: BTreeMap<VenueId, VenueTables>,
    /// SHA-256 of the serialized venue tables, hex.
    pub checksum: String,
}

impl StatsSnapshot {
    pub fn new(taken_at: i64, venues: BTreeMap<VenueId, VenueTables>) -> Result<Self, SnapshotError> {
        let checksum = compute_hash(&venues)?;
        Ok(Self {
            version: SNAPSHOT_VERSION,
            taken_at,
            venues,
            checksum,
        })
    }

    pub fn verify_integrity(&self) -> Result<(), SnapshotError> {
        let actual = compute_hash(&self.venues)?;
        if actual != self.checksum {
            return Err(SnapshotError::IntegrityFailure {
                expected: self.checksum.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Write atomically to `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<PathBuf, SnapshotError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = bincode::serialize(self).map_err(|e| SnapshotError::Serialization(e.to_string()))?;

        let mut tmp_path = path.as_os_str().to_owned();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;

        Ok(path.to_path_buf())
    }

    /// Load from `path`, checking version and checksum.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let snapshot: StatsSnapshot =
            bincode::deserialize(&data).map_err(|e| SnapshotError::Serialization(e.to_string()))?;

        if snapshot.version > SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        snapshot.verify_integrity()?;

        Ok(snapshot)
    }
}

fn compute_hash(venues: &BTreeMap<VenueId, VenueTables>) -> Result<String, SnapshotError> {
    let bytes = bincode::serialize(venues).map_err(|e| SnapshotError::Serialization(e.to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
