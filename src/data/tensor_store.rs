//! Per-unit tensor persistence
//!
//! Each unit's home/away history blocks and label live in one JSON file
//! addressed by unit id. Writing happens only from the pipeline (initial
//! derivation or an explicit re-run); registry label updates never touch
//! stored tensors. A missing id is a normal "not ready" condition.

use crate::data::registry::UnitId;
use crate::features::HistoryTensor;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The persisted artifact for one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTensors {
    /// Home team's history block, [n, F]
    pub home: HistoryTensor,
    /// Away team's history block, [n, F]
    pub away: HistoryTensor,
    /// Outcome class label; absent for prediction units
    pub label: Option<i64>,
}

/// Durable per-unit tensor storage under one root directory
pub struct TensorStore {
    root: PathBuf,
}

impl TensorStore {
    /// Open (creating if needed) a store rooted at the given directory
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(TensorStore { root })
    }

    fn unit_path(&self, unit_id: &UnitId) -> PathBuf {
        self.root.join(unit_id.as_str()).join("tensors.json")
    }

    /// Write (or deterministically overwrite) a unit's tensors
    pub fn save(&self, unit_id: &UnitId, tensors: &UnitTensors) -> Result<()> {
        let path = self.unit_path(unit_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec(tensors)?;
        fs::write(&path, bytes)?;
        Ok(())
    }

    /// Load a unit's tensors; Ok(None) when nothing is stored yet
    pub fn load(&self, unit_id: &UnitId) -> Result<Option<UnitTensors>> {
        let path = self.unit_path(unit_id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Are tensors stored for this unit?
    pub fn contains(&self, unit_id: &UnitId) -> bool {
        self.unit_path(unit_id).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureRow;
    use crate::test_support::{played_match, TempDir};

    fn tensors(label: Option<i64>) -> UnitTensors {
        let m = played_match("2016", "Milan", "Roma", "2024-03-01", 2, 1);
        let row = FeatureRow::from_match(&m, "Milan").unwrap();
        UnitTensors {
            home: HistoryTensor::from_rows(&[row, row]),
            away: HistoryTensor::from_rows(&[row, row]),
            label,
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new("tensor-store");
        let store = TensorStore::open(dir.path()).unwrap();
        let id = UnitId::derive("2016", "Milan", "Roma");

        let unit = tensors(Some(0));
        store.save(&id, &unit).unwrap();
        assert!(store.contains(&id));

        let loaded = store.load(&id).unwrap().unwrap();
        assert_eq!(loaded, unit);
    }

    #[test]
    fn test_missing_id_is_not_ready() {
        let dir = TempDir::new("tensor-store");
        let store = TensorStore::open(dir.path()).unwrap();
        let id = UnitId::derive("2016", "Milan", "Roma");

        assert!(!store.contains(&id));
        assert!(store.load(&id).unwrap().is_none());
    }

    #[test]
    fn test_overwrite_is_deterministic() {
        let dir = TempDir::new("tensor-store");
        let store = TensorStore::open(dir.path()).unwrap();
        let id = UnitId::derive("2016", "Milan", "Roma");

        store.save(&id, &tensors(None)).unwrap();
        let first = fs::read(store.unit_path(&id)).unwrap();
        store.save(&id, &tensors(None)).unwrap();
        let second = fs::read(store.unit_path(&id)).unwrap();
        assert_eq!(first, second);
    }
}
