//! Store snapshots on disk.
//!
//! The whole [`Store`] is written as JSON together with a SHA-256 of the
//! serialized state. The state is kept as raw text so the checksum covers
//! exactly the bytes on disk:
//!
//! ```json
//! { "version": 1, "checksum": "9f86d0…", "state": { "course": [], ... } }
//! ```
//!
//! A snapshot that cannot be read, fails its checksum or no longer matches
//! the state layout is ignored and the caller falls back to defaults.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;
use std::fs;
use std::path::Path;

use super::checksum::{calculate_checksum, verify_checksum};
use super::Store;
use crate::error::{decode_value, ClientError, ClientResult};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    checksum: String,
    state: Box<RawValue>,
}

/// Write `store` to `path`, replacing any previous snapshot.
pub fn save_snapshot(path: &Path, store: &Store) -> ClientResult<()> {
    let text = serde_json::to_string(store)
        .map_err(|e| ClientError::Storage(format!("Failed to serialize state: {}", e)))?;
    let checksum = calculate_checksum(&text);
    let state = RawValue::from_string(text)
        .map_err(|e| ClientError::Storage(format!("Failed to serialize state: {}", e)))?;
    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        checksum,
        state,
    };
    let content = serde_json::to_string(&snapshot)
        .map_err(|e| ClientError::Storage(format!("Failed to serialize snapshot: {}", e)))?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| {
            ClientError::Storage(format!("Failed to create {}: {}", dir.display(), e))
        })?;
    }

    // Write next to the target and rename so a crash never leaves half a file.
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content)
        .map_err(|e| ClientError::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
    fs::rename(&tmp, path).map_err(|e| {
        ClientError::Storage(format!("Failed to replace {}: {}", path.display(), e))
    })?;
    Ok(())
}

/// Read a snapshot, checking its integrity.
///
/// # Returns
/// * `Ok(None)` if there is no snapshot at `path`
/// * `Ok(Some(store))` for an intact snapshot
/// * `Err(ClientError::Storage)` or `Err(ClientError::Decode)` otherwise
pub fn read_snapshot(path: &Path) -> ClientResult<Option<Store>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ClientError::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    let snapshot: Snapshot = serde_json::from_str(&content)
        .map_err(|e| ClientError::Storage(format!("Malformed snapshot: {}", e)))?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(ClientError::Storage(format!(
            "Unsupported snapshot version {}",
            snapshot.version
        )));
    }
    if !verify_checksum(snapshot.state.get(), &snapshot.checksum) {
        return Err(ClientError::Storage("Snapshot checksum mismatch".to_string()));
    }

    let state: Value = serde_json::from_str(snapshot.state.get())
        .map_err(|e| ClientError::Storage(format!("Malformed snapshot state: {}", e)))?;
    decode_value(state).map(Some)
}

/// Load a snapshot, logging and discarding anything unusable.
pub fn load_snapshot(path: &Path) -> Option<Store> {
    match read_snapshot(path) {
        Ok(Some(store)) => {
            log::info!("Restored state from {}", path.display());
            Some(store)
        }
        Ok(None) => None,
        Err(e) => {
            log::warn!("Discarding state snapshot {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::SettingEdit;
    use crate::models::task::Task;
    use crate::store::Action;
    use serde_json::json;

    #[test]
    fn test_save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let mut store = Store::default();
        store.dispatch(Action::EditSetting(SettingEdit::Term("20201".into())));

        save_snapshot(&path, &store).unwrap();
        let restored = read_snapshot(&path).unwrap().unwrap();
        assert_eq!(restored, store);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_fractional_scores_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let scores = [0.6648434057330471, 4.137357250044196, 0.1 + 0.2, 1.0 / 3.0, 12.5];

        for (i, score) in scores.iter().enumerate() {
            let task: Task = serde_json::from_value(json!({
                "id": i,
                "status": "DN",
                "schedules": [{
                    "id": 7,
                    "total_score": score,
                    "early_score": score / 7.0,
                    "break_score": -score
                }]
            }))
            .unwrap();
            let mut store = Store::default();
            store.dispatch(Action::SaveTaskResult(Some(task)));

            save_snapshot(&path, &store).unwrap();
            let restored = read_snapshot(&path).unwrap().unwrap();
            assert_eq!(restored, store, "score {}", score);
        }
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_snapshot(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn test_tampered_snapshot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        save_snapshot(&path, &Store::default()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        fs::write(&path, content.replace("20203", "20201")).unwrap();

        assert!(matches!(read_snapshot(&path), Err(ClientError::Storage(_))));
        assert!(load_snapshot(&path).is_none());
    }

    #[test]
    fn test_garbage_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();
        assert!(load_snapshot(&path).is_none());
    }
}
