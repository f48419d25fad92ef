//! # Sync Wire Format
//!
//! Snapshot bodies travel as JSON. Pushes are always wrapped:
//! ```json
//! { "snapshot": { "version": 2, "customers": [...], ... } }
//! ```
//! Pulls accept the same envelope or a bare snapshot object, so a plain
//! JSON file served over HTTP works as a remote.

use barberia_core::snapshot::decode_value;
use barberia_core::Snapshot;
use serde::Serialize;

use crate::error::{SyncError, SyncResult};

/// Outgoing body for a push.
#[derive(Debug, Serialize)]
pub struct SnapshotEnvelope<'a> {
    pub snapshot: &'a Snapshot,
}

/// Extracts and version-checks the snapshot in a pulled body.
pub fn decode_body(body: &str) -> SyncResult<Snapshot> {
    let mut value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| SyncError::DeserializationFailed(e.to_string()))?;

    let inner = match value.get_mut("snapshot") {
        Some(inner) if inner.is_object() => inner.take(),
        _ => value,
    };

    Ok(decode_value(inner)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use barberia_core::DATA_VERSION;

    #[test]
    fn test_envelope_and_bare_bodies() {
        let snapshot = Snapshot::seeded();
        let wrapped = serde_json::to_string(&SnapshotEnvelope {
            snapshot: &snapshot,
        })
        .unwrap();
        let bare = serde_json::to_string(&snapshot).unwrap();

        assert_eq!(decode_body(&wrapped).unwrap(), snapshot);
        assert_eq!(decode_body(&bare).unwrap(), snapshot);
    }

    #[test]
    fn test_old_version_rejected() {
        let mut value = serde_json::to_value(Snapshot::seeded()).unwrap();
        value["version"] = serde_json::Value::from(DATA_VERSION + 1);
        let body = serde_json::json!({ "snapshot": value }).to_string();

        assert!(matches!(
            decode_body(&body),
            Err(SyncError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            decode_body("<html>502</html>"),
            Err(SyncError::DeserializationFailed(_))
        ));
        assert!(decode_body("{\"snapshot\": null}").is_err());
    }
}
