// Data shapes shared by the submit, poll and reconcile stages. Nothing here
// talks to the network or the filesystem.

use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;

/// A local image waiting to be uploaded. `name` is the display name sent to
/// the API and the key used in every output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    pub path: PathBuf,
}

/// An upload the server accepted but has not finished processing.
/// Field names match the failed-polls file format.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    pub name: String,
    pub operation_url: String,
}

impl PendingOperation {
    pub fn new(name: impl Into<String>, operation_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operation_url: operation_url.into(),
        }
    }
}

/// Outcome of polling one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved { asset_id: String },
    /// Attempt budget ran out; the operation can be polled again later.
    Unresolved(PendingOperation),
    /// The server reported a terminal failure. Not retried.
    Errored { reason: String },
}

/// Name → asset id, kept in resolution order.
///
/// Serializes as a JSON object. Inserting an existing name replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAssets(Vec<(String, String)>);

impl ResolvedAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, asset_id: String) {
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = asset_id,
            None => self.0.push((name, asset_id)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| id.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, id)| (n.as_str(), id.as_str()))
    }
}

impl Serialize for ResolvedAssets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(n, id)| (n, id)))
    }
}

/// Aggregate of one reconciliation pass. Every name handed to the
/// reconciler ends up in exactly one of the three collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub resolved: ResolvedAssets,
    pub unresolved: Vec<PendingOperation>,
    /// Names dropped after a terminal server-side failure. Not persisted.
    pub errored: Vec<String>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.resolved.len() + self.unresolved.len() + self.errored.len()
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty() && self.errored.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_assets_keeps_order_and_replaces() {
        let mut assets = ResolvedAssets::new();
        assets.insert("b".into(), "1".into());
        assets.insert("a".into(), "2".into());
        assets.insert("b".into(), "3".into());

        assert_eq!(assets.len(), 2);
        assert_eq!(assets.get("b"), Some("3"));
        let names: Vec<&str> = assets.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_resolved_assets_serializes_as_object() {
        let mut assets = ResolvedAssets::new();
        assets.insert("Tree".into(), "123".into());
        let json = serde_json::to_value(&assets).unwrap();
        assert_eq!(json, serde_json::json!({ "Tree": "123" }));
    }

    #[test]
    fn test_pending_operation_field_names() {
        let op: PendingOperation =
            serde_json::from_str(r#"{"name":"Rock","operation_url":"https://x/operations/1"}"#)
                .unwrap();
        assert_eq!(op, PendingOperation::new("Rock", "https://x/operations/1"));
    }
}
