//! Entity directory: `[{"id": "4", "name": "Afghanistan", "region": "Asia"}, ...]`.

use std::collections::HashMap;

use foundation::EntityId;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::RecordError;

/// Label used for ids without a directory entry.
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub id: EntityId,
    pub name: String,
    pub region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectoryRecord {
    id: Value,
    name: String,
    #[serde(default)]
    region: Option<String>,
}

/// Bidirectional id <-> name mapping plus region lookup. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct EntityDirectory {
    entries: Vec<DirectoryEntry>,
    by_id: HashMap<EntityId, usize>,
    by_name: HashMap<String, usize>,
}

impl EntityDirectory {
    pub fn parse_json(payload: &str) -> Result<Self, RecordError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| RecordError::Json(e.to_string()))?;
        let Value::Array(items) = value else {
            return Err(RecordError::NotAnArray);
        };
        if items.is_empty() {
            return Err(RecordError::Empty);
        }

        let mut entries = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let rec: DirectoryRecord =
                serde_json::from_value(item).map_err(|e| RecordError::Json(e.to_string()))?;
            let id = match &rec.id {
                Value::String(s) => EntityId::new(s.trim()),
                Value::Number(n) => EntityId::new(n.to_string()),
                _ => {
                    warn!(index = i, "skipping directory entry with invalid id");
                    continue;
                }
            };
            entries.push(DirectoryEntry {
                id,
                name: rec.name,
                region: rec.region.filter(|r| !r.trim().is_empty()),
            });
        }
        Ok(Self::from_entries(entries))
    }

    /// First entry wins on duplicate ids or names.
    pub fn from_entries(entries: Vec<DirectoryEntry>) -> Self {
        let mut dir = EntityDirectory::default();
        for entry in entries {
            if dir.by_id.contains_key(&entry.id) {
                warn!(id = %entry.id, "duplicate directory id");
                continue;
            }
            let idx = dir.entries.len();
            dir.by_id.insert(entry.id.clone(), idx);
            dir.by_name.entry(entry.name.clone()).or_insert(idx);
            dir.entries.push(entry);
        }
        dir
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &EntityId) -> Option<&DirectoryEntry> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn name(&self, id: &EntityId) -> Option<&str> {
        self.get(id).map(|e| e.name.as_str())
    }

    /// Display label, falling back to [`UNKNOWN_LABEL`].
    pub fn label(&self, id: &EntityId) -> &str {
        self.name(id).unwrap_or(UNKNOWN_LABEL)
    }

    pub fn region(&self, id: &EntityId) -> Option<&str> {
        self.get(id).and_then(|e| e.region.as_deref())
    }

    pub fn id_for_name(&self, name: &str) -> Option<&EntityId> {
        self.by_name.get(name.trim()).map(|&i| &self.entries[i].id)
    }

    /// Resolves search input: a display name first, then a raw id.
    pub fn resolve(&self, name_or_id: &str) -> Option<&EntityId> {
        let key = name_or_id.trim();
        self.id_for_name(key)
            .or_else(|| self.by_id.get_key_value(key).map(|(id, _)| id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"id": 360, "name": "Indonesia", "region": "Asia"},
        {"id": "4", "name": "Afghanistan", "region": "Asia"},
        {"id": "999", "name": "Nowhere", "region": ""}
    ]"#;

    #[test]
    fn lookups_both_directions() {
        let dir = EntityDirectory::parse_json(SAMPLE).expect("parse");
        let indo = EntityId::new("360");
        assert_eq!(dir.name(&indo), Some("Indonesia"));
        assert_eq!(dir.region(&indo), Some("Asia"));
        assert_eq!(dir.id_for_name("Afghanistan"), Some(&EntityId::new("4")));
        assert_eq!(dir.region(&EntityId::new("999")), None);
    }

    #[test]
    fn resolve_prefers_names_then_ids() {
        let dir = EntityDirectory::parse_json(SAMPLE).expect("parse");
        assert_eq!(dir.resolve(" Indonesia "), Some(&EntityId::new("360")));
        assert_eq!(dir.resolve("4"), Some(&EntityId::new("4")));
        assert_eq!(dir.resolve("Atlantis"), None);
    }

    #[test]
    fn missing_entries_render_placeholder() {
        let dir = EntityDirectory::parse_json(SAMPLE).expect("parse");
        assert_eq!(dir.label(&EntityId::new("12345")), UNKNOWN_LABEL);
    }

    #[test]
    fn rejects_empty_and_malformed() {
        assert_eq!(
            EntityDirectory::parse_json("[]").unwrap_err(),
            RecordError::Empty
        );
        assert!(matches!(
            EntityDirectory::parse_json(r#"[{"id": "1"}]"#),
            Err(RecordError::Json(_))
        ));
    }
}
