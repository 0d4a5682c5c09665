//! Membership list embedded on each card record
//!
//! Every card row carries a `store_collection` TEXT column holding a JSON
//! array of `{id, name}` entries, one per collection the card belongs to.
//! The name is a snapshot taken when the link is made; rename and delete
//! flows rewrite it through the helpers here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One entry in a card's membership list
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoreCollectionEntry {
    pub id: String,
    pub name: String,
}

/// Parse a stored membership column. Malformed or unexpected JSON reads
/// as an empty list.
pub fn parse_membership(raw: &str) -> Vec<StoreCollectionEntry> {
    serde_json::from_str(raw).unwrap_or_default()
}

pub fn serialize_membership(entries: &[StoreCollectionEntry]) -> String {
    serde_json::to_string(entries).unwrap_or_else(|_| "[]".to_string())
}

pub fn contains_collection(entries: &[StoreCollectionEntry], collection_id: &str) -> bool {
    entries.iter().any(|e| e.id == collection_id)
}

/// Append an entry unless the collection is already linked.
/// Returns false when the entry was already present.
pub fn add_entry(entries: &mut Vec<StoreCollectionEntry>, collection_id: &str, name: &str) -> bool {
    if contains_collection(entries, collection_id) {
        return false;
    }
    entries.push(StoreCollectionEntry {
        id: collection_id.to_string(),
        name: name.to_string(),
    });
    true
}

/// Drop the entry for a collection. Returns false when no entry matched.
pub fn remove_entry(entries: &mut Vec<StoreCollectionEntry>, collection_id: &str) -> bool {
    let before = entries.len();
    entries.retain(|e| e.id != collection_id);
    entries.len() != before
}

/// Rewrite the cached name on every entry referencing the collection.
/// Returns false when no entry matched.
pub fn rename_entries(
    entries: &mut [StoreCollectionEntry],
    collection_id: &str,
    new_name: &str,
) -> bool {
    let mut changed = false;
    for entry in entries.iter_mut() {
        if entry.id == collection_id {
            entry.name = new_name.to_string();
            changed = true;
        }
    }
    changed
}

/// Tally how many of the given membership columns reference each
/// collection id. Input is the raw TEXT column per card.
pub fn membership_counts(raw_lists: &[String]) -> HashMap<String, i64> {
    let mut counts: HashMap<String, i64> = HashMap::new();
    for raw in raw_lists {
        for entry in parse_membership(raw) {
            *counts.entry(entry.id).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str) -> StoreCollectionEntry {
        StoreCollectionEntry {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_parse_valid_membership() {
        let raw = r#"[{"id":"C_ABC123","name":"All"},{"id":"C_DEF456","name":"Binder"}]"#;
        let entries = parse_membership(raw);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], entry("C_ABC123", "All"));
        assert_eq!(entries[1].name, "Binder");
    }

    #[test]
    fn test_parse_malformed_membership_reads_empty() {
        assert!(parse_membership("not json").is_empty());
        assert!(parse_membership("{\"id\":\"x\"}").is_empty());
        assert!(parse_membership("").is_empty());
    }

    #[test]
    fn test_add_entry_is_idempotent() {
        let mut entries = vec![entry("C_ONE", "All")];

        assert!(add_entry(&mut entries, "C_TWO", "Binder"));
        assert_eq!(entries.len(), 2);

        // Second add of the same collection is a no-op
        assert!(!add_entry(&mut entries, "C_TWO", "Binder"));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_remove_entry() {
        let mut entries = vec![entry("C_ONE", "All"), entry("C_TWO", "Binder")];

        assert!(remove_entry(&mut entries, "C_TWO"));
        assert_eq!(entries.len(), 1);
        assert!(!contains_collection(&entries, "C_TWO"));

        assert!(!remove_entry(&mut entries, "C_TWO"));
    }

    #[test]
    fn test_remove_then_re_add_round_trip() {
        let mut entries = vec![entry("C_ONE", "All"), entry("C_TWO", "Binder")];

        remove_entry(&mut entries, "C_TWO");
        add_entry(&mut entries, "C_TWO", "Binder");

        assert_eq!(entries.len(), 2);
        assert!(contains_collection(&entries, "C_TWO"));
    }

    #[test]
    fn test_rename_entries() {
        let mut entries = vec![entry("C_ONE", "All"), entry("C_TWO", "Old Name")];

        assert!(rename_entries(&mut entries, "C_TWO", "New Name"));
        assert_eq!(entries[1].name, "New Name");
        assert_eq!(entries[0].name, "All");

        assert!(!rename_entries(&mut entries, "C_MISSING", "Whatever"));
    }

    #[test]
    fn test_membership_counts() {
        let lists = vec![
            r#"[{"id":"C_ONE","name":"All"}]"#.to_string(),
            r#"[{"id":"C_ONE","name":"All"},{"id":"C_TWO","name":"Binder"}]"#.to_string(),
            "[]".to_string(),
            "garbage".to_string(),
        ];

        let counts = membership_counts(&lists);

        assert_eq!(counts.get("C_ONE"), Some(&2));
        assert_eq!(counts.get("C_TWO"), Some(&1));
        assert_eq!(counts.get("C_MISSING"), None);
    }

    #[test]
    fn test_serialize_round_trip() {
        let entries = vec![entry("C_ONE", "All")];
        let raw = serialize_membership(&entries);

        assert_eq!(parse_membership(&raw), entries);
    }
}
