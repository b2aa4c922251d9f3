//! Name-keyed comparison of sub-object lists
//!
//! Updates always send the complete desired lists, so this is only used to
//! describe a change (logs, plan output), never to build partial payloads.

use std::collections::HashMap;

/// Differences between two ordered lists of named sub-objects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListChanges {
    /// Names only present in the new list, in new-list order
    pub added: Vec<String>,
    /// Names only present in the old list, in old-list order
    pub removed: Vec<String>,
    /// Names present in both lists whose other fields differ
    pub modified: Vec<String>,
    /// Whether the names shared by both lists appear in a different order
    pub reordered: bool,
}

impl ListChanges {
    /// Compare two lists using `name` as the identity of each element
    pub fn between<T, F>(old: &[T], new: &[T], name: F) -> Self
    where
        T: PartialEq,
        F: Fn(&T) -> &str,
    {
        let old_by_name: HashMap<&str, &T> = old.iter().map(|item| (name(item), item)).collect();
        let new_by_name: HashMap<&str, &T> = new.iter().map(|item| (name(item), item)).collect();

        let mut changes = Self::default();

        for item in new {
            match old_by_name.get(name(item)) {
                None => changes.added.push(name(item).to_string()),
                Some(previous) if *previous != item => {
                    changes.modified.push(name(item).to_string())
                }
                Some(_) => {}
            }
        }

        for item in old {
            if !new_by_name.contains_key(name(item)) {
                changes.removed.push(name(item).to_string());
            }
        }

        let shared_old: Vec<&str> = old
            .iter()
            .map(|item| name(item))
            .filter(|n| new_by_name.contains_key(n))
            .collect();
        let shared_new: Vec<&str> = new
            .iter()
            .map(|item| name(item))
            .filter(|n| old_by_name.contains_key(n))
            .collect();
        changes.reordered = shared_old != shared_new;

        changes
    }

    /// Whether the lists are equivalent
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && !self.reordered
    }
}

impl std::fmt::Display for ListChanges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "added={:?} removed={:?} modified={:?} reordered={}",
            self.added, self.removed, self.modified, self.reordered
        )
    }
}
