//! Key-set diffing of maps.

use std::collections::BTreeMap;

/// Keys added, removed and updated between two maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectsDiff<K> {
    pub added: Vec<K>,
    pub removed: Vec<K>,
    /// Keys present in both maps whose values differ
    pub updated: Vec<K>,
}

impl<K> ObjectsDiff<K> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

pub fn objects_diff<K, V>(old: &BTreeMap<K, V>, new: &BTreeMap<K, V>) -> ObjectsDiff<K>
where
    K: Ord + Clone,
    V: PartialEq,
{
    let mut diff = ObjectsDiff {
        added: Vec::new(),
        removed: Vec::new(),
        updated: Vec::new(),
    };

    for (key, value) in new {
        match old.get(key) {
            None => diff.added.push(key.clone()),
            Some(old_value) if old_value != value => diff.updated.push(key.clone()),
            Some(_) => {}
        }
    }
    diff.removed = old
        .keys()
        .filter(|key| !new.contains_key(*key))
        .cloned()
        .collect();

    diff
}
