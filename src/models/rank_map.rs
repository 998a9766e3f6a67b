use std::collections::BTreeMap;

use crate::models::Rank;

/// Append-or-create multimap: the one grouping primitive behind both rank
/// and clan accumulation. Keys are kept in `Ord` order; values keep
/// insertion order within a key.
#[derive(Debug, Clone)]
pub struct AppendMap<K: Ord> {
    inner: BTreeMap<K, Vec<String>>,
}

impl<K: Ord> Default for AppendMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> AppendMap<K> {
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, key: K, value: String) {
        self.inner.entry(key).or_default().push(value);
    }

    pub fn get(&self, key: &K) -> Option<&[String]> {
        self.inner.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &[String])> {
        self.inner.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Accumulates classified members per rank during a pass.
#[derive(Debug, Clone, Default)]
pub struct RankMap {
    groups: AppendMap<Rank>,
}

impl RankMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `label` to the rank's member list. An empty label is a no-op
    /// and never creates a tier entry; returns whether a member was added,
    /// so callers can keep a running member count.
    pub fn add(&mut self, rank: Rank, label: &str) -> bool {
        if label.is_empty() {
            return false;
        }
        self.groups.push(rank, label.to_string());
        true
    }

    /// Member labels for one rank, joined by `", "`.
    pub fn members(&self, rank: Rank) -> Option<String> {
        self.groups.get(&rank).map(|labels| labels.join(", "))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Rank, &[String])> {
        self.groups.iter().map(|(rank, labels)| (*rank, labels))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Generic string-keyed grouping (clan rosters and the like).
#[derive(Debug, Clone, Default)]
pub struct GroupMap {
    groups: AppendMap<String>,
}

impl GroupMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` under `key`, creating the list on first use.
    pub fn add_raw(&mut self, key: &str, value: String) {
        self.groups.push(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.groups.get(&key.to_string())
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&String, &[String])> {
        self.groups.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_appends_with_separator() {
        let mut map = RankMap::new();
        assert!(map.add(Rank::Ranked(2), "Alice"));
        assert!(map.add(Rank::Ranked(2), "Bob"));

        assert_eq!(map.members(Rank::Ranked(2)), Some("Alice, Bob".to_string()));
    }

    #[test]
    fn test_empty_label_never_creates_an_entry() {
        let mut map = RankMap::new();
        assert!(!map.add(Rank::Ranked(1), ""));
        assert!(map.is_empty());
        assert_eq!(map.members(Rank::Ranked(1)), None);
    }

    #[test]
    fn test_add_raw_creates_list_on_first_use() {
        let mut map = GroupMap::new();
        map.add_raw("Miners", "Alice".to_string());
        map.add_raw("Miners", "Bob".to_string());
        map.add_raw("Farmers", "Carol".to_string());

        assert_eq!(
            map.get("Miners"),
            Some(["Alice".to_string(), "Bob".to_string()].as_slice())
        );
        assert_eq!(map.get("Farmers").map(<[String]>::len), Some(1));
    }
}
