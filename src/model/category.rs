use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Category groups and their items, addressed as `group.item`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CategoryTree(BTreeMap<String, Vec<String>>);

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: impl Into<String>, item: impl Into<String>) {
        let items = self.0.entry(group.into()).or_default();
        let item = item.into();
        if !items.contains(&item) {
            items.push(item);
        }
    }

    /// Splits on the first dot; the item part may itself contain dots.
    pub fn split(path: &str) -> Option<(&str, &str)> {
        let (group, item) = path.split_once('.')?;
        if group.is_empty() || item.is_empty() {
            return None;
        }
        Some((group, item))
    }

    pub fn contains(&self, path: &str) -> bool {
        match Self::split(path) {
            Some((group, item)) => self
                .0
                .get(group)
                .is_some_and(|items| items.iter().any(|candidate| candidate == item)),
            None => false,
        }
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(group, items)| (group.as_str(), items.as_slice()))
    }
}

impl<G: Into<String>, I: Into<String>> FromIterator<(G, I)> for CategoryTree {
    fn from_iter<T: IntoIterator<Item = (G, I)>>(iter: T) -> Self {
        let mut tree = CategoryTree::new();
        for (group, item) in iter {
            tree.insert(group, item);
        }
        tree
    }
}
