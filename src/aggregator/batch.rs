//! Per-cycle batch of novel content items

use crate::edge::ContentItem;
use std::collections::HashSet;

/// Items selected in one cycle, unique by piece CID, in selection order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleBatch {
    items: Vec<ContentItem>,
    ids: HashSet<String>,
}

impl CycleBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item unless its piece CID is already in the batch
    ///
    /// The first item wins; a later duplicate is dropped, not merged.
    pub fn push(&mut self, item: ContentItem) -> bool {
        if self.ids.contains(&item.piece_cid) {
            return false;
        }
        self.ids.insert(item.piece_cid.clone());
        self.items.push(item);
        true
    }

    pub fn contains(&self, piece_cid: &str) -> bool {
        self.ids.contains(piece_cid)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContentItem> {
        self.items.iter()
    }

    /// Piece CIDs in selection order
    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.piece_cid.as_str()).collect()
    }

    pub fn into_items(self) -> Vec<ContentItem> {
        self.items
    }
}

impl<'a> IntoIterator for &'a CycleBatch {
    type Item = &'a ContentItem;
    type IntoIter = std::slice::Iter<'a, ContentItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
