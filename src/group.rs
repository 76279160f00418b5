//! Ordered collections of capability items of one kind.

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::{BoardError, BoardResult};
use crate::items::{CapabilityItem, CapabilityKind, ItemId};

/// An ordered collection of items of one capability kind.
///
/// Item order reflects construction order and is what discovery reports.
pub struct CapabilityGroup<I> {
    kind: CapabilityKind,
    items: Vec<I>,
}

impl<I: CapabilityItem> CapabilityGroup<I> {
    pub(crate) fn new(kind: CapabilityKind, items: Vec<I>) -> Self {
        Self { kind, items }
    }

    /// The capability kind this group holds.
    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    /// The item ids, in construction order.
    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(CapabilityItem::id).collect()
    }

    /// Number of items in the group.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the group holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Borrow the item with the given id.
    pub fn item(&self, id: ItemId) -> BoardResult<&I> {
        self.items
            .iter()
            .find(|item| item.id() == id)
            .ok_or(BoardError::NoSuchItem { kind: self.kind, id })
    }

    /// Mutably borrow the item with the given id.
    pub fn item_mut(&mut self, id: ItemId) -> BoardResult<&mut I> {
        let kind = self.kind;
        self.items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or(BoardError::NoSuchItem { kind, id })
    }

    /// Iterate over the items in construction order.
    pub fn iter(&self) -> impl Iterator<Item = &I> {
        self.items.iter()
    }

    /// Stop every item, best-effort.
    ///
    /// A failing item is logged and its error collected, but the sweep
    /// always reaches every member — shutdown must not leave the remaining
    /// channels uncommanded. Collected failures surface as
    /// [`BoardError::Shutdown`].
    pub fn stop_all(&mut self) -> BoardResult<()> {
        let mut failures = Vec::new();
        for item in &mut self.items {
            if let Err(err) = item.stop() {
                warn!(kind = %self.kind, id = item.id(), error = %err, "failed to stop item, continuing");
                failures.push(err);
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(BoardError::Shutdown(failures))
        }
    }

    /// Snapshot every item's configuration, keyed by id.
    pub fn extract_config(&self) -> BTreeMap<ItemId, I::Config> {
        self.items
            .iter()
            .map(|item| (item.id(), item.extract_config()))
            .collect()
    }

    /// Merge the given records into matching items.
    ///
    /// Ids not present on this board are warned about and skipped, so a
    /// configuration authored for a superset board still applies cleanly.
    /// Ids absent from the mapping are left alone.
    pub fn apply_config(&mut self, records: &BTreeMap<ItemId, I::Config>) -> BoardResult<()> {
        for (&id, record) in records {
            match self.items.iter_mut().find(|item| item.id() == id) {
                Some(item) => item.apply_config(record)?,
                None => {
                    warn!(kind = %self.kind, id, "config contained entry for unknown item id");
                }
            }
        }
        Ok(())
    }
}
