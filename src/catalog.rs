//! # Link collection catalog
//!
//! A HID touchpad does not say "this is contact #3". Instead, it exposes a pile of value and button
//! capabilities, each tagged with the *link collection* it belongs to, and leaves it to us to notice
//! that collection 2 happens to have an X, a Y, a contact ID and a tip switch. The catalog is where those
//! observations pile up, one record per collection id.

use std::collections::HashMap;

bitflags::bitflags! {
    /// Which touch-relevant usages a link collection was seen to carry.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
    pub struct CollectionUsages: u16 {
        const X = 1;
        const Y = 2;
        const CONTACT_ID = 4;
        const TIP_SWITCH = 8;
        const CONTACT_COUNT = 16;
        // Discovered, never consumed.
        const CONFIDENCE = 32;
        const WIDTH = 64;
        const HEIGHT = 128;
        const PRESSURE = 256;
    }
}
impl CollectionUsages {
    /// Everything a collection needs to describe one contact.
    pub const CONTACT: Self = Self::X
        .union(Self::Y)
        .union(Self::CONTACT_ID)
        .union(Self::TIP_SWITCH);
}

/// Physical bounds of a collection, in whatever physical unit the descriptor declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}
impl Rect {
    /// Not yet observed. All negative, so never [valid](Rect::is_valid).
    pub const UNSET: Self = Self {
        left: -1,
        top: -1,
        right: -1,
        bottom: -1,
    };
    /// All four bounds are non-negative.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.left >= 0 && self.top >= 0 && self.right >= 0 && self.bottom >= 0
    }
}
impl Default for Rect {
    fn default() -> Self {
        Self::UNSET
    }
}

/// Everything learned about one link collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkCollectionCapability {
    /// Link collection id, unique within a device. This is what report reads are keyed by.
    pub id: u16,
    pub rect: Rect,
    pub usages: CollectionUsages,
}
impl LinkCollectionCapability {
    /// A fresh record with nothing known about it.
    #[must_use]
    pub fn new(id: u16) -> Self {
        Self {
            id,
            rect: Rect::UNSET,
            usages: CollectionUsages::empty(),
        }
    }
    #[must_use]
    pub fn has_x(&self) -> bool {
        self.usages.contains(CollectionUsages::X)
    }
    #[must_use]
    pub fn has_y(&self) -> bool {
        self.usages.contains(CollectionUsages::Y)
    }
    #[must_use]
    pub fn has_contact_id(&self) -> bool {
        self.usages.contains(CollectionUsages::CONTACT_ID)
    }
    #[must_use]
    pub fn has_tip_switch(&self) -> bool {
        self.usages.contains(CollectionUsages::TIP_SWITCH)
    }
    #[must_use]
    pub fn has_contact_count(&self) -> bool {
        self.usages.contains(CollectionUsages::CONTACT_COUNT)
    }
    #[must_use]
    pub fn has_confidence(&self) -> bool {
        self.usages.contains(CollectionUsages::CONFIDENCE)
    }
    #[must_use]
    pub fn has_width(&self) -> bool {
        self.usages.contains(CollectionUsages::WIDTH)
    }
    #[must_use]
    pub fn has_height(&self) -> bool {
        self.usages.contains(CollectionUsages::HEIGHT)
    }
    #[must_use]
    pub fn has_pressure(&self) -> bool {
        self.usages.contains(CollectionUsages::PRESSURE)
    }
    /// Carries a whole contact (X, Y, contact id, tip switch) and has real bounds.
    #[must_use]
    pub fn is_touch_collection(&self) -> bool {
        self.usages.contains(CollectionUsages::CONTACT) && self.rect.is_valid()
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogError {
    /// The record storage and the id index disagree. This is a bug in whoever mutated the catalog,
    /// not bad data from the device.
    #[error("catalog holds {records} records but indexes {indexed}")]
    Inconsistent { records: usize, indexed: usize },
}

/// Unique-keyed, insertion-ordered set of [`LinkCollectionCapability`].
///
/// Order matters! The n-th retained collection is where the n-th contact of a frame is read from.
#[derive(Clone, Debug, Default)]
pub struct CapabilityCatalog {
    records: Vec<LinkCollectionCapability>,
    /// id -> subscript into `records`.
    index: HashMap<u16, usize>,
}
impl CapabilityCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    fn check_consistency(&self) -> Result<(), CatalogError> {
        let (records, indexed) = (self.records.len(), self.index.len());
        if records == indexed {
            Ok(())
        } else {
            Err(CatalogError::Inconsistent { records, indexed })
        }
    }
    /// Find the record for `id`, appending a blank one if it's new. Returns its position.
    /// # Errors
    /// [`CatalogError::Inconsistent`] if the catalog's internal bookkeeping has diverged.
    pub fn find_or_insert(&mut self, id: u16) -> Result<usize, CatalogError> {
        self.check_consistency()?;
        if let Some(&pos) = self.index.get(&id) {
            return Ok(pos);
        }
        let pos = self.records.len();
        self.records.push(LinkCollectionCapability::new(id));
        self.index.insert(id, pos);
        Ok(pos)
    }
    /// Find-or-insert, handing back the record itself.
    /// # Errors
    /// See [`Self::find_or_insert`].
    pub fn entry(&mut self, id: u16) -> Result<&mut LinkCollectionCapability, CatalogError> {
        let pos = self.find_or_insert(id)?;
        Ok(&mut self.records[pos])
    }
    #[must_use]
    pub fn get(&self, id: u16) -> Option<&LinkCollectionCapability> {
        self.index.get(&id).map(|&pos| &self.records[pos])
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    /// Records, in the order their ids were first seen.
    pub fn iter(&self) -> impl Iterator<Item = &LinkCollectionCapability> + '_ {
        self.records.iter()
    }
    /// Drop every record that isn't a [touch collection](LinkCollectionCapability::is_touch_collection),
    /// keeping the rest in order.
    pub fn retain_touch_collections(&mut self) {
        self.records
            .retain(LinkCollectionCapability::is_touch_collection);
        // Positions shifted, rebuild.
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(pos, record)| (record.id, pos))
            .collect();
    }
    /// Give up the records, in order.
    #[must_use]
    pub fn into_records(self) -> Vec<LinkCollectionCapability> {
        self.records
    }
}
