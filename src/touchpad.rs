//! # Touchpads
//!
//! A touchpad is a HID device that survived discovery: it has at least one link collection capable of
//! describing a contact, real physical bounds, and somewhere to read the contact count from.

use crate::catalog::{CapabilityCatalog, LinkCollectionCapability};

/// See [module level docs](`crate::touchpad`) for details.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TouchpadDescriptor {
    /// Opaque device identifier, as handed out by the OS. Used to match reports to devices.
    pub name: String,
    /// Physical X maximum of the first contact collection.
    pub width: u32,
    /// Physical Y maximum of the first contact collection.
    pub height: u32,
    /// Link collection holding the per-report contact count. `None` if the device never declared one.
    pub contact_count_collection: Option<u16>,
    /// Contact-capable collections, in descriptor order. The n-th contact of a report lives in the n-th entry.
    pub contact_collections: Vec<LinkCollectionCapability>,
}
impl TouchpadDescriptor {
    /// Build from an already-[filtered](CapabilityCatalog::retain_touch_collections) catalog.
    ///
    /// Dimensions come from the first collection. Every collection is expected to report the same
    /// rectangle anyway, so looking further is pointless.
    #[must_use]
    pub fn from_catalog(
        name: String,
        catalog: CapabilityCatalog,
        contact_count_collection: Option<u16>,
    ) -> Self {
        let contact_collections = catalog.into_records();
        let (width, height) = contact_collections.first().map_or((0, 0), |first| {
            (
                if first.has_x() { bound(first.rect.right) } else { 0 },
                if first.has_y() { bound(first.rect.bottom) } else { 0 },
            )
        });
        Self {
            name,
            width,
            height,
            contact_count_collection,
            contact_collections,
        }
    }
    /// Has non-zero bounds and a contact count to read. Anything else can't be turned into contacts and is
    /// quietly dropped during discovery.
    #[must_use]
    pub fn is_valid_touchpad(&self) -> bool {
        self.width != 0 && self.height != 0 && self.contact_count_collection.is_some()
    }
    /// How many simultaneous contacts this device can describe.
    #[must_use]
    pub fn max_contacts(&self) -> usize {
        self.contact_collections.len()
    }
}

/// Negative bounds never make it through filtering, but don't wrap if they do.
fn bound(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}
