//! # Capability parsing and discovery
//!
//! Turns a device's declared value and button capabilities into a [`TouchpadDescriptor`], and walks the
//! list of connected devices keeping only the ones that came out as valid touchpads.
//!
//! The capabilities arrive already decoded from the binary report descriptor (that's the OS's job),
//! but otherwise uninterpreted: nothing says which collection is a contact, so we work it out from which
//! usages each collection carries.

use std::collections::BTreeMap;

use crate::catalog::{CapabilityCatalog, CatalogError, CollectionUsages};
use crate::report::HidpStatus;
use crate::touchpad::TouchpadDescriptor;
use crate::usage::{DigitizerUsage, GenericUsage, Usage};

/// One entry of a device's value capability table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueCap {
    pub usage_page: u16,
    /// For ranged caps this is the first usage of the range, which we never look at.
    pub usage: u16,
    pub link_collection: u16,
    pub is_range: bool,
    pub is_absolute: bool,
    pub physical_min: i32,
    pub physical_max: i32,
}

/// One entry of a device's button capability table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonCap {
    pub usage_page: u16,
    pub usage: u16,
    pub link_collection: u16,
    pub is_range: bool,
}

/// A device's input capabilities, alongside the counts the device declared for them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapabilityTables {
    pub declared_value_caps: usize,
    pub declared_button_caps: usize,
    pub value_caps: Vec<ValueCap>,
    pub button_caps: Vec<ButtonCap>,
}
impl CapabilityTables {
    /// Tables whose declared counts match their contents.
    #[must_use]
    pub fn new(value_caps: Vec<ValueCap>, button_caps: Vec<ButtonCap>) -> Self {
        Self {
            declared_value_caps: value_caps.len(),
            declared_button_caps: button_caps.len(),
            value_caps,
            button_caps,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("device declared {declared} {table} caps but provided {actual}")]
    CountMismatch {
        table: &'static str,
        declared: usize,
        actual: usize,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Catalog of every link collection the tables mention, plus where the contact count lives.
#[derive(Clone, Debug, Default)]
pub struct ParsedCapabilities {
    pub catalog: CapabilityCatalog,
    pub contact_count_collection: Option<u16>,
}

/// Populate a catalog from the capability tables. No filtering happens here.
/// # Errors
/// [`ParseError::CountMismatch`] if the tables are malformed, [`ParseError::Catalog`] on a catalog bug.
pub fn parse_capabilities(tables: &CapabilityTables) -> Result<ParsedCapabilities, ParseError> {
    for (table, declared, actual) in [
        ("value", tables.declared_value_caps, tables.value_caps.len()),
        ("button", tables.declared_button_caps, tables.button_caps.len()),
    ] {
        if declared != actual {
            return Err(ParseError::CountMismatch {
                table,
                declared,
                actual,
            });
        }
    }

    let mut parsed = ParsedCapabilities::default();

    for cap in &tables.value_caps {
        if cap.is_range || !cap.is_absolute {
            continue;
        }
        // Collections are registered even if the usage turns out to be uninteresting. They get filtered later.
        let record = parsed.catalog.entry(cap.link_collection)?;
        match Usage::resolve(cap.usage_page, cap.usage) {
            Some(Usage::Generic(GenericUsage::X)) => {
                record.usages |= CollectionUsages::X;
                record.rect.left = cap.physical_min;
                record.rect.right = cap.physical_max;
            }
            Some(Usage::Generic(GenericUsage::Y)) => {
                record.usages |= CollectionUsages::Y;
                record.rect.top = cap.physical_min;
                record.rect.bottom = cap.physical_max;
            }
            Some(Usage::Digitizer(DigitizerUsage::ContactId)) => {
                record.usages |= CollectionUsages::CONTACT_ID;
            }
            Some(Usage::Digitizer(DigitizerUsage::ContactCount)) => {
                // Device level, not a property of any contact.
                record.usages |= CollectionUsages::CONTACT_COUNT;
                parsed.contact_count_collection = Some(cap.link_collection);
            }
            Some(Usage::Digitizer(DigitizerUsage::Confidence)) => {
                record.usages |= CollectionUsages::CONFIDENCE;
            }
            Some(Usage::Digitizer(DigitizerUsage::Width)) => {
                record.usages |= CollectionUsages::WIDTH;
            }
            Some(Usage::Digitizer(DigitizerUsage::Height)) => {
                record.usages |= CollectionUsages::HEIGHT;
            }
            Some(Usage::Digitizer(DigitizerUsage::TipPressure)) => {
                record.usages |= CollectionUsages::PRESSURE;
            }
            _ => (),
        }
    }

    for cap in &tables.button_caps {
        if cap.is_range {
            continue;
        }
        if Usage::resolve(cap.usage_page, cap.usage)
            == Some(Usage::Digitizer(DigitizerUsage::TipSwitch))
        {
            parsed.catalog.entry(cap.link_collection)?.usages |= CollectionUsages::TIP_SWITCH;
        }
    }

    Ok(parsed)
}

/// Parse, filter, and build a descriptor. The result may still fail
/// [validation](TouchpadDescriptor::is_valid_touchpad)!
/// # Errors
/// See [`parse_capabilities`].
pub fn describe_device(
    name: String,
    tables: &CapabilityTables,
) -> Result<TouchpadDescriptor, ParseError> {
    let ParsedCapabilities {
        mut catalog,
        contact_count_collection,
    } = parse_capabilities(tables)?;
    catalog.retain_touch_collections();
    Ok(TouchpadDescriptor::from_catalog(
        name,
        catalog,
        contact_count_collection,
    ))
}

/// Raw input device class. Only HID devices can be touchpads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr)]
pub enum DeviceKind {
    Mouse,
    Keyboard,
    Hid,
}

/// Why a device's capabilities couldn't be fetched.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error(transparent)]
    Hidp(#[from] HidpStatus),
    /// The OS refused to hand over device info.
    #[error("device query failed: {0}")]
    Os(String),
}

/// A connected device, as seen by the enumeration backend.
#[derive(Clone, Debug)]
pub struct DeviceEntry {
    pub name: String,
    pub kind: DeviceKind,
    pub capabilities: Result<CapabilityTables, QueryError>,
}

/// Outcome of a discovery scan.
#[derive(Clone, Debug, Default)]
pub struct Discovery {
    /// Valid touchpads, keyed by device name.
    pub touchpads: BTreeMap<String, TouchpadDescriptor>,
    /// Name of the first touchpad accepted during the scan.
    pub primary: Option<String>,
}

/// Scan `devices`, keeping every valid touchpad. Never fails: a device that can't be queried or parsed
/// is skipped and the scan continues.
pub fn discover(devices: impl IntoIterator<Item = DeviceEntry>) -> Discovery {
    let mut discovery = Discovery::default();
    for DeviceEntry {
        name,
        kind,
        capabilities,
    } in devices
    {
        if kind != DeviceKind::Hid {
            continue;
        }
        let tables = match capabilities {
            Ok(tables) => tables,
            Err(err) => {
                tracing::warn!(device = %name, %err, "skipping device, capability query failed");
                continue;
            }
        };
        // No buttons means no tip switch, so no way this is a touchpad.
        if tables.declared_button_caps == 0 {
            continue;
        }
        let pad = match describe_device(name, &tables) {
            Ok(pad) => pad,
            Err(err @ ParseError::Catalog(_)) => {
                tracing::error!(%err, "skipping device, catalog bookkeeping broke");
                continue;
            }
            Err(err) => {
                tracing::warn!(%err, "skipping device, malformed capabilities");
                continue;
            }
        };
        if !pad.is_valid_touchpad() {
            tracing::debug!(
                device = %pad.name,
                width = pad.width,
                height = pad.height,
                contact_count_collection = ?pad.contact_count_collection,
                "not a usable touchpad"
            );
            continue;
        }
        tracing::info!(
            device = %pad.name,
            width = pad.width,
            height = pad.height,
            contacts = pad.max_contacts(),
            "found touchpad"
        );
        if discovery.primary.is_none() {
            discovery.primary = Some(pad.name.clone());
        }
        discovery.touchpads.insert(pad.name.clone(), pad);
    }
    discovery
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::usage::UsagePage;

    pub(crate) fn value(page: UsagePage, usage: u16, link: u16, min: i32, max: i32) -> ValueCap {
        ValueCap {
            usage_page: page.code(),
            usage,
            link_collection: link,
            is_range: false,
            is_absolute: true,
            physical_min: min,
            physical_max: max,
        }
    }

    pub(crate) fn tip(link: u16) -> ButtonCap {
        ButtonCap {
            usage_page: UsagePage::Digitizer.code(),
            usage: DigitizerUsage::TipSwitch as u16,
            link_collection: link,
            is_range: false,
        }
    }

    /// A typical precision touchpad: `contacts` finger collections starting at link 1, and the
    /// contact count in link 0.
    pub(crate) fn touchpad_tables(contacts: u16, width: i32, height: i32) -> CapabilityTables {
        let mut values = vec![value(
            UsagePage::Digitizer,
            DigitizerUsage::ContactCount as u16,
            0,
            0,
            0,
        )];
        let mut buttons = vec![];
        for link in 1..=contacts {
            values.push(value(UsagePage::GenericDesktop, 0x30, link, 0, width));
            values.push(value(UsagePage::GenericDesktop, 0x31, link, 0, height));
            values.push(value(
                UsagePage::Digitizer,
                DigitizerUsage::ContactId as u16,
                link,
                0,
                0,
            ));
            buttons.push(tip(link));
        }
        CapabilityTables::new(values, buttons)
    }

    #[test]
    fn parses_contact_collections() {
        let parsed = parse_capabilities(&touchpad_tables(2, 1228, 928)).unwrap();
        assert_eq!(parsed.contact_count_collection, Some(0));
        // Link 0 is registered but carries nothing but the contact count.
        assert_eq!(parsed.catalog.len(), 3);
        let first = parsed.catalog.get(1).unwrap();
        assert!(first.is_touch_collection());
        assert_eq!(first.rect.right, 1228);
        assert_eq!(first.rect.bottom, 928);
        assert!(parsed.catalog.get(0).unwrap().has_contact_count());
    }

    #[test]
    fn ranged_and_relative_values_are_ignored() {
        let mut ranged = value(UsagePage::GenericDesktop, 0x30, 5, 0, 100);
        ranged.is_range = true;
        let mut relative = value(UsagePage::GenericDesktop, 0x31, 6, 0, 100);
        relative.is_absolute = false;
        let mut ranged_tip = tip(7);
        ranged_tip.is_range = true;

        let parsed =
            parse_capabilities(&CapabilityTables::new(vec![ranged, relative], vec![ranged_tip]))
                .unwrap();
        assert!(parsed.catalog.is_empty());
        assert_eq!(parsed.contact_count_collection, None);
    }

    #[test]
    fn discovery_only_flags_are_recorded() {
        let values = [
            DigitizerUsage::Confidence,
            DigitizerUsage::Width,
            DigitizerUsage::Height,
            DigitizerUsage::TipPressure,
        ]
        .map(|usage| value(UsagePage::Digitizer, usage as u16, 3, 0, 0));
        let parsed = parse_capabilities(&CapabilityTables::new(values.to_vec(), vec![])).unwrap();
        let record = parsed.catalog.get(3).unwrap();
        assert!(record.has_confidence());
        assert!(record.has_width());
        assert!(record.has_height());
        assert!(record.has_pressure());
        assert!(!record.has_x());
    }

    #[test]
    fn count_mismatch_is_malformed() {
        let mut tables = touchpad_tables(1, 100, 100);
        tables.declared_value_caps += 1;
        assert!(matches!(
            parse_capabilities(&tables),
            Err(ParseError::CountMismatch { table: "value", .. })
        ));
    }

    #[test]
    fn describe_keeps_only_contacts() {
        let pad = describe_device("pad".into(), &touchpad_tables(5, 1228, 928)).unwrap();
        assert_eq!(pad.max_contacts(), 5);
        let links: Vec<_> = pad.contact_collections.iter().map(|c| c.id).collect();
        assert_eq!(links, [1, 2, 3, 4, 5]);
        assert!(pad.is_valid_touchpad());
    }

    #[test]
    fn discovery_skips_bad_devices_and_continues() {
        let devices = vec![
            DeviceEntry {
                name: "keyboard".into(),
                kind: DeviceKind::Keyboard,
                capabilities: Ok(touchpad_tables(1, 100, 100)),
            },
            DeviceEntry {
                name: "broken".into(),
                kind: DeviceKind::Hid,
                capabilities: Err(HidpStatus::InvalidPreparsedData.into()),
            },
            DeviceEntry {
                name: "flat".into(),
                kind: DeviceKind::Hid,
                capabilities: Ok(touchpad_tables(2, 0, 928)),
            },
            DeviceEntry {
                name: "gamepad".into(),
                kind: DeviceKind::Hid,
                capabilities: Ok(CapabilityTables::new(
                    vec![value(UsagePage::GenericDesktop, 0x30, 0, 0, 255)],
                    vec![],
                )),
            },
            DeviceEntry {
                name: "pad-a".into(),
                kind: DeviceKind::Hid,
                capabilities: Ok(touchpad_tables(5, 1228, 928)),
            },
            DeviceEntry {
                name: "pad-b".into(),
                kind: DeviceKind::Hid,
                capabilities: Ok(touchpad_tables(3, 800, 600)),
            },
        ];
        let discovery = discover(devices);
        let names: Vec<_> = discovery.touchpads.keys().map(String::as_str).collect();
        assert_eq!(names, ["pad-a", "pad-b"]);
        assert_eq!(discovery.primary.as_deref(), Some("pad-a"));
    }
}
