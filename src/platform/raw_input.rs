//! # Windows raw input
//!
//! Devices are listed with `GetRawInputDeviceList`, and each HID device's preparsed data is fetched and
//! kept around: it's both where the capability tables come from and what `HidP_*` needs to pick values out
//! of live reports. Reports arrive as `WM_INPUT` messages once a window has been registered as a sink with
//! [`register_touchpad_sink`].

use std::collections::BTreeMap;

use smallvec::SmallVec;
use windows::Win32::Devices::HumanInterfaceDevice as hid;
use windows::Win32::Foundation::{HANDLE, HWND, NTSTATUS};
use windows::Win32::UI::Input as input;

use crate::builder::BuildError;
use crate::caps::{ButtonCap, CapabilityTables, DeviceEntry, DeviceKind, QueryError, ValueCap};
use crate::report::{HidpStatus, ReportReader, UsageList};
use crate::usage::{DigitizerUsage, Usage, UsagePage};

/// Raw input calls report failure by returning `(UINT)-1`.
const RAW_INPUT_ERROR: u32 = u32::MAX;

fn os_error(what: &str) -> String {
    format!("{what}: {}", std::io::Error::last_os_error())
}

#[allow(clippy::cast_sign_loss)]
fn check(status: NTSTATUS) -> Result<(), HidpStatus> {
    HidpStatus::check(status.0 as u32)
}

/// Zeroed buffer of at least `bytes` bytes, aligned well enough to hold the structs the OS writes into it.
fn aligned_buffer(bytes: usize) -> Vec<u64> {
    vec![0; bytes.div_ceil(std::mem::size_of::<u64>())]
}

/// # Safety
/// `device` must be a raw input device handle.
unsafe fn device_name(device: HANDLE) -> Result<String, QueryError> {
    // In characters, not bytes.
    let mut len = 0u32;
    if unsafe { input::GetRawInputDeviceInfoW(device, input::RIDI_DEVICENAME, None, &mut len) }
        == RAW_INPUT_ERROR
    {
        return Err(QueryError::Os(os_error("device name length")));
    }
    let mut name = vec![0u16; len as usize];
    if unsafe {
        input::GetRawInputDeviceInfoW(
            device,
            input::RIDI_DEVICENAME,
            Some(name.as_mut_ptr().cast()),
            &mut len,
        )
    } == RAW_INPUT_ERROR
    {
        return Err(QueryError::Os(os_error("device name")));
    }
    let end = name.iter().position(|&c| c == 0).unwrap_or(name.len());
    Ok(String::from_utf16_lossy(&name[..end]))
}

/// A device's preparsed HID data. Reads values out of that device's raw reports.
pub struct PreparsedReader {
    data: Vec<u64>,
}
impl PreparsedReader {
    /// # Safety
    /// `device` must be a raw input device handle.
    unsafe fn fetch(device: HANDLE) -> Result<Self, QueryError> {
        let mut size = 0u32;
        if unsafe { input::GetRawInputDeviceInfoW(device, input::RIDI_PREPARSEDDATA, None, &mut size) }
            == RAW_INPUT_ERROR
        {
            return Err(QueryError::Os(os_error("preparsed data size")));
        }
        let mut data = aligned_buffer(size as usize);
        if unsafe {
            input::GetRawInputDeviceInfoW(
                device,
                input::RIDI_PREPARSEDDATA,
                Some(data.as_mut_ptr().cast()),
                &mut size,
            )
        } == RAW_INPUT_ERROR
        {
            return Err(QueryError::Os(os_error("preparsed data")));
        }
        Ok(Self { data })
    }
    fn handle(&self) -> hid::PHIDP_PREPARSED_DATA {
        hid::PHIDP_PREPARSED_DATA(self.data.as_ptr() as isize)
    }
    /// Input value and button capabilities, with the counts the device declared up front.
    /// # Errors
    /// Any `HidP_*` failure.
    pub fn capabilities(&self) -> Result<CapabilityTables, QueryError> {
        let mut caps = hid::HIDP_CAPS::default();
        check(unsafe { hid::HidP_GetCaps(self.handle(), &mut caps) })?;

        let mut value_len = caps.NumberInputValueCaps;
        let mut raw_values = vec![hid::HIDP_VALUE_CAPS::default(); usize::from(value_len)];
        if value_len != 0 {
            check(unsafe {
                hid::HidP_GetValueCaps(
                    hid::HidP_Input,
                    raw_values.as_mut_ptr(),
                    &mut value_len,
                    self.handle(),
                )
            })?;
        }
        raw_values.truncate(usize::from(value_len));

        let mut button_len = caps.NumberInputButtonCaps;
        let mut raw_buttons = vec![hid::HIDP_BUTTON_CAPS::default(); usize::from(button_len)];
        if button_len != 0 {
            check(unsafe {
                hid::HidP_GetButtonCaps(
                    hid::HidP_Input,
                    raw_buttons.as_mut_ptr(),
                    &mut button_len,
                    self.handle(),
                )
            })?;
        }
        raw_buttons.truncate(usize::from(button_len));

        let value_caps = raw_values
            .iter()
            .map(|cap| {
                let is_range = cap.IsRange.0 != 0;
                // Safety: `IsRange` says which half of the union is live.
                let usage = unsafe {
                    if is_range {
                        cap.Anonymous.Range.UsageMin
                    } else {
                        cap.Anonymous.NotRange.Usage
                    }
                };
                ValueCap {
                    usage_page: cap.UsagePage,
                    usage,
                    link_collection: cap.LinkCollection,
                    is_range,
                    is_absolute: cap.IsAbsolute.0 != 0,
                    physical_min: cap.PhysicalMin,
                    physical_max: cap.PhysicalMax,
                }
            })
            .collect();
        let button_caps = raw_buttons
            .iter()
            .map(|cap| {
                let is_range = cap.IsRange.0 != 0;
                let usage = unsafe {
                    if is_range {
                        cap.Anonymous.Range.UsageMin
                    } else {
                        cap.Anonymous.NotRange.Usage
                    }
                };
                ButtonCap {
                    usage_page: cap.UsagePage,
                    usage,
                    link_collection: cap.LinkCollection,
                    is_range,
                }
            })
            .collect();

        Ok(CapabilityTables {
            declared_value_caps: usize::from(caps.NumberInputValueCaps),
            declared_button_caps: usize::from(caps.NumberInputButtonCaps),
            value_caps,
            button_caps,
        })
    }
}
/// HidP wants the report through a mutable pointer, even though it only reads it.
type ReportCopy = SmallVec<[u8; 64]>;
impl ReportReader for PreparsedReader {
    fn usage_value(
        &self,
        usage: Usage,
        link_collection: u16,
        report: &[u8],
    ) -> Result<u32, HidpStatus> {
        let mut report = ReportCopy::from_slice(report);
        let mut value = 0;
        check(unsafe {
            hid::HidP_GetUsageValue(
                hid::HidP_Input,
                usage.page().code(),
                link_collection,
                usage.code(),
                &mut value,
                self.handle(),
                &mut report[..],
            )
        })?;
        Ok(value)
    }
    fn max_usage_list_length(&self, page: UsagePage) -> usize {
        unsafe { hid::HidP_MaxUsageListLength(hid::HidP_Input, page.code(), self.handle()) as usize }
    }
    fn usages(
        &self,
        page: UsagePage,
        link_collection: u16,
        report: &[u8],
        max: usize,
    ) -> Result<UsageList, HidpStatus> {
        let mut report = ReportCopy::from_slice(report);
        let mut list = UsageList::from_elem(0, max);
        let mut len = u32::try_from(max).unwrap_or(u32::MAX);
        check(unsafe {
            hid::HidP_GetUsages(
                hid::HidP_Input,
                page.code(),
                link_collection,
                list.as_mut_ptr(),
                &mut len,
                self.handle(),
                &mut report[..],
            )
        })?;
        list.truncate(len as usize);
        Ok(list)
    }
}

/// Every device raw input knows about, plus a reader for each HID device that produced one.
pub struct RawInputDevices {
    entries: Vec<DeviceEntry>,
    readers: BTreeMap<String, PreparsedReader>,
}
impl RawInputDevices {
    /// List and query every connected device.
    /// # Errors
    /// If the device list itself can't be fetched. Per-device failures end up in that device's
    /// [`DeviceEntry::capabilities`] instead.
    pub fn enumerate() -> Result<Self, BuildError> {
        let entry_size = u32::try_from(std::mem::size_of::<input::RAWINPUTDEVICELIST>())
            .map_err(|_| BuildError::Unsupported)?;
        let mut count = 0u32;
        if unsafe { input::GetRawInputDeviceList(None, &mut count, entry_size) } == RAW_INPUT_ERROR {
            return Err(BuildError::Os(os_error("device count")));
        }
        let mut list = vec![input::RAWINPUTDEVICELIST::default(); count as usize];
        let listed =
            unsafe { input::GetRawInputDeviceList(Some(list.as_mut_ptr()), &mut count, entry_size) };
        if listed == RAW_INPUT_ERROR {
            return Err(BuildError::Os(os_error("device list")));
        }
        list.truncate(listed as usize);

        let mut devices = Self {
            entries: Vec::with_capacity(list.len()),
            readers: BTreeMap::new(),
        };
        for device in list {
            // Safety: handles straight from the device list.
            let name = match unsafe { device_name(device.hDevice) } {
                Ok(name) => name,
                Err(err) => {
                    tracing::warn!(%err, "skipping device without a name");
                    continue;
                }
            };
            let kind = match device.dwType {
                input::RIM_TYPEHID => DeviceKind::Hid,
                input::RIM_TYPEMOUSE => DeviceKind::Mouse,
                _ => DeviceKind::Keyboard,
            };
            let capabilities = if kind == DeviceKind::Hid {
                unsafe { PreparsedReader::fetch(device.hDevice) }.and_then(|reader| {
                    let caps = reader.capabilities()?;
                    devices.readers.insert(name.clone(), reader);
                    Ok(caps)
                })
            } else {
                Err(QueryError::Os(format!("{} devices have no HID capabilities", kind.as_ref())))
            };
            devices.entries.push(DeviceEntry {
                name,
                kind,
                capabilities,
            });
        }
        Ok(devices)
    }
    /// Copies of the entries, ready for [`Builder::build`](crate::Builder::build).
    pub fn entries(&self) -> impl Iterator<Item = DeviceEntry> + '_ {
        self.entries.iter().cloned()
    }
    /// Reader for the reports of device `name`.
    #[must_use]
    pub fn reader(&self, name: &str) -> Option<&PreparsedReader> {
        self.readers.get(name)
    }
}

/// Shorthand for [`RawInputDevices::enumerate`] when only the entries are wanted.
/// # Errors
/// See [`RawInputDevices::enumerate`].
pub fn enumerate_devices() -> Result<Vec<DeviceEntry>, BuildError> {
    RawInputDevices::enumerate().map(|devices| devices.entries)
}

/// Ask for touchpad reports to be delivered to `window` as `WM_INPUT`, even while it's in the background.
/// # Errors
/// [`BuildError::Unsupported`] for anything but a Win32 handle, or whatever registration fails with.
/// # Safety
/// The handle must refer to a window that outlives the registration.
pub unsafe fn register_touchpad_sink(
    window: raw_window_handle::RawWindowHandle,
) -> Result<(), BuildError> {
    let raw_window_handle::RawWindowHandle::Win32(window) = window else {
        return Err(BuildError::Unsupported);
    };
    let device = input::RAWINPUTDEVICE {
        usUsagePage: UsagePage::Digitizer.code(),
        usUsage: DigitizerUsage::TouchPad as u16,
        dwFlags: input::RIDEV_INPUTSINK,
        hwndTarget: HWND(window.hwnd.get()),
    };
    let size = u32::try_from(std::mem::size_of::<input::RAWINPUTDEVICE>())
        .map_err(|_| BuildError::Unsupported)?;
    unsafe { input::RegisterRawInputDevices(&[device], size) }
        .map_err(|err| BuildError::Os(err.to_string()))
}

/// One `WM_INPUT` packet from a HID device.
#[derive(Clone, Debug)]
pub struct RawPacket {
    /// Matches [`DeviceEntry::name`].
    pub device: String,
    report_len: usize,
    data: Vec<u8>,
}
impl RawPacket {
    /// The packet may batch several reports of equal length.
    pub fn reports(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.data.chunks_exact(self.report_len.max(1))
    }
}

/// Fetch the packet behind a `WM_INPUT` message. `Ok(None)` for mouse and keyboard packets.
/// # Errors
/// If the OS refuses to hand it over, or it's malformed.
/// # Safety
/// `handle` must be the `lParam` of the `WM_INPUT` message currently being handled.
pub unsafe fn read_raw_input(handle: input::HRAWINPUT) -> Result<Option<RawPacket>, QueryError> {
    let header_size = u32::try_from(std::mem::size_of::<input::RAWINPUTHEADER>())
        .map_err(|_| QueryError::Os("header size".into()))?;
    let mut size = 0u32;
    if unsafe { input::GetRawInputData(handle, input::RID_INPUT, None, &mut size, header_size) }
        == RAW_INPUT_ERROR
    {
        return Err(QueryError::Os(os_error("raw input size")));
    }
    let bytes = (size as usize).max(std::mem::size_of::<input::RAWINPUT>());
    let mut buffer = aligned_buffer(bytes);
    if unsafe {
        input::GetRawInputData(
            handle,
            input::RID_INPUT,
            Some(buffer.as_mut_ptr().cast()),
            &mut size,
            header_size,
        )
    } == RAW_INPUT_ERROR
    {
        return Err(QueryError::Os(os_error("raw input")));
    }
    // Safety: buffer is aligned, zero-initialized, and at least one RAWINPUT long.
    let raw = unsafe { &*buffer.as_ptr().cast::<input::RAWINPUT>() };
    if raw.header.dwType != input::RIM_TYPEHID.0 {
        return Ok(None);
    }
    // Safety: dwType says this is the HID half.
    let packet = unsafe { &raw.data.hid };
    let report_len = packet.dwSizeHid as usize;
    let len = report_len * packet.dwCount as usize;
    // Reports trail the header in the same buffer.
    let offset = packet.bRawData.as_ptr() as usize - buffer.as_ptr() as usize;
    if offset + len > bytes {
        return Err(QueryError::Os(format!(
            "packet claims {len} report bytes, only {} available",
            bytes - offset
        )));
    }
    // Safety: bounds checked just above.
    let data = unsafe { std::slice::from_raw_parts(packet.bRawData.as_ptr(), len) }.to_vec();
    let device = unsafe { device_name(raw.header.hDevice) }?;
    Ok(Some(RawPacket {
        device,
        report_len,
        data,
    }))
}
