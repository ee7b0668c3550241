//! Unified error type for usb2ble.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

/// Top-level error type used across the application.
///
/// Everything here is fatal during bridge startup; steady-state overflow
/// and link-down conditions are recovered locally and never reach this
/// type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // USB host
    /// Installing the low-level USB host stack failed.
    HostInstall,

    /// The USB host stack did not signal readiness within the startup bound.
    HostNotReady,

    /// Installing the HID host driver failed.
    HidInstall,

    /// Pumping USB host-stack events failed.
    HostEvents,

    /// Opening a newly connected HID device failed.
    DeviceOpen,

    /// A class request (set-protocol / set-idle) was rejected by the device.
    DeviceRequest,

    /// Starting a device interface failed.
    DeviceStart,

    // BLE
    /// The SoftDevice returned a BLE-level error.
    Ble(BleError),

    // UI / Display
    /// I²C transaction to the status display failed.
    Display,
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleError {
    /// GAP / GATT raw error code from the SoftDevice.
    Raw(u32),
    /// Registering a GATT service failed.
    GattRegister,
    /// Advertising could not start.
    AdvertiseFailed,
    /// Notifying a characteristic failed.
    NotifyFailed,
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}
