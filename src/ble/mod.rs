//! Bluetooth Low Energy keyboard output.
//!
//! This side of the bridge presents the device as a BLE HID keyboard:
//!
//! 1. **Layout** - reverse US-QWERTY lookup from characters back to
//!    usage codes.
//! 2. **Input report** - the 8-byte boot-layout report this device
//!    notifies to the remote host, with press/release bookkeeping.
//! 3. **HID server** (embedded) - HID-over-GATT and Battery services on
//!    the Nordic SoftDevice in Peripheral role, advertising, bonding,
//!    and the concrete [`KeySink`] the transmit task drives.
//!
//! The transmit path only ever sees the [`KeySink`] trait, so the whole
//! replay logic is testable against a mock on the host.

pub mod layout;
pub mod report;

#[cfg(feature = "embedded")]
pub mod hid_server;

use crate::hid::usage::Control;

/// A key the BLE output can act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SinkKey {
    /// A printable character, resolved through the US-QWERTY layout.
    Char(char),
    /// A named non-printable key (modifiers, Enter, arrows, F-keys, ...).
    Control(Control),
}

/// The BLE HID output seam the transmit task drives.
///
/// `press`/`release` latch key state on the remote host; `write` is a
/// complete press+release cycle for one key. Implementations swallow
/// link-level failures: an action racing a disconnect must no-op, the
/// bridge never retries.
pub trait KeySink {
    /// Whether a BLE link is currently up.
    fn is_connected(&self) -> bool;

    /// Assert a key on the remote host until released.
    fn press(&mut self, key: SinkKey);

    /// Release a previously asserted key.
    fn release(&mut self, key: SinkKey);

    /// Type a key: press immediately followed by release.
    fn write(&mut self, key: SinkKey);
}
