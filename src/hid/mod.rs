//! HID boot-protocol input handling.
//!
//! This module owns the keyboard-side half of the bridge:
//!
//! 1. **Boot report** - the fixed 8-byte snapshot delivered by the USB
//!    host driver, and the edge-triggered diff between two consecutive
//!    snapshots.
//! 2. **Usage translation** - pure lookup from (usage code, modifier
//!    bitmask) to a printable character or a named control key.
//!
//! Everything here is pure, bounded-time logic that runs on the host in
//! tests and on the report-callback path live.

pub mod boot_report;
pub mod usage;

/// A discrete press or release derived by comparing two consecutive
/// boot reports.
///
/// Created on the producer side, moved into the key-event queue, and
/// consumed exactly once by the transmit task. `usage == 0` marks a pure
/// modifier-state sync with no key attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    /// USB HID usage code; 0 = no key (modifier-only event).
    pub usage: u8,
    /// Modifier bitmask in effect for this event.
    pub modifiers: u8,
    /// `true` = key went down, `false` = key came up.
    pub pressed: bool,
}

impl KeyEvent {
    pub const fn press(usage: u8, modifiers: u8) -> Self {
        Self {
            usage,
            modifiers,
            pressed: true,
        }
    }

    pub const fn release(usage: u8, modifiers: u8) -> Self {
        Self {
            usage,
            modifiers,
            pressed: false,
        }
    }

    /// A modifier-state sync carrying no key of its own.
    pub fn is_modifier_sync(&self) -> bool {
        self.usage == 0
    }
}
