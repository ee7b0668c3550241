//! Boot-protocol keyboard report snapshots and edge-triggered diffing.
//!
//! Layout (8 bytes):
//! ```text
//! Byte 0: Modifier keys (bitfield, see `hid::usage`)
//! Byte 1: Reserved (0x00)
//! Byte 2-7: Up to 6 simultaneous key codes (USB HID usage codes)
//! ```
//!
//! The boot protocol samples key *levels*; the bridge needs *edges*.
//! [`diff`] compares the previous snapshot against the current one and
//! emits a discrete [`KeyEvent`] per key that appeared or disappeared.

use heapless::Vec;

use crate::hid::KeyEvent;

/// Boot report size in bytes.
pub const BOOT_REPORT_SIZE: usize = 8;

/// Key slots in a boot report.
pub const BOOT_KEY_SLOTS: usize = 6;

/// Upper bound on events one diff can emit (full release + full press).
pub const MAX_DIFF_EVENTS: usize = BOOT_KEY_SLOTS * 2;

/// One level-sampled boot-protocol snapshot.
///
/// Exactly one "previous" snapshot is retained per logical keyboard
/// device; [`diff`] overwrites it in place after comparing. It is only
/// ever touched from the single-threaded report-callback path.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootReport {
    /// Modifier key bitfield.
    pub modifiers: u8,
    /// Up to 6 simultaneously pressed key codes; 0 = empty slot.
    pub keys: [u8; BOOT_KEY_SLOTS],
}

impl BootReport {
    /// The all-released snapshot a fresh device starts from.
    pub const fn empty() -> Self {
        Self {
            modifiers: 0,
            keys: [0; BOOT_KEY_SLOTS],
        }
    }

    /// Parse from the raw bytes delivered by the host driver's interface
    /// callback.
    ///
    /// Rejects short buffers, skips the reserved byte, and ignores any
    /// trailing bytes some stacks append.
    pub fn from_report_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < BOOT_REPORT_SIZE {
            return None;
        }
        Some(Self {
            modifiers: data[0],
            keys: [data[2], data[3], data[4], data[5], data[6], data[7]],
        })
    }

    /// True when `usage` occupies any slot. Usage 0 never matches.
    pub fn contains(&self, usage: u8) -> bool {
        usage != 0 && self.keys.iter().any(|&k| k == usage)
    }
}

/// Compare two consecutive snapshots and emit one event per edge.
///
/// Releases come first and carry the *previous* modifier state: a release
/// must look up whichever modifiers were in effect when the key went
/// down, not the modifiers present at release time. Presses follow with
/// the current modifiers. A usage repeated across slots emits at most one
/// event. After both phases `prev` is overwritten with `curr` - exactly
/// once, never interleaved with the comparison.
///
/// The scan is O(N²) over the 6 slots, which is fine at this fixed size;
/// a generalisation to larger non-boot reports would want a bitmap diff
/// instead.
pub fn diff(prev: &mut BootReport, curr: &BootReport) -> Vec<KeyEvent, MAX_DIFF_EVENTS> {
    let mut events: Vec<KeyEvent, MAX_DIFF_EVENTS> = Vec::new();

    // Phase 1: keys present before, gone now.
    for (i, &usage) in prev.keys.iter().enumerate() {
        if usage == 0 || prev.keys[..i].contains(&usage) {
            continue;
        }
        if !curr.contains(usage) {
            let _ = events.push(KeyEvent::release(usage, prev.modifiers));
        }
    }

    // Phase 2: keys present now, absent before.
    for (i, &usage) in curr.keys.iter().enumerate() {
        if usage == 0 || curr.keys[..i].contains(&usage) {
            continue;
        }
        if !prev.contains(usage) {
            let _ = events.push(KeyEvent::press(usage, curr.modifiers));
        }
    }

    *prev = *curr;
    events
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn report(modifiers: u8, keys: [u8; 6]) -> BootReport {
        BootReport { modifiers, keys }
    }

    #[test]
    fn parse_valid_bytes() {
        let data = [0x02, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00];
        let r = BootReport::from_report_bytes(&data).unwrap();
        assert_eq!(r.modifiers, 0x02);
        assert_eq!(r.keys, [0x04, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn parse_short_bytes_fails() {
        assert!(BootReport::from_report_bytes(&[]).is_none());
        assert!(BootReport::from_report_bytes(&[0x02]).is_none());
        assert!(BootReport::from_report_bytes(&[0; 7]).is_none());
    }

    #[test]
    fn parse_ignores_trailing_bytes() {
        let data = [0x00, 0x00, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0xFF, 0xFF];
        let r = BootReport::from_report_bytes(&data).unwrap();
        assert_eq!(r.keys, [0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);
    }

    #[test]
    fn contains_never_matches_empty_slot() {
        let r = BootReport::empty();
        assert!(!r.contains(0));
        let r = report(0, [0x04, 0, 0, 0, 0, 0]);
        assert!(!r.contains(0));
        assert!(r.contains(0x04));
    }

    #[test]
    fn press_while_holding_another_key() {
        // Scenario: 'a' held, 'b' lands with left shift.
        let mut prev = report(0x00, [0x04, 0, 0, 0, 0, 0]);
        let curr = report(0x02, [0x04, 0x05, 0, 0, 0, 0]);
        let events = diff(&mut prev, &curr);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], KeyEvent::press(0x05, 0x02));
        assert_eq!(prev, curr);
    }

    #[test]
    fn releases_carry_previous_modifiers() {
        // Scenario: shift+'a'+'b' all released at once.
        let mut prev = report(0x02, [0x04, 0x05, 0, 0, 0, 0]);
        let curr = report(0x00, [0, 0, 0, 0, 0, 0]);
        let events = diff(&mut prev, &curr);
        assert_eq!(events.len(), 2);
        assert!(events.contains(&KeyEvent::release(0x04, 0x02)));
        assert!(events.contains(&KeyEvent::release(0x05, 0x02)));
    }

    #[test]
    fn releases_precede_presses() {
        let mut prev = report(0, [0x04, 0, 0, 0, 0, 0]);
        let curr = report(0, [0x05, 0, 0, 0, 0, 0]);
        let events = diff(&mut prev, &curr);
        assert_eq!(events[0], KeyEvent::release(0x04, 0));
        assert_eq!(events[1], KeyEvent::press(0x05, 0));
    }

    #[test]
    fn unchanged_keys_emit_nothing() {
        let mut prev = report(0, [0x04, 0x05, 0, 0, 0, 0]);
        let curr = prev;
        assert!(diff(&mut prev, &curr).is_empty());
    }

    #[test]
    fn diff_is_idempotent_after_update() {
        let mut prev = report(0, [0x04, 0, 0, 0, 0, 0]);
        let curr = report(0x02, [0x04, 0x05, 0x06, 0, 0, 0]);
        assert!(!diff(&mut prev, &curr).is_empty());
        // prev now equals curr; diffing again emits nothing.
        assert!(diff(&mut prev, &curr).is_empty());
    }

    #[test]
    fn repeated_usage_in_prev_is_one_release() {
        let mut prev = report(0, [0x04, 0x04, 0, 0, 0, 0]);
        let curr = BootReport::empty();
        let events = diff(&mut prev, &curr);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], KeyEvent::release(0x04, 0));
    }

    #[test]
    fn repeated_usage_in_curr_is_one_press() {
        let mut prev = BootReport::empty();
        let curr = report(0, [0x05, 0x05, 0x05, 0, 0, 0]);
        let events = diff(&mut prev, &curr);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], KeyEvent::press(0x05, 0));
    }

    #[test]
    fn repeated_usage_present_both_sides_is_still_pressed() {
        let mut prev = report(0, [0x04, 0, 0, 0, 0, 0]);
        let curr = report(0, [0x04, 0x04, 0, 0, 0, 0]);
        assert!(diff(&mut prev, &curr).is_empty());
    }

    #[test]
    fn slot_order_change_is_not_an_edge() {
        let mut prev = report(0, [0x04, 0x05, 0, 0, 0, 0]);
        let curr = report(0, [0x05, 0x04, 0, 0, 0, 0]);
        assert!(diff(&mut prev, &curr).is_empty());
    }

    #[test]
    fn full_rollover_swap() {
        let mut prev = report(0, [0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);
        let curr = report(0, [0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F]);
        let events = diff(&mut prev, &curr);
        assert_eq!(events.len(), MAX_DIFF_EVENTS);
        assert!(events[..6].iter().all(|e| !e.pressed));
        assert!(events[6..].iter().all(|e| e.pressed));
    }

    #[test]
    fn modifier_only_change_emits_no_key_events() {
        // The differ never emits usage 0; the ingestion layer turns this
        // case into a modifier-sync event.
        let mut prev = report(0x00, [0x04, 0, 0, 0, 0, 0]);
        let curr = report(0x02, [0x04, 0, 0, 0, 0, 0]);
        assert!(diff(&mut prev, &curr).is_empty());
        assert_eq!(prev.modifiers, 0x02);
    }
}
