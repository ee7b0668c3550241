//! US-QWERTY reverse lookup: printable character -> (usage code, shift).
//!
//! The inverse of `hid::usage::translate`, used when the BLE keyboard
//! types a character on the remote host. Built by searching the same
//! tables the translator reads, so the two directions cannot drift apart.

use crate::hid::usage::{NON_US_HASH, PUNCTUATION, TOPROW_PLAIN, TOPROW_SHIFTED};

const ALPHA_FIRST: u8 = 0x04;
const TOPROW_FIRST: u8 = 0x1E;

/// Resolve a character to the usage code that produces it and whether
/// shift must be held. Returns `None` for characters outside the layout.
pub fn keycode_for(c: char) -> Option<(u8, bool)> {
    match c {
        'a'..='z' => return Some((ALPHA_FIRST + (c as u8 - b'a'), false)),
        'A'..='Z' => return Some((ALPHA_FIRST + (c as u8 - b'A'), true)),
        _ => {}
    }

    if let Some(idx) = TOPROW_PLAIN.iter().position(|&b| b as char == c) {
        return Some((TOPROW_FIRST + idx as u8, false));
    }
    if let Some(idx) = TOPROW_SHIFTED.iter().position(|&b| b as char == c) {
        return Some((TOPROW_FIRST + idx as u8, true));
    }

    // The Non-US hash key is input-only: '#' and '~' already resolved
    // through their US positions above and through 0x35 below.
    PUNCTUATION
        .iter()
        .filter(|&&(usage, _, _)| usage != NON_US_HASH)
        .find_map(|&(usage, plain, shifted)| {
            if c == plain {
                Some((usage, false))
            } else if c == shifted {
                Some((usage, true))
            } else {
                None
            }
        })
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════
