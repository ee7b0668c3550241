//! USB HID usage-code translation for the fixed US-QWERTY layout.
//!
//! Two pure lookups, both callable from tests and the live path with no
//! setup:
//!
//! - [`translate`] maps (usage, modifiers) to a printable character.
//! - [`control_for`] maps a usage to a named control key when no
//!   printable character exists.
//!
//! A usage covered by neither is unknown; the caller logs it and moves on.

// Modifier bitmask (byte 0 of the boot report)
//
//   Bit 0 = Left Ctrl,  Bit 1 = Left Shift,
//   Bit 2 = Left Alt,   Bit 3 = Left GUI,
//   Bit 4 = Right Ctrl, Bit 5 = Right Shift,
//   Bit 6 = Right Alt,  Bit 7 = Right GUI
//
// The assignment is shared by the report differ (producer side) and the
// transmit task (consumer side); no bit represents more than one key.

pub const MOD_LEFT_CTRL: u8 = 0x01;
pub const MOD_LEFT_SHIFT: u8 = 0x02;
pub const MOD_LEFT_ALT: u8 = 0x04;
pub const MOD_LEFT_GUI: u8 = 0x08;
pub const MOD_RIGHT_CTRL: u8 = 0x10;
pub const MOD_RIGHT_SHIFT: u8 = 0x20;
pub const MOD_RIGHT_ALT: u8 = 0x40;
pub const MOD_RIGHT_GUI: u8 = 0x80;

/// Either shift key.
pub const MOD_SHIFT_MASK: u8 = MOD_LEFT_SHIFT | MOD_RIGHT_SHIFT;

// Usage ranges (HID Usage Tables, Keyboard/Keypad page 0x07)

/// 'a' .. 'z'
const ALPHA_FIRST: u8 = 0x04;
const ALPHA_LAST: u8 = 0x1D;

/// Top row '1' .. '0'
const TOPROW_FIRST: u8 = 0x1E;
const TOPROW_LAST: u8 = 0x27;

pub(crate) const TOPROW_PLAIN: &[u8; 10] = b"1234567890";
pub(crate) const TOPROW_SHIFTED: &[u8; 10] = b"!@#$%^&*()";

/// Non-US `#`/`~` key (input-only; see `ble::layout`).
pub(crate) const NON_US_HASH: u8 = 0x32;

/// Punctuation usages with their (unshifted, shifted) characters.
pub(crate) const PUNCTUATION: &[(u8, char, char)] = &[
    (0x2C, ' ', ' '),   // space
    (0x2D, '-', '_'),
    (0x2E, '=', '+'),
    (0x2F, '[', '{'),
    (0x30, ']', '}'),
    (0x31, '\\', '|'),
    (NON_US_HASH, '#', '~'),
    (0x33, ';', ':'),
    (0x34, '\'', '"'),
    (0x35, '`', '~'),
    (0x36, ',', '<'),
    (0x37, '.', '>'),
    (0x38, '/', '?'),
];

/// True when either shift bit is set.
pub fn is_shift(modifiers: u8) -> bool {
    modifiers & MOD_SHIFT_MASK != 0
}

/// Map a usage code to its printable character under the given modifiers.
///
/// Returns `None` for anything that has no printable character; callers
/// then try [`control_for`].
pub fn translate(usage: u8, modifiers: u8) -> Option<char> {
    let shift = is_shift(modifiers);

    if (ALPHA_FIRST..=ALPHA_LAST).contains(&usage) {
        let c = (b'a' + (usage - ALPHA_FIRST)) as char;
        return Some(if shift { c.to_ascii_uppercase() } else { c });
    }

    if (TOPROW_FIRST..=TOPROW_LAST).contains(&usage) {
        let idx = (usage - TOPROW_FIRST) as usize;
        let table = if shift { TOPROW_SHIFTED } else { TOPROW_PLAIN };
        return Some(table[idx] as char);
    }

    PUNCTUATION
        .iter()
        .find(|&&(u, _, _)| u == usage)
        .map(|&(_, plain, shifted)| if shift { shifted } else { plain })
}

/// A named non-printable key the BLE side can act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Control {
    LeftCtrl,
    LeftShift,
    LeftAlt,
    LeftGui,
    RightCtrl,
    RightShift,
    RightAlt,
    RightGui,
    Enter,
    Escape,
    Backspace,
    Tab,
    CapsLock,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    ArrowRight,
    ArrowLeft,
    ArrowDown,
    ArrowUp,
}

const FUNCTION_KEYS: [Control; 12] = [
    Control::F1,
    Control::F2,
    Control::F3,
    Control::F4,
    Control::F5,
    Control::F6,
    Control::F7,
    Control::F8,
    Control::F9,
    Control::F10,
    Control::F11,
    Control::F12,
];

/// Modifier bits paired with the control key asserting them, in bit order.
pub const MODIFIER_CONTROLS: [(u8, Control); 8] = [
    (MOD_LEFT_CTRL, Control::LeftCtrl),
    (MOD_LEFT_SHIFT, Control::LeftShift),
    (MOD_LEFT_ALT, Control::LeftAlt),
    (MOD_LEFT_GUI, Control::LeftGui),
    (MOD_RIGHT_CTRL, Control::RightCtrl),
    (MOD_RIGHT_SHIFT, Control::RightShift),
    (MOD_RIGHT_ALT, Control::RightAlt),
    (MOD_RIGHT_GUI, Control::RightGui),
];

impl Control {
    /// The usage code this key occupies on the Keyboard/Keypad page.
    pub const fn usage(self) -> u8 {
        match self {
            Control::Enter => 0x28,
            Control::Escape => 0x29,
            Control::Backspace => 0x2A,
            Control::Tab => 0x2B,
            Control::CapsLock => 0x39,
            Control::F1 => 0x3A,
            Control::F2 => 0x3B,
            Control::F3 => 0x3C,
            Control::F4 => 0x3D,
            Control::F5 => 0x3E,
            Control::F6 => 0x3F,
            Control::F7 => 0x40,
            Control::F8 => 0x41,
            Control::F9 => 0x42,
            Control::F10 => 0x43,
            Control::F11 => 0x44,
            Control::F12 => 0x45,
            Control::ArrowRight => 0x4F,
            Control::ArrowLeft => 0x50,
            Control::ArrowDown => 0x51,
            Control::ArrowUp => 0x52,
            Control::LeftCtrl => 0xE0,
            Control::LeftShift => 0xE1,
            Control::LeftAlt => 0xE2,
            Control::LeftGui => 0xE3,
            Control::RightCtrl => 0xE4,
            Control::RightShift => 0xE5,
            Control::RightAlt => 0xE6,
            Control::RightGui => 0xE7,
        }
    }
}

/// Second lookup for usages with no printable character.
///
/// Modifier usages (0xE0..=0xE7) are deliberately absent: modifiers reach
/// the BLE side only through the transmit task's bitmask reconciliation,
/// never as named-key dispatch.
pub fn control_for(usage: u8) -> Option<Control> {
    match usage {
        0x28 => Some(Control::Enter),
        0x29 => Some(Control::Escape),
        0x2A => Some(Control::Backspace),
        0x2B => Some(Control::Tab),
        0x39 => Some(Control::CapsLock),
        0x3A..=0x45 => Some(FUNCTION_KEYS[(usage - 0x3A) as usize]),
        0x4F => Some(Control::ArrowRight),
        0x50 => Some(Control::ArrowLeft),
        0x51 => Some(Control::ArrowDown),
        0x52 => Some(Control::ArrowUp),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════
