//! Replay of discrete key events onto the BLE output.
//!
//! [`KeyRelay`] is the pure core of the transmit task: it owns the
//! modifier bitmask currently asserted on the BLE side and turns each
//! dequeued [`KeyEvent`] into `press`/`release`/`write` calls on a
//! [`KeySink`]. Nothing else reads or writes that mask.

use crate::ble::{KeySink, SinkKey};
use crate::hid::usage::{self, MODIFIER_CONTROLS};
use crate::hid::KeyEvent;

/// What became of one handled event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Link down - event discarded without touching any state.
    ///
    /// Key state on a dead link has no meaning, and replaying stale
    /// events after a reconnect would desynchronise the remote host, so
    /// there is no buffering for later.
    Discarded,
    /// Event fully handled (dispatched, or a pure modifier sync).
    Done,
    /// Press of a usage with neither a character nor a named control.
    /// The caller logs it; never fatal.
    Unknown(u8),
}

/// Consumer-side state machine: Disconnected/Connected, plus the
/// modifier mask asserted on the remote host.
#[derive(Debug, Default)]
pub struct KeyRelay {
    active_mods: u8,
}

impl KeyRelay {
    pub const fn new() -> Self {
        Self { active_mods: 0 }
    }

    /// Modifier bitmask currently asserted on the BLE side.
    pub fn active_mods(&self) -> u8 {
        self.active_mods
    }

    /// Handle one dequeued event against the BLE output.
    pub fn handle<S: KeySink>(&mut self, event: KeyEvent, sink: &mut S) -> Outcome {
        if !sink.is_connected() {
            return Outcome::Discarded;
        }

        if event.modifiers != self.active_mods {
            let released = self.active_mods & !event.modifiers;
            let pressed = event.modifiers & !self.active_mods;

            // Each bit gets its own check: several modifiers can change
            // in a single report.
            for &(bit, control) in &MODIFIER_CONTROLS {
                if released & bit != 0 {
                    sink.release(SinkKey::Control(control));
                }
            }
            for &(bit, control) in &MODIFIER_CONTROLS {
                if pressed & bit != 0 {
                    sink.press(SinkKey::Control(control));
                }
            }

            self.active_mods = event.modifiers;
        }

        // Pure modifier sync - no key to dispatch.
        if event.is_modifier_sync() {
            return Outcome::Done;
        }

        if let Some(c) = usage::translate(event.usage, event.modifiers) {
            // `write` is a full press+release on the sink side, so the
            // matching release event needs no dispatch of its own. The
            // flip side: a held character key repeats only on the wired
            // keyboard's own reports, and a held named control below is
            // indistinguishable from a tap. Known limitation, kept as
            // observed.
            if event.pressed {
                sink.write(SinkKey::Char(c));
            }
            Outcome::Done
        } else if let Some(control) = usage::control_for(event.usage) {
            if event.pressed {
                sink.write(SinkKey::Control(control));
            }
            Outcome::Done
        } else if event.pressed {
            Outcome::Unknown(event.usage)
        } else {
            Outcome::Done
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::usage::{
        Control, MOD_LEFT_CTRL, MOD_LEFT_SHIFT, MOD_RIGHT_ALT, MOD_RIGHT_SHIFT,
    };

    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    enum Call {
        Press(SinkKey),
        Release(SinkKey),
        Write(SinkKey),
    }

    struct MockSink {
        connected: bool,
        calls: Vec<Call>,
    }

    impl MockSink {
        fn connected() -> Self {
            Self {
                connected: true,
                calls: Vec::new(),
            }
        }

        fn disconnected() -> Self {
            Self {
                connected: false,
                calls: Vec::new(),
            }
        }
    }

    impl KeySink for MockSink {
        fn is_connected(&self) -> bool {
            self.connected
        }
        fn press(&mut self, key: SinkKey) {
            self.calls.push(Call::Press(key));
        }
        fn release(&mut self, key: SinkKey) {
            self.calls.push(Call::Release(key));
        }
        fn write(&mut self, key: SinkKey) {
            self.calls.push(Call::Write(key));
        }
    }

    #[test]
    fn disconnected_discards_without_side_effects() {
        let mut relay = KeyRelay::new();
        let mut sink = MockSink::disconnected();
        let out = relay.handle(KeyEvent::press(0x04, MOD_LEFT_SHIFT), &mut sink);
        assert_eq!(out, Outcome::Discarded);
        assert!(sink.calls.is_empty());
        assert_eq!(relay.active_mods(), 0);
    }

    #[test]
    fn plain_press_writes_the_character() {
        let mut relay = KeyRelay::new();
        let mut sink = MockSink::connected();
        let out = relay.handle(KeyEvent::press(0x04, 0), &mut sink);
        assert_eq!(out, Outcome::Done);
        assert_eq!(sink.calls, vec![Call::Write(SinkKey::Char('a'))]);
    }

    #[test]
    fn release_of_translated_key_is_not_dispatched() {
        let mut relay = KeyRelay::new();
        let mut sink = MockSink::connected();
        relay.handle(KeyEvent::press(0x04, 0), &mut sink);
        sink.calls.clear();
        let out = relay.handle(KeyEvent::release(0x04, 0), &mut sink);
        assert_eq!(out, Outcome::Done);
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn shifted_press_asserts_shift_then_writes_uppercase() {
        let mut relay = KeyRelay::new();
        let mut sink = MockSink::connected();
        relay.handle(KeyEvent::press(0x04, MOD_LEFT_SHIFT), &mut sink);
        assert_eq!(
            sink.calls,
            vec![
                Call::Press(SinkKey::Control(Control::LeftShift)),
                Call::Write(SinkKey::Char('A')),
            ]
        );
        assert_eq!(relay.active_mods(), MOD_LEFT_SHIFT);
    }

    #[test]
    fn modifier_round_trip_restores_state() {
        let mut relay = KeyRelay::new();
        let mut sink = MockSink::connected();
        let before = relay.active_mods();
        relay.handle(KeyEvent::press(0, MOD_LEFT_CTRL), &mut sink);
        relay.handle(KeyEvent::release(0, 0), &mut sink);
        assert_eq!(relay.active_mods(), before);
        assert_eq!(
            sink.calls,
            vec![
                Call::Press(SinkKey::Control(Control::LeftCtrl)),
                Call::Release(SinkKey::Control(Control::LeftCtrl)),
            ]
        );
    }

    #[test]
    fn several_modifiers_change_in_one_event() {
        let mut relay = KeyRelay::new();
        let mut sink = MockSink::connected();
        relay.handle(
            KeyEvent::press(0, MOD_LEFT_CTRL | MOD_LEFT_SHIFT | MOD_RIGHT_ALT),
            &mut sink,
        );
        sink.calls.clear();
        // Ctrl and Alt drop, right shift lands - all in one report.
        relay.handle(
            KeyEvent::press(0, MOD_LEFT_SHIFT | MOD_RIGHT_SHIFT),
            &mut sink,
        );
        assert_eq!(
            sink.calls,
            vec![
                Call::Release(SinkKey::Control(Control::LeftCtrl)),
                Call::Release(SinkKey::Control(Control::RightAlt)),
                Call::Press(SinkKey::Control(Control::RightShift)),
            ]
        );
        assert_eq!(relay.active_mods(), MOD_LEFT_SHIFT | MOD_RIGHT_SHIFT);
    }

    #[test]
    fn modifier_sync_does_not_dispatch_a_key() {
        let mut relay = KeyRelay::new();
        let mut sink = MockSink::connected();
        let out = relay.handle(KeyEvent::press(0, MOD_LEFT_SHIFT), &mut sink);
        assert_eq!(out, Outcome::Done);
        assert_eq!(
            sink.calls,
            vec![Call::Press(SinkKey::Control(Control::LeftShift))]
        );
    }

    #[test]
    fn named_control_press_is_written_once() {
        let mut relay = KeyRelay::new();
        let mut sink = MockSink::connected();
        relay.handle(KeyEvent::press(0x28, 0), &mut sink);
        assert_eq!(
            sink.calls,
            vec![Call::Write(SinkKey::Control(Control::Enter))]
        );
        sink.calls.clear();
        relay.handle(KeyEvent::release(0x28, 0), &mut sink);
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn unknown_press_is_reported_not_dispatched() {
        let mut relay = KeyRelay::new();
        let mut sink = MockSink::connected();
        let out = relay.handle(KeyEvent::press(0x73, 0), &mut sink);
        assert_eq!(out, Outcome::Unknown(0x73));
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn unknown_release_is_silent() {
        let mut relay = KeyRelay::new();
        let mut sink = MockSink::connected();
        let out = relay.handle(KeyEvent::release(0x73, 0), &mut sink);
        assert_eq!(out, Outcome::Done);
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn release_uses_modifiers_from_press_time() {
        // Shift released between press and release of 'a': the release
        // event was built with the press-time modifiers upstream, and the
        // relay re-syncs the mask from whatever each event carries.
        let mut relay = KeyRelay::new();
        let mut sink = MockSink::connected();
        relay.handle(KeyEvent::press(0x04, MOD_RIGHT_SHIFT), &mut sink);
        sink.calls.clear();
        relay.handle(KeyEvent::release(0x04, MOD_RIGHT_SHIFT), &mut sink);
        // Same mask as before: no modifier churn, no dispatch.
        assert!(sink.calls.is_empty());
        assert_eq!(relay.active_mods(), MOD_RIGHT_SHIFT);
    }
}
