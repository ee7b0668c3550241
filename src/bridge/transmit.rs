//! The transmit task - single consumer of the key-event queue.

use defmt::{debug, warn};

use crate::ble::KeySink;
use crate::bridge::queue::KeyEventQueue;
use crate::bridge::relay::{KeyRelay, Outcome};
use crate::statuslog::StatusLog;

/// Dequeue events forever and replay them onto the BLE output.
///
/// The only suspension point is the queue's blocking receive; when idle
/// this task does not spin. Exactly one instance runs - it owns the
/// relay and with it the active modifier mask.
pub async fn transmit_task<S: KeySink>(
    events: &'static KeyEventQueue,
    sink: &mut S,
    log: &'static StatusLog,
) -> ! {
    let mut relay = KeyRelay::new();
    loop {
        let event = events.dequeue().await;
        debug!(
            "key event: usage=0x{:02x} mods=0x{:02x} pressed={}",
            event.usage, event.modifiers, event.pressed
        );
        match relay.handle(event, sink) {
            Outcome::Done | Outcome::Discarded => {}
            Outcome::Unknown(usage) => {
                // Diagnostics only; the key is skipped, never fatal.
                warn!("unknown usage 0x{:02x}", usage);
                log.log_fmt(format_args!("UNKNOWN USAGE 0x{:02X}", usage));
            }
        }
    }
}
