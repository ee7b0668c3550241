//! Report ingestion - the interface-callback entry point.
//!
//! One [`ReportIngress`] exists per logical keyboard device. It owns that
//! device's previous boot-report snapshot, so it must only be invoked
//! from the driver's single-threaded report-callback path (interrupt or
//! driver task); the handle is moved into the driver at `open` time
//! instead of being reached through any global state.

use crate::bridge::queue::KeyEventQueue;
use crate::hid::boot_report::{diff, BootReport};
use crate::hid::KeyEvent;
use crate::statuslog::StatusLog;

/// Per-device parse + diff + enqueue pipeline.
pub struct ReportIngress {
    prev: BootReport,
    events: &'static KeyEventQueue,
    log: &'static StatusLog,
}

impl ReportIngress {
    /// Fresh pipeline starting from the all-released snapshot.
    pub fn new(events: &'static KeyEventQueue, log: &'static StatusLog) -> Self {
        Self {
            prev: BootReport::empty(),
            events,
            log,
        }
    }

    /// Feed one raw input report straight from the driver callback.
    ///
    /// Never blocks. Garbled buffers are logged and skipped; a full
    /// queue silently drops the new event.
    pub fn on_report(&mut self, raw: &[u8]) {
        let Some(curr) = BootReport::from_report_bytes(raw) else {
            self.log
                .log_fmt(format_args!("USB: bad report ({} bytes)", raw.len()));
            return;
        };

        let mods_changed = curr.modifiers != self.prev.modifiers;
        let events = diff(&mut self.prev, &curr);

        if events.is_empty() {
            // The differ never emits usage 0; a report that only moved
            // the modifier byte still has to reach the BLE side, or a
            // lone Ctrl/Shift would not assert until the next key.
            if mods_changed {
                let _ = self.events.enqueue(KeyEvent::press(0, curr.modifiers));
            }
            return;
        }

        for event in events {
            let _ = self.events.enqueue(event);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (&'static KeyEventQueue, &'static StatusLog) {
        // Each test leaks its own queue pair; fine for test lifetime.
        (
            Box::leak(Box::new(KeyEventQueue::new())),
            Box::leak(Box::new(StatusLog::new())),
        )
    }

    #[test]
    fn press_and_release_flow_through() {
        let (queue, log) = fixtures();
        let mut ingress = ReportIngress::new(queue, log);
        ingress.on_report(&[0x00, 0x00, 0x04, 0, 0, 0, 0, 0]);
        ingress.on_report(&[0x00, 0x00, 0x00, 0, 0, 0, 0, 0]);
        assert_eq!(queue.try_dequeue(), Some(KeyEvent::press(0x04, 0)));
        assert_eq!(queue.try_dequeue(), Some(KeyEvent::release(0x04, 0)));
        assert_eq!(queue.try_dequeue(), None);
    }

    #[test]
    fn modifier_only_report_becomes_a_sync_event() {
        let (queue, log) = fixtures();
        let mut ingress = ReportIngress::new(queue, log);
        ingress.on_report(&[0x02, 0x00, 0, 0, 0, 0, 0, 0]);
        assert_eq!(queue.try_dequeue(), Some(KeyEvent::press(0, 0x02)));
        // Release of the modifier syncs back to zero.
        ingress.on_report(&[0x00, 0x00, 0, 0, 0, 0, 0, 0]);
        assert_eq!(queue.try_dequeue(), Some(KeyEvent::press(0, 0x00)));
        assert_eq!(queue.try_dequeue(), None);
    }

    #[test]
    fn no_sync_event_when_key_events_already_carry_the_mods() {
        let (queue, log) = fixtures();
        let mut ingress = ReportIngress::new(queue, log);
        // Shift and 'a' land in the same report: the press event carries
        // the new modifiers, no extra sync event is queued.
        ingress.on_report(&[0x02, 0x00, 0x04, 0, 0, 0, 0, 0]);
        assert_eq!(queue.try_dequeue(), Some(KeyEvent::press(0x04, 0x02)));
        assert_eq!(queue.try_dequeue(), None);
    }

    #[test]
    fn identical_reports_are_quiet() {
        let (queue, log) = fixtures();
        let mut ingress = ReportIngress::new(queue, log);
        let report = [0x02, 0x00, 0x04, 0, 0, 0, 0, 0];
        ingress.on_report(&report);
        while queue.try_dequeue().is_some() {}
        ingress.on_report(&report);
        ingress.on_report(&report);
        assert_eq!(queue.try_dequeue(), None);
    }

    #[test]
    fn garbled_report_is_logged_and_skipped() {
        let (queue, log) = fixtures();
        let mut ingress = ReportIngress::new(queue, log);
        ingress.on_report(&[0x01, 0x02, 0x03]);
        assert_eq!(queue.try_dequeue(), None);
        assert_eq!(log.try_pop().unwrap().as_str(), "USB: bad report (3 bytes)");
        // The bad buffer must not have corrupted the snapshot.
        ingress.on_report(&[0x00, 0x00, 0x04, 0, 0, 0, 0, 0]);
        assert_eq!(queue.try_dequeue(), Some(KeyEvent::press(0x04, 0)));
    }
}
