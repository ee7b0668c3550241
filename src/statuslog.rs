//! Human-readable status log feeding the on-device display.
//!
//! A second, independent bounded queue next to the key-event queue, with
//! the **opposite** backpressure policy: on overflow the *oldest* record
//! is evicted to make room, because log freshness matters more than
//! completeness. Key events must never be steered through this type and
//! log records never through `bridge::queue` - the two policies stay in
//! two separate components.
//!
//! `log`/`log_fmt` never block and never fail visibly; a logging problem
//! is a no-op, not an error.

use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use heapless::String;

use crate::config::{LOG_QUEUE_DEPTH, LOG_RECORD_BYTES};

/// One fixed-size log record; longer messages are truncated.
pub type Record = String<LOG_RECORD_BYTES>;

/// Drop-oldest bounded queue of status records.
pub struct StatusLog {
    records: Channel<CriticalSectionRawMutex, Record, LOG_QUEUE_DEPTH>,
}

impl StatusLog {
    pub const fn new() -> Self {
        Self {
            records: Channel::new(),
        }
    }

    /// Append a record, evicting the oldest one first when full.
    ///
    /// Safe from interrupt and task context; never blocks.
    pub fn push(&self, record: Record) {
        if let Err(TrySendError::Full(record)) = self.records.try_send(record) {
            let _ = self.records.try_receive();
            let _ = self.records.try_send(record);
        }
    }

    /// Log a plain message.
    pub fn log(&self, message: &str) {
        let mut record = Record::new();
        let mut w = Truncating(&mut record);
        let _ = fmt::Write::write_str(&mut w, message);
        self.push(record);
    }

    /// Log a formatted message, e.g.
    /// `log.log_fmt(format_args!("CONNECTED proto {}", proto))`.
    pub fn log_fmt(&self, args: fmt::Arguments<'_>) {
        let mut record = Record::new();
        let mut w = Truncating(&mut record);
        let _ = fmt::Write::write_fmt(&mut w, args);
        self.push(record);
    }

    /// Wait for the next record (display renderer side).
    pub async fn next(&self) -> Record {
        self.records.receive().await
    }

    /// Non-blocking pop for tests and draining.
    pub fn try_pop(&self) -> Option<Record> {
        self.records.try_receive().ok()
    }
}

impl Default for StatusLog {
    fn default() -> Self {
        Self::new()
    }
}

/// `fmt::Write` adapter that drops whatever does not fit instead of
/// failing the whole write (heapless `String` rejects oversized segments
/// wholesale, which would lose the entire message).
struct Truncating<'a>(&'a mut Record);

impl fmt::Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_come_out_in_order() {
        let log = StatusLog::new();
        log.log("first");
        log.log("second");
        assert_eq!(log.try_pop().unwrap().as_str(), "first");
        assert_eq!(log.try_pop().unwrap().as_str(), "second");
        assert!(log.try_pop().is_none());
    }

    #[test]
    fn full_queue_evicts_exactly_the_oldest() {
        let log = StatusLog::new();
        for i in 0..LOG_QUEUE_DEPTH {
            log.log_fmt(format_args!("msg {}", i));
        }
        log.log("newest");
        // "msg 0" is gone, "msg 1" is now the head, "newest" is the tail.
        assert_eq!(log.try_pop().unwrap().as_str(), "msg 1");
        let mut last = Record::new();
        while let Some(rec) = log.try_pop() {
            last = rec;
        }
        assert_eq!(last.as_str(), "newest");
    }

    #[test]
    fn long_messages_truncate_silently() {
        let log = StatusLog::new();
        let long = "x".repeat(LOG_RECORD_BYTES * 2);
        log.log(&long);
        let rec = log.try_pop().unwrap();
        assert_eq!(rec.len(), LOG_RECORD_BYTES);
    }

    #[test]
    fn formatted_records_truncate_mid_argument() {
        let log = StatusLog::new();
        log.log_fmt(format_args!("{}{}", "a".repeat(LOG_RECORD_BYTES - 2), "bcdef"));
        let rec = log.try_pop().unwrap();
        assert_eq!(rec.len(), LOG_RECORD_BYTES);
        assert!(rec.starts_with('a'));
        assert!(rec.ends_with("bc"));
    }

    #[test]
    fn formatting_renders_values() {
        let log = StatusLog::new();
        log.log_fmt(format_args!("UNKNOWN USAGE 0x{:02X}", 0x73u8));
        assert_eq!(log.try_pop().unwrap().as_str(), "UNKNOWN USAGE 0x73");
    }
}
