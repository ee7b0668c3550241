//! Bounded key-event queue between the report path and the transmit task.
//!
//! The producer side may run in interrupt context or in an ordinary
//! driver-task context; `Channel` over a `CriticalSectionRawMutex` gives
//! one non-blocking send primitive that is safe from both, and the
//! consumer's waker takes care of scheduling the transmit task when a
//! send lands.
//!
//! Backpressure policy: **drop the new event**. Losing a press/release
//! under sustained overflow is safer than stalling an interrupt or a USB
//! callback. This is deliberately the opposite of the status log's
//! drop-oldest policy (`statuslog`); the two queues stay separate types
//! so neither policy can leak into the other.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::config::KEY_QUEUE_DEPTH;
use crate::hid::KeyEvent;

/// FIFO of discrete key events, capacity fixed at construction.
pub struct KeyEventQueue {
    channel: Channel<CriticalSectionRawMutex, KeyEvent, KEY_QUEUE_DEPTH>,
}

impl KeyEventQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Non-blocking enqueue, callable from interrupt and task context.
    ///
    /// Returns `false` when the queue was full and the event was dropped;
    /// the queue contents are left unchanged in that case.
    pub fn enqueue(&self, event: KeyEvent) -> bool {
        self.channel.try_send(event).is_ok()
    }

    /// Dequeue the next event, suspending indefinitely while idle.
    ///
    /// The transmit task has no other work, so there is no timeout here.
    pub async fn dequeue(&self) -> KeyEvent {
        self.channel.receive().await
    }

    /// Non-blocking dequeue for tests and draining.
    pub fn try_dequeue(&self) -> Option<KeyEvent> {
        self.channel.try_receive().ok()
    }
}

impl Default for KeyEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════
