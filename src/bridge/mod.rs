//! The event bridge - everything between the USB report callback and the
//! BLE keyboard output.
//!
//! Data flow:
//!
//! ```text
//! driver report callback -> ReportIngress (parse + diff)
//!                        -> KeyEventQueue (bounded, drop-new)
//!                        -> transmit task / KeyRelay (modifier reconciliation)
//!                        -> KeySink (BLE keyboard)
//! ```
//!
//! The ingress and the relay each own their piece of mutable state
//! (previous snapshot, active modifier mask) and run on exactly one path;
//! the queue is the only thing shared across contexts.

pub mod ingress;
pub mod queue;
pub mod relay;

#[cfg(feature = "embedded")]
pub mod controller;
#[cfg(feature = "embedded")]
pub mod transmit;
