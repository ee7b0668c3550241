//! usb2ble - USB-to-BLE HID keyboard bridge.
//!
//! A wired USB keyboard plugs into the device; the device presents
//! itself to a remote host as a BLE keyboard and replays every key.
//!
//! The core is the event bridge:
//!
//! 1. The vendor USB host stack delivers raw boot-protocol reports into
//!    [`bridge::ingress::ReportIngress`] (interrupt or driver-task
//!    context).
//! 2. [`hid::boot_report::diff`] turns level-sampled reports into
//!    discrete press/release [`hid::KeyEvent`]s.
//! 3. A bounded [`bridge::queue::KeyEventQueue`] decouples the report
//!    path from the single transmit consumer.
//! 4. [`bridge::relay::KeyRelay`] replays events onto a [`ble::KeySink`]
//!    with modifier-bitmask reconciliation and US-QWERTY translation.
//!
//! All of that logic is `no_std`, allocation-free and host-testable with
//! plain `cargo test`. The `embedded` feature adds the run-forever task
//! functions, the SoftDevice HID-over-GATT keyboard and the OLED status
//! log for the nRF52840 target; a board crate provides the vendor USB
//! host driver behind [`usb::HostStack`] and spawns the tasks.

#![cfg_attr(not(test), no_std)]

pub mod battery;
pub mod ble;
pub mod bridge;
pub mod config;
pub mod error;
pub mod hid;
pub mod statuslog;
pub mod usb;

#[cfg(feature = "embedded")]
pub mod ui;

pub use ble::{KeySink, SinkKey};
pub use bridge::ingress::ReportIngress;
pub use bridge::queue::KeyEventQueue;
pub use bridge::relay::{KeyRelay, Outcome};
pub use error::Error;
pub use hid::boot_report::{diff, BootReport};
pub use hid::KeyEvent;
pub use statuslog::StatusLog;
