//! On-device status display.
//!
//! A single view: the last few status-log records on a 128×64 SSD1306,
//! scrolled as new records arrive. Purely diagnostic - the bridge runs
//! headless without it.

pub mod display;
