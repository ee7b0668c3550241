//! Application-wide constants and compile-time configuration.
//!
//! All queue depths, timing parameters, and protocol constants live here
//! so they can be tuned in one place.

// Queues

/// Capacity of the key-event queue between the report path and the
/// transmit task. Overflow drops the newest event.
pub const KEY_QUEUE_DEPTH: usize = 256;

/// Capacity of the driver-event queue between the HID host driver
/// callback and the worker task.
pub const DRIVER_EVENT_QUEUE_DEPTH: usize = 10;

/// Capacity of the status-log queue. Overflow drops the oldest record.
pub const LOG_QUEUE_DEPTH: usize = 16;

/// Maximum bytes per status-log record; longer messages are truncated.
pub const LOG_RECORD_BYTES: usize = 64;

// USB host

/// How long the bridge controller waits for the USB host stack to signal
/// readiness before giving up on startup (ms).
pub const HOST_READY_TIMEOUT_MS: u64 = 3000;

/// Receive timeout of the HID worker task (ms). The bounded wait leaves a
/// periodic slot for housekeeping between driver events.
pub const WORKER_RECV_TIMEOUT_MS: u64 = 50;

// BLE

/// Device name used in advertisements and the GAP name.
pub const BLE_DEVICE_NAME: &str = "usb2ble";

/// Battery level advertised before the first gauge reading arrives (%).
pub const BLE_INITIAL_BATTERY_LEVEL: u8 = 100;

// Battery gauge
//
// The pack voltage reaches the ADC through a resistive divider; the gauge
// converts raw counts back to pack volts before mapping to percent.

/// Top / bottom resistors of the battery divider (ohms).
pub const BATT_R_TOP: f32 = 100_000.0;
pub const BATT_R_BOTTOM: f32 = 100_000.0;

/// Full-scale ADC count (12-bit).
pub const BATT_ADC_MAX: f32 = 4095.0;

/// Nominal ADC reference voltage.
pub const BATT_ADC_REF_VOLTS: f32 = 3.3;

/// Multiplicative correction measured against a DMM; 1.0 = uncalibrated.
pub const BATT_CALIBRATION: f32 = 1.0;

/// EMA smoothing factor for the battery voltage (0..1).
pub const BATT_EMA_ALPHA: f32 = 0.2;

// Status display

/// Number of log lines shown on the 128x64 OLED.
pub const STATUS_DISPLAY_LINES: usize = 4;
