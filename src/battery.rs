//! Battery gauge - raw ADC counts to a smoothed percentage.
//!
//! The sampling loop itself (ADC peripheral, pins, cadence) lives with
//! the board; this module only does the numeric work on each window of
//! raw counts it is handed:
//!
//! 1. median of the window (average of the middle three to tame jitter),
//! 2. counts -> pack volts through the divider and reference,
//! 3. EMA smoothing across windows,
//! 4. volts -> percent over an 11-point Li-Ion discharge curve with
//!    linear interpolation.
//!
//! The result feeds the BLE Battery Service level and the status log.

use crate::config::{
    BATT_ADC_MAX, BATT_ADC_REF_VOLTS, BATT_CALIBRATION, BATT_EMA_ALPHA, BATT_R_BOTTOM, BATT_R_TOP,
};

/// Discharge curve, descending volts. Endpoints clamp to 100 / 0.
const DISCHARGE_CURVE: [(f32, u8); 11] = [
    (4.20, 100),
    (4.05, 90),
    (3.92, 80),
    (3.86, 70),
    (3.80, 60),
    (3.75, 50),
    (3.70, 40),
    (3.65, 30),
    (3.60, 20),
    (3.55, 10),
    (3.30, 0),
];

/// One smoothed reading.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryReading {
    /// EMA-smoothed pack voltage.
    pub volts: f32,
    /// Percentage mapped from the smoothed voltage.
    pub percent: u8,
}

/// Stateful gauge; one per battery.
#[derive(Debug, Default)]
pub struct BatteryGauge {
    ema_volts: Option<f32>,
}

impl BatteryGauge {
    pub const fn new() -> Self {
        Self { ema_volts: None }
    }

    /// Fold one window of raw ADC counts into the gauge.
    ///
    /// The window is sorted in place. The first window seeds the EMA
    /// directly so startup does not ramp from zero.
    pub fn update(&mut self, window: &mut [u16]) -> BatteryReading {
        let volts = counts_to_volts(median_counts(window));
        let smoothed = match self.ema_volts {
            None => volts,
            Some(prev) => BATT_EMA_ALPHA * volts + (1.0 - BATT_EMA_ALPHA) * prev,
        };
        self.ema_volts = Some(smoothed);
        BatteryReading {
            volts: smoothed,
            percent: percent_for(smoothed),
        }
    }
}

/// Median of a raw sample window, averaged over the middle three.
fn median_counts(window: &mut [u16]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    window.sort_unstable();
    let mid = window.len() / 2;
    let start = mid.saturating_sub(1);
    let end = (mid + 1).min(window.len() - 1);
    let sum: u32 = window[start..=end].iter().map(|&c| c as u32).sum();
    sum as f32 / (end - start + 1) as f32
}

/// Raw ADC counts at the divider tap to pack volts.
pub fn counts_to_volts(counts: f32) -> f32 {
    let v_adc = (counts / BATT_ADC_MAX) * BATT_ADC_REF_VOLTS * BATT_CALIBRATION;
    let divider = (BATT_R_TOP + BATT_R_BOTTOM) / BATT_R_BOTTOM;
    v_adc * divider
}

/// Map pack volts onto the discharge curve with linear interpolation.
pub fn percent_for(volts: f32) -> u8 {
    let (top_v, _) = DISCHARGE_CURVE[0];
    let (bottom_v, _) = DISCHARGE_CURVE[DISCHARGE_CURVE.len() - 1];
    if volts >= top_v {
        return 100;
    }
    if volts <= bottom_v {
        return 0;
    }
    for pair in DISCHARGE_CURVE.windows(2) {
        let (v1, p1) = pair[0];
        let (v2, p2) = pair[1];
        if volts <= v1 && volts >= v2 {
            let frac = (volts - v2) / (v1 - v2);
            let pct = p2 as f32 + frac * (p1 as f32 - p2 as f32);
            return (pct + 0.5) as u8;
        }
    }
    0
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════
