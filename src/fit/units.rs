//! Raw-to-physical unit conversion.
//!
//! Record fields arrive as scaled integers whose scale and offset are not
//! carried in the stream. Each function here applies one field's fixed
//! conversion and a plausibility gate, returning `None` instead of passing
//! sensor garbage downstream. A raw value of zero always reads as "field not
//! present": the format cannot distinguish a stationary runner's literal zero
//! from a missing sample, and consumers rely on the absent reading.

/// Distance: centimeters → kilometers.
pub fn distance_km(raw: f64) -> Option<f64> {
    (raw > 0.0).then(|| raw / 100.0 / 1000.0)
}

/// Speed: mm/s → m/s.
///
/// Some firmware writes this field already in m/s; values at or below 100
/// are taken at face value since no runner moves at 100 m/s.
pub fn speed_m_s(raw: f64) -> Option<f64> {
    if raw <= 0.0 {
        return None;
    }
    Some(if raw > 100.0 { raw / 1000.0 } else { raw })
}

/// Pace in min/km derived from speed in m/s.
pub fn pace_min_km(speed_m_s: f64) -> Option<f64> {
    (speed_m_s > 0.0).then(|| 1000.0 / (speed_m_s * 60.0))
}

/// Ground contact time: 0.1 ms units → ms, gated to the 150–400 ms band a
/// running footstrike can actually produce.
pub fn ground_contact_ms(raw: f64) -> Option<f64> {
    if raw <= 0.0 {
        return None;
    }
    gate_ground_contact(raw / 10.0)
}

/// Ground contact time a developer pod reports already in milliseconds.
/// Only the plausibility gate applies; the Garmin 0.1 ms scaling does not.
pub fn developer_ground_contact_ms(ms: f64) -> Option<f64> {
    gate_ground_contact(ms)
}

fn gate_ground_contact(ms: f64) -> Option<f64> {
    (150.0..=400.0).contains(&ms).then_some(ms)
}

/// Vertical oscillation → cm.
pub fn vertical_oscillation_cm(raw: f64) -> Option<f64> {
    (raw > 0.0).then(|| raw / 1000.0)
}

/// Vertical oscillation a developer pod reports already in centimeters.
pub fn developer_vertical_oscillation_cm(cm: f64) -> Option<f64> {
    (cm > 0.0).then_some(cm)
}

/// Step length: 0.1 mm units → mm.
pub fn step_length_mm(raw: f64) -> Option<f64> {
    (raw > 0.0).then(|| raw / 10.0)
}

/// Vertical ratio: 0.01 % units → %.
pub fn vertical_ratio_pct(raw: f64) -> Option<f64> {
    (raw > 0.0).then(|| raw / 100.0)
}

/// Vertical ratio recomputed from its definition when the device did not
/// write the field.
pub fn derived_vertical_ratio_pct(oscillation_cm: f64, step_length_mm: f64) -> Option<f64> {
    if oscillation_cm <= 0.0 || step_length_mm <= 0.0 {
        return None;
    }
    Some((oscillation_cm * 10.0 / step_length_mm) * 100.0)
}

/// Left/right stance-time balance: 0.01 % units → %.
///
/// The 40–60 % acceptance band is an aggregation-stage concern and is not
/// applied here.
pub fn stance_time_balance_pct(raw: f64) -> Option<f64> {
    (raw > 0.0).then(|| raw / 100.0)
}

/// Cadence: whole steps per leg plus a 1/128-step fractional component,
/// doubled to full-body steps per minute.
pub fn cadence_spm(raw: f64, fractional: f64) -> Option<f64> {
    (raw > 0.0).then(|| (raw + fractional / 128.0) * 2.0)
}

/// Altitude: 1/5 m units with a 500 m offset.
pub fn altitude_m(raw: f64) -> Option<f64> {
    (raw > 0.0).then(|| raw / 5.0 - 500.0)
}

/// Heart rate: stored unscaled in bpm.
pub fn heart_rate_bpm(raw: f64) -> Option<f64> {
    (raw > 0.0).then_some(raw)
}

/// Power: stored unscaled in watts.
pub fn power_w(raw: f64) -> Option<f64> {
    (raw > 0.0).then_some(raw)
}
