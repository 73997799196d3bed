//! Folding decoded record messages into running data points.

use serde::Serialize;

use super::stream::DataMessage;
use super::units;

// Record-message (global 20) field numbers from the FIT profile.
const ALTITUDE: u8 = 2;
const HEART_RATE: u8 = 3;
const CADENCE: u8 = 4;
const DISTANCE: u8 = 5;
const SPEED: u8 = 6;
const POWER: u8 = 7;
const VERTICAL_OSCILLATION: u8 = 39;
const STANCE_TIME: u8 = 41;
const FRACTIONAL_CADENCE: u8 = 53;
const ENHANCED_SPEED: u8 = 73;
const ENHANCED_ALTITUDE: u8 = 78;
const VERTICAL_RATIO: u8 = 83;
const STANCE_TIME_BALANCE: u8 = 84;
const STEP_LENGTH: u8 = 85;
const TIMESTAMP: u8 = 253;

/// One unit-correct running sample.
///
/// Every physical field is either a range-checked value or explicitly absent
/// — never a raw scaled integer. Ground contact time keeps the historical
/// zero-as-absent sentinel; the remaining optionals use `None`.
#[derive(Debug, Clone, Serialize)]
pub struct RunningDataPoint {
    /// Position in the accepted-record sequence.
    pub index: usize,
    /// Device timestamp in epoch seconds, or the sequence index when the
    /// record carried no timestamp.
    pub timestamp: f64,
    /// Cumulative distance in km, monotonically non-decreasing.
    pub distance_km: f64,
    pub speed_m_s: f64,
    pub pace_min_km: Option<f64>,
    /// Ground contact time in ms; 0 means absent.
    pub ground_contact_ms: f64,
    pub vertical_oscillation_cm: Option<f64>,
    pub step_length_mm: Option<f64>,
    pub cadence_spm: Option<f64>,
    pub vertical_ratio_pct: Option<f64>,
    pub balance_pct: Option<f64>,
    pub heart_rate_bpm: Option<f64>,
    pub power_w: Option<f64>,
    pub altitude_m: Option<f64>,
    pub form_power_w: Option<f64>,
    pub leg_spring_stiffness: Option<f64>,
    pub air_power_w: Option<f64>,
    pub impact_gs: Option<f64>,
}

/// Per-parse fold state: the accepted-point counter and the distance
/// carry-forward.
#[derive(Debug, Default)]
pub struct PointAssembler {
    index: usize,
    last_distance_km: f64,
}

impl PointAssembler {
    /// Fold one record message into a point.
    ///
    /// Returns `None` for records without a viable speed value; dropping
    /// them is the acceptance filter, not an error. Where Garmin-native and
    /// Stryd-developer fields overlap, the chain below picks one source
    /// deliberately: native ground contact and oscillation are trusted over
    /// the pod's, while the pod's power is trusted over the watch's.
    pub fn assemble(&mut self, message: &DataMessage) -> Option<RunningDataPoint> {
        let native = |num: u8| message.fields.get(&num).copied();
        let dev = |name: &str| message.dev_fields.get(name).copied();

        let speed_m_s = native(ENHANCED_SPEED)
            .or_else(|| native(SPEED))
            .and_then(units::speed_m_s)?;

        let distance_km = native(DISTANCE)
            .and_then(units::distance_km)
            .filter(|&km| km >= self.last_distance_km)
            .unwrap_or(self.last_distance_km);
        self.last_distance_km = distance_km;

        // Native fields carry the Garmin raw encodings; developer pods
        // report these two metrics already in physical units.
        let ground_contact_ms = native(STANCE_TIME)
            .and_then(units::ground_contact_ms)
            .or_else(|| dev("ground_time").and_then(units::developer_ground_contact_ms))
            .unwrap_or(0.0);

        let vertical_oscillation_cm = native(VERTICAL_OSCILLATION)
            .and_then(units::vertical_oscillation_cm)
            .or_else(|| dev("vertical_oscillation").and_then(units::developer_vertical_oscillation_cm));

        let step_length_mm = native(STEP_LENGTH).and_then(units::step_length_mm);

        let vertical_ratio_pct = native(VERTICAL_RATIO)
            .and_then(units::vertical_ratio_pct)
            .or_else(|| {
                units::derived_vertical_ratio_pct(
                    vertical_oscillation_cm.unwrap_or(0.0),
                    step_length_mm.unwrap_or(0.0),
                )
            });

        let cadence_spm = native(CADENCE).and_then(|whole| {
            units::cadence_spm(whole, native(FRACTIONAL_CADENCE).unwrap_or(0.0))
        });

        let power_w = dev("power")
            .and_then(units::power_w)
            .or_else(|| native(POWER).and_then(units::power_w));

        let altitude_m = native(ENHANCED_ALTITUDE)
            .or_else(|| native(ALTITUDE))
            .and_then(units::altitude_m)
            .or_else(|| dev("elevation").filter(|&m| m > 0.0));

        let index = self.index;
        self.index += 1;

        Some(RunningDataPoint {
            index,
            timestamp: native(TIMESTAMP).unwrap_or(index as f64),
            distance_km,
            speed_m_s,
            pace_min_km: units::pace_min_km(speed_m_s),
            ground_contact_ms,
            vertical_oscillation_cm,
            step_length_mm,
            cadence_spm,
            vertical_ratio_pct,
            balance_pct: native(STANCE_TIME_BALANCE).and_then(units::stance_time_balance_pct),
            heart_rate_bpm: native(HEART_RATE).and_then(units::heart_rate_bpm),
            power_w,
            altitude_m,
            form_power_w: dev("form_power").and_then(units::power_w),
            leg_spring_stiffness: dev("leg_spring_stiffness").filter(|&v| v > 0.0),
            air_power_w: dev("air_power").and_then(units::power_w),
            impact_gs: dev("impact_gs").filter(|&v| v > 0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(u8, f64)]) -> DataMessage {
        let mut message = DataMessage {
            global_message_number: super::super::stream::RECORD_MESSAGE,
            ..DataMessage::default()
        };
        for &(num, value) in fields {
            message.fields.insert(num, value);
        }
        message
    }

    #[test]
    fn records_without_speed_are_dropped() {
        let mut assembler = PointAssembler::default();
        let message = record(&[(DISTANCE, 500_000.0), (HEART_RATE, 150.0)]);
        assert!(assembler.assemble(&message).is_none());
        assert_eq!(assembler.index, 0);
    }

    #[test]
    fn distance_carries_forward_when_absent_or_regressing() {
        let mut assembler = PointAssembler::default();

        let first = assembler
            .assemble(&record(&[(SPEED, 3000.0), (DISTANCE, 500_000.0)]))
            .unwrap();
        assert_eq!(first.distance_km, 5.0);

        let second = assembler.assemble(&record(&[(SPEED, 3000.0)])).unwrap();
        assert_eq!(second.distance_km, 5.0);

        let third = assembler
            .assemble(&record(&[(SPEED, 3000.0), (DISTANCE, 400_000.0)]))
            .unwrap();
        assert_eq!(third.distance_km, 5.0);
    }

    #[test]
    fn developer_power_wins_over_native_power() {
        let mut assembler = PointAssembler::default();
        let mut message = record(&[(SPEED, 3000.0), (POWER, 250.0)]);
        message.dev_fields.insert("power".into(), 263.0);

        let point = assembler.assemble(&message).unwrap();
        assert_eq!(point.power_w, Some(263.0));
    }

    #[test]
    fn native_ground_contact_wins_over_developer() {
        let mut assembler = PointAssembler::default();
        let mut message = record(&[(SPEED, 3000.0), (STANCE_TIME, 2200.0)]);
        message.dev_fields.insert("ground_time".into(), 250.0);

        let point = assembler.assemble(&message).unwrap();
        assert_eq!(point.ground_contact_ms, 220.0);
    }

    #[test]
    fn developer_ground_contact_fills_in_without_rescaling() {
        let mut assembler = PointAssembler::default();
        let mut message = record(&[(SPEED, 3000.0)]);
        // A pod reports ground time in plain milliseconds.
        message.dev_fields.insert("ground_time".into(), 250.0);

        let point = assembler.assemble(&message).unwrap();
        assert_eq!(point.ground_contact_ms, 250.0);
    }

    #[test]
    fn developer_vertical_oscillation_fills_in_as_centimeters() {
        let mut assembler = PointAssembler::default();
        let mut message = record(&[(SPEED, 3000.0)]);
        message.dev_fields.insert("vertical_oscillation".into(), 9.2);

        let point = assembler.assemble(&message).unwrap();
        assert_eq!(point.vertical_oscillation_cm, Some(9.2));
    }

    #[test]
    fn out_of_range_ground_contact_reads_as_the_zero_sentinel() {
        let mut assembler = PointAssembler::default();
        let point = assembler
            .assemble(&record(&[(SPEED, 3000.0), (STANCE_TIME, 50.0)]))
            .unwrap();
        assert_eq!(point.ground_contact_ms, 0.0);
    }

    #[test]
    fn vertical_ratio_is_derived_when_missing() {
        let mut assembler = PointAssembler::default();
        let point = assembler
            .assemble(&record(&[
                (SPEED, 3000.0),
                (VERTICAL_OSCILLATION, 90_000.0),
                (STEP_LENGTH, 10_000.0),
            ]))
            .unwrap();
        // 90 cm oscillation over a 1000 mm step is a 90 % ratio.
        assert_eq!(point.vertical_ratio_pct, Some(90.0));
    }

    #[test]
    fn synthetic_timestamp_counts_accepted_records() {
        let mut assembler = PointAssembler::default();
        let first = assembler.assemble(&record(&[(SPEED, 3000.0)])).unwrap();
        let second = assembler.assemble(&record(&[(SPEED, 3000.0)])).unwrap();
        assert_eq!(first.timestamp, 0.0);
        assert_eq!(second.timestamp, 1.0);
    }

    #[test]
    fn enhanced_fields_take_precedence() {
        let mut assembler = PointAssembler::default();
        let point = assembler
            .assemble(&record(&[
                (SPEED, 2000.0),
                (ENHANCED_SPEED, 3000.0),
                (ALTITUDE, 2600.0),
                (ENHANCED_ALTITUDE, 3100.0),
            ]))
            .unwrap();
        assert_eq!(point.speed_m_s, 3.0);
        assert_eq!(point.altitude_m, Some(120.0));
    }
}
