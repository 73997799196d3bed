//! Resolution of developer-extension fields to semantic names.
//!
//! Developer fields are identified on the wire only by a
//! `(developer_data_index, field_slot)` pair. Their meaning comes from one of
//! two places:
//!
//! * Field-description messages (global number 206) announce a name for a
//!   pair before any data message references it. When present, that name
//!   wins.
//! * Otherwise a heuristic classifies each decoded value by the numeric range
//!   a Stryd metric can plausibly occupy, tie-broken by the slot number's
//!   decimal suffix. This is best-effort and can misclassify; values matching
//!   no rule are retained under a generic `dev_<index>_<slot>` name so they
//!   are not silently lost.

use std::collections::HashMap;

/// Field numbers inside a field-description message.
const FIELD_DEVELOPER_DATA_INDEX: u8 = 0;
const FIELD_DEFINITION_NUMBER: u8 = 1;
const FIELD_BASE_TYPE_ID: u8 = 2;
const FIELD_NAME: u8 = 3;

/// Accumulated developer-field metadata for one parse.
#[derive(Debug, Default)]
pub struct DeveloperFieldRegistry {
    names: HashMap<(u8, u8), String>,
    base_types: HashMap<(u8, u8), u8>,
}

impl DeveloperFieldRegistry {
    /// Ingest one field-description message (global number 206).
    ///
    /// `fields` yields the message's raw field triples in stream order:
    /// field definition number, declared size, and the field's bytes. The
    /// name is the only string read anywhere in the decoder; it never reaches
    /// the public field maps.
    pub fn ingest_description<'a>(&mut self, fields: impl Iterator<Item = (u8, &'a [u8])>) {
        let mut developer_data_index = None;
        let mut field_definition_number = None;
        let mut base_type = None;
        let mut name = None;

        for (field_def_num, bytes) in fields {
            match field_def_num {
                FIELD_DEVELOPER_DATA_INDEX => developer_data_index = bytes.first().copied(),
                FIELD_DEFINITION_NUMBER => field_definition_number = bytes.first().copied(),
                FIELD_BASE_TYPE_ID => base_type = bytes.first().copied(),
                FIELD_NAME => name = read_name(bytes),
                _ => {}
            }
        }

        let (Some(index), Some(slot)) = (developer_data_index, field_definition_number) else {
            return;
        };
        if let Some(name) = name {
            self.names.insert((index, slot), canonical_name(&name));
        }
        if let Some(base_type) = base_type {
            self.base_types.insert((index, slot), base_type);
        }
    }

    /// Declared base type for a developer field, when a description message
    /// announced one. Developer slots in the definition record itself carry
    /// no type; without this hint the decoder falls back to inferring one
    /// from the slot's byte size.
    pub fn base_type_hint(&self, developer_data_index: u8, field_slot: u8) -> Option<u8> {
        self.base_types.get(&(developer_data_index, field_slot)).copied()
    }

    /// Resolve a decoded developer-field value to a semantic name.
    ///
    /// Explicit metadata takes precedence; the range heuristic only runs for
    /// pairs no description message covered.
    pub fn resolve(&self, developer_data_index: u8, field_slot: u8, value: f64) -> String {
        if let Some(name) = self.names.get(&(developer_data_index, field_slot)) {
            return name.clone();
        }
        classify_by_range(value, field_slot)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("dev_{developer_data_index}_{field_slot}"))
    }

    pub fn has_metadata(&self) -> bool {
        !self.names.is_empty()
    }
}

/// Classify a raw developer value by plausible range, tie-broken by the
/// slot's decimal suffix. First rule wins.
fn classify_by_range(value: f64, field_slot: u8) -> Option<&'static str> {
    let slot = field_slot.to_string();

    let rules: [(f64, f64, &[&str], &'static str); 5] = [
        (50.0, 800.0, &["0"], "power"),
        (30.0, 120.0, &["8"], "form_power"),
        (4.0, 25.0, &["9", "3"], "leg_spring_stiffness"),
        (0.05, 15.0, &["5", "7"], "air_power"),
        (5.0, 60.0, &["11"], "impact_gs"),
    ];

    rules
        .iter()
        .find(|(lo, hi, suffixes, _)| {
            (*lo..=*hi).contains(&value) && suffixes.iter().any(|s| slot.ends_with(s))
        })
        .map(|(_, _, _, name)| *name)
}

/// Extract a NUL-terminated name and fold it to `lower_snake_case`.
fn read_name(bytes: &[u8]) -> Option<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let name = String::from_utf8_lossy(&bytes[..end]);
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(
        name.to_ascii_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect(),
    )
}

/// Map well-known Stryd field names onto the names the heuristic produces,
/// so downstream preference chains see one spelling regardless of source.
fn canonical_name(sanitized: &str) -> String {
    match sanitized {
        "power" => "power",
        "form_power" => "form_power",
        "leg_spring_stiffness" => "leg_spring_stiffness",
        "air_power" => "air_power",
        "impact_gs" | "impact_loading_rate" => "impact_gs",
        "ground_time" | "ground_contact_time" => "ground_time",
        "vertical_oscillation" => "vertical_oscillation",
        "elevation" => "elevation",
        other => other,
    }
    .to_owned()
}
