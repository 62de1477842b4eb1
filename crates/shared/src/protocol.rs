use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::domain::PatientId;

/// Largest integer an IEEE double represents exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;
/// Magnitudes outside `[MIN_PLAIN, MAX_PLAIN)` are shown in exponent form.
const MIN_PLAIN: f64 = 1e-6;
const MAX_PLAIN: f64 = 1e21;

/// A vital-sign reading as the service returns it: usually a JSON number,
/// occasionally free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VitalReading {
    Number(Number),
    Text(String),
}

impl VitalReading {
    pub fn display_value(&self) -> String {
        match self {
            VitalReading::Number(number) => render_number(number),
            VitalReading::Text(text) => text.clone(),
        }
    }
}

/// Renders a JSON number the way it is shown in a form input: integral
/// values without a fractional part, everything else in shortest form,
/// switching to `1.5e+300` / `1e-7` notation for very large or small values.
pub fn render_number(number: &Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }
    match number.as_f64() {
        Some(value) if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER => {
            format!("{}", value as i64)
        }
        Some(value) if value != 0.0 && !(MIN_PLAIN..MAX_PLAIN).contains(&value.abs()) => {
            exponent_form(value)
        }
        Some(value) => format!("{value}"),
        None => number.to_string(),
    }
}

fn exponent_form(value: f64) -> String {
    let rendered = format!("{value:e}");
    match rendered.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => rendered,
    }
}

/// Builds the wire number for a coerced reading, preferring an integer
/// encoding when the value is integral.
pub fn number_from_f64(value: f64) -> Option<Number> {
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        return Some(Number::from(value as i64));
    }
    Number::from_f64(value)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatientRef {
    Populated {
        #[serde(rename = "_id")]
        id: PatientId,
    },
    Id(PatientId),
}

impl PatientRef {
    pub fn id(&self) -> &PatientId {
        match self {
            PatientRef::Populated { id } | PatientRef::Id(id) => id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalTestRecord {
    #[serde(default)]
    pub blood_pressure: Option<VitalReading>,
    #[serde(default)]
    pub respiratory_rate: Option<VitalReading>,
    #[serde(default)]
    pub blood_oxygen_level: Option<VitalReading>,
    #[serde(default)]
    pub heartbeat_rate: Option<VitalReading>,
    #[serde(default)]
    pub chief_complaint: Option<String>,
    #[serde(default)]
    pub past_medical_history: Option<String>,
    #[serde(default)]
    pub medical_diagnosis: Option<String>,
    #[serde(default)]
    pub medical_prescription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientRef>,
}

impl ClinicalTestRecord {
    pub fn patient_id(&self) -> PatientId {
        self.patient
            .as_ref()
            .map(|patient| patient.id().clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchClinicalTestResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ClinicalTestRecord>,
}

impl FetchClinicalTestResponse {
    /// The record, when the service reports success and actually sent one.
    pub fn into_record(self) -> Option<ClinicalTestRecord> {
        if self.success {
            self.data
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClinicalTestRequest {
    pub blood_pressure: Number,
    pub respiratory_rate: Number,
    pub blood_oxygen_level: Number,
    pub heartbeat_rate: Number,
    pub chief_complaint: String,
    pub past_medical_history: String,
    pub medical_diagnosis: String,
    pub medical_prescription: String,
    #[serde(with = "iso8601_millis")]
    pub creation_date_time: DateTime<Utc>,
    pub patient_id: PatientId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateClinicalTestResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

mod iso8601_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
