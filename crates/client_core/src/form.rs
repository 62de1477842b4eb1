//! Local form state for the clinical-test edit screen and its submission rules.

use chrono::{DateTime, Utc};
use serde_json::Number;
use shared::{
    domain::{FormField, PatientId},
    error::ValidationError,
    protocol::{number_from_f64, ClinicalTestRecord, UpdateClinicalTestRequest, VitalReading},
};

/// Every value is held as the text shown in its input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClinicalTestForm {
    pub blood_pressure: String,
    pub respiratory_rate: String,
    pub blood_oxygen_level: String,
    pub heartbeat_rate: String,
    pub chief_complaint: String,
    pub past_medical_history: String,
    pub medical_diagnosis: String,
    pub medical_prescription: String,
    pub patient_id: String,
}

impl ClinicalTestForm {
    pub fn from_record(record: &ClinicalTestRecord) -> Self {
        fn vital(reading: &Option<VitalReading>) -> String {
            reading
                .as_ref()
                .map(VitalReading::display_value)
                .unwrap_or_default()
        }

        Self {
            blood_pressure: vital(&record.blood_pressure),
            respiratory_rate: vital(&record.respiratory_rate),
            blood_oxygen_level: vital(&record.blood_oxygen_level),
            heartbeat_rate: vital(&record.heartbeat_rate),
            chief_complaint: record.chief_complaint.clone().unwrap_or_default(),
            past_medical_history: record.past_medical_history.clone().unwrap_or_default(),
            medical_diagnosis: record.medical_diagnosis.clone().unwrap_or_default(),
            medical_prescription: record.medical_prescription.clone().unwrap_or_default(),
            patient_id: record.patient_id().0,
        }
    }

    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::BloodPressure => &self.blood_pressure,
            FormField::RespiratoryRate => &self.respiratory_rate,
            FormField::BloodOxygenLevel => &self.blood_oxygen_level,
            FormField::HeartbeatRate => &self.heartbeat_rate,
            FormField::ChiefComplaint => &self.chief_complaint,
            FormField::PastMedicalHistory => &self.past_medical_history,
            FormField::MedicalDiagnosis => &self.medical_diagnosis,
            FormField::MedicalPrescription => &self.medical_prescription,
            FormField::PatientId => &self.patient_id,
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        *self.slot_mut(field) = value.into();
    }

    fn slot_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::BloodPressure => &mut self.blood_pressure,
            FormField::RespiratoryRate => &mut self.respiratory_rate,
            FormField::BloodOxygenLevel => &mut self.blood_oxygen_level,
            FormField::HeartbeatRate => &mut self.heartbeat_rate,
            FormField::ChiefComplaint => &mut self.chief_complaint,
            FormField::PastMedicalHistory => &mut self.past_medical_history,
            FormField::MedicalDiagnosis => &mut self.medical_diagnosis,
            FormField::MedicalPrescription => &mut self.medical_prescription,
            FormField::PatientId => &mut self.patient_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fields among `fields` whose value is blank after trimming.
    pub fn blank_fields(&self, fields: &[FormField]) -> Vec<FormField> {
        fields
            .iter()
            .copied()
            .filter(|field| self.get(*field).trim().is_empty())
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing = self.blank_fields(&FormField::VITAL_SIGNS);
        if !missing.is_empty() {
            return Err(ValidationError::MissingVitalSigns { missing });
        }

        let missing = self.blank_fields(&FormField::REQUIRED);
        if !missing.is_empty() {
            return Err(ValidationError::IncompleteRecord { missing });
        }

        Ok(())
    }

    /// Validates the form and builds the update body, stamped with `now`.
    pub fn to_update_request(
        &self,
        now: DateTime<Utc>,
    ) -> Result<UpdateClinicalTestRequest, ValidationError> {
        self.validate()?;

        Ok(UpdateClinicalTestRequest {
            blood_pressure: coerce_vital(FormField::BloodPressure, &self.blood_pressure)?,
            respiratory_rate: coerce_vital(FormField::RespiratoryRate, &self.respiratory_rate)?,
            blood_oxygen_level: coerce_vital(
                FormField::BloodOxygenLevel,
                &self.blood_oxygen_level,
            )?,
            heartbeat_rate: coerce_vital(FormField::HeartbeatRate, &self.heartbeat_rate)?,
            chief_complaint: self.chief_complaint.clone(),
            past_medical_history: self.past_medical_history.clone(),
            medical_diagnosis: self.medical_diagnosis.clone(),
            medical_prescription: self.medical_prescription.clone(),
            creation_date_time: now,
            patient_id: PatientId::new(self.patient_id.clone()),
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for field in FormField::EDITABLE {
            let Some(label) = field.placeholder() else {
                continue;
            };
            let value = self.get(field);
            if field.is_multiline() {
                out.push_str(label);
                out.push_str(":\n");
                for line in value.lines() {
                    out.push_str("    ");
                    out.push_str(line);
                    out.push('\n');
                }
            } else {
                out.push_str(&format!("{label}: {value}\n"));
            }
        }
        out
    }
}

fn coerce_vital(field: FormField, raw: &str) -> Result<Number, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(number_from_f64)
        .ok_or_else(|| ValidationError::NonNumericVitalSign {
            field,
            value: raw.to_string(),
        })
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
