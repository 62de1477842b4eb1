use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(ClinicalTestId);
id_newtype!(PatientId);

/// One input of the clinical-test edit form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    BloodPressure,
    RespiratoryRate,
    BloodOxygenLevel,
    HeartbeatRate,
    ChiefComplaint,
    PastMedicalHistory,
    MedicalDiagnosis,
    MedicalPrescription,
    PatientId,
}

impl FormField {
    pub const VITAL_SIGNS: [FormField; 4] = [
        FormField::BloodPressure,
        FormField::RespiratoryRate,
        FormField::BloodOxygenLevel,
        FormField::HeartbeatRate,
    ];

    /// The eight fields that must be filled before an update is sent.
    pub const REQUIRED: [FormField; 8] = [
        FormField::BloodPressure,
        FormField::RespiratoryRate,
        FormField::BloodOxygenLevel,
        FormField::HeartbeatRate,
        FormField::ChiefComplaint,
        FormField::PastMedicalHistory,
        FormField::MedicalDiagnosis,
        FormField::MedicalPrescription,
    ];

    /// Fields shown to the user, in display order.
    pub const EDITABLE: [FormField; 8] = Self::REQUIRED;

    /// Key of the field in local form state. The chief complaint is stored
    /// as `chiefcomplaint` locally and renamed on the wire.
    pub fn form_key(self) -> &'static str {
        match self {
            FormField::BloodPressure => "bloodPressure",
            FormField::RespiratoryRate => "respiratoryRate",
            FormField::BloodOxygenLevel => "bloodOxygenLevel",
            FormField::HeartbeatRate => "heartbeatRate",
            FormField::ChiefComplaint => "chiefcomplaint",
            FormField::PastMedicalHistory => "pastMedicalHistory",
            FormField::MedicalDiagnosis => "medicalDiagnosis",
            FormField::MedicalPrescription => "medicalPrescription",
            FormField::PatientId => "patientId",
        }
    }

    /// Input placeholder; `None` for fields that have no input.
    pub fn placeholder(self) -> Option<&'static str> {
        let text = match self {
            FormField::BloodPressure => "Enter Blood Pressure (X/Y mmHg)",
            FormField::RespiratoryRate => "Enter Respiratory Rate (X/min)",
            FormField::BloodOxygenLevel => "Enter Blood Oxygen Level (X%)",
            FormField::HeartbeatRate => "Enter Heartbeat Rate (X/min)",
            FormField::ChiefComplaint => "Patient's chief complaint",
            FormField::PastMedicalHistory => "Patient's past medical history",
            FormField::MedicalDiagnosis => "Medical diagnosis",
            FormField::MedicalPrescription => "Medical prescription",
            FormField::PatientId => return None,
        };
        Some(text)
    }

    pub fn is_multiline(self) -> bool {
        matches!(
            self,
            FormField::ChiefComplaint
                | FormField::PastMedicalHistory
                | FormField::MedicalDiagnosis
                | FormField::MedicalPrescription
        )
    }

    pub fn is_vital_sign(self) -> bool {
        Self::VITAL_SIGNS.contains(&self)
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form_key())
    }
}

impl FromStr for FormField {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let field = match value {
            "bloodPressure" => FormField::BloodPressure,
            "respiratoryRate" => FormField::RespiratoryRate,
            "bloodOxygenLevel" => FormField::BloodOxygenLevel,
            "heartbeatRate" => FormField::HeartbeatRate,
            "chiefcomplaint" | "chiefComplaint" => FormField::ChiefComplaint,
            "pastMedicalHistory" => FormField::PastMedicalHistory,
            "medicalDiagnosis" => FormField::MedicalDiagnosis,
            "medicalPrescription" => FormField::MedicalPrescription,
            "patientId" => FormField::PatientId,
            other => return Err(ValidationError::UnknownField(other.to_string())),
        };
        Ok(field)
    }
}
