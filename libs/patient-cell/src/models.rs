use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub insurance_number: Option<String>,
}

impl PatientProfile {
    pub fn validate(&self, today: NaiveDate) -> Result<(), String> {
        if let Some(dob) = self.date_of_birth {
            if dob > today {
                return Err("Date of birth cannot be in the future".to_string());
            }
        }

        if let Some(fullname) = &self.fullname {
            if fullname.trim().is_empty() {
                return Err("Full name cannot be empty".to_string());
            }
        }

        Ok(())
    }
}

/// A doctor as listed in the patient-facing directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorListing {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub doctor_profile_id: Option<i64>,
    #[serde(default)]
    pub profile: Option<DoctorListingProfile>,
}

impl DoctorListing {
    pub fn specialty(&self) -> &str {
        self.profile.as_ref().map(|p| p.specialty.as_str()).unwrap_or_default()
    }

    pub fn address(&self) -> &str {
        self.profile.as_ref().map(|p| p.address.as_str()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorListingProfile {
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub license_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorSearchQuery {
    pub search: Option<String>,
    pub specialty: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: i64,
    #[serde(default)]
    pub appointment: Option<i64>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    pub diagnosis: String,
    #[serde(default)]
    pub prescription: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordSearchQuery {
    pub search: Option<String>,
    pub status: Option<String>,
}
