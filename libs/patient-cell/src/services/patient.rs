use anyhow::Result;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_api_client::{ApiClient, Credentials};

use crate::models::{DoctorListing, DoctorSearchQuery, MedicalRecord, PatientProfile, RecordSearchQuery};

const PROFILE_PATH: &str = "patients/profile/";

pub struct PatientService {
    api: ApiClient,
}

impl PatientService {
    pub fn new(api: &ApiClient) -> Self {
        Self { api: api.clone() }
    }

    pub async fn get_profile(&self, credentials: &Credentials) -> Result<PatientProfile> {
        debug!("Fetching patient profile");

        let profile: Option<PatientProfile> = self.api.request(credentials, Method::GET, PROFILE_PATH, None).await?;
        Ok(profile.unwrap_or_default())
    }

    pub async fn update_profile(&self, profile: PatientProfile, credentials: &Credentials) -> Result<PatientProfile> {
        debug!("Updating patient profile");

        let updated: PatientProfile = self
            .api
            .request(credentials, Method::PUT, PROFILE_PATH, Some(json!(profile)))
            .await?;

        info!("Patient profile updated");
        Ok(updated)
    }

    pub async fn find_doctors(&self, query: &DoctorSearchQuery, credentials: &Credentials) -> Result<Vec<DoctorListing>> {
        debug!("Searching doctors: {:?}", query);

        let doctors: Vec<DoctorListing> = self
            .api
            .request(credentials, Method::GET, "patients/doctors/", None)
            .await?;

        Ok(filter_doctors(doctors, query))
    }

    /// The backend's dashboard payload, passed through untouched.
    pub async fn dashboard(&self, credentials: &Credentials) -> Result<Value> {
        debug!("Fetching patient dashboard");

        self.api
            .request(credentials, Method::GET, "patients/dashboard/", None)
            .await
    }

    pub async fn medical_records(&self, query: &RecordSearchQuery, credentials: &Credentials) -> Result<Vec<MedicalRecord>> {
        debug!("Fetching medical records: {:?}", query);

        let records: Vec<MedicalRecord> = self
            .api
            .request(credentials, Method::GET, "patients/medical-records/", None)
            .await?;

        Ok(filter_records(records, query))
    }
}

fn normalized(term: &Option<String>) -> Option<String> {
    term.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Case-insensitive substring match: `search` looks at name, username,
/// email and specialty; `specialty` and `location` narrow further.
pub fn filter_doctors(doctors: Vec<DoctorListing>, query: &DoctorSearchQuery) -> Vec<DoctorListing> {
    let search = normalized(&query.search);
    let specialty = normalized(&query.specialty);
    let location = normalized(&query.location);

    doctors
        .into_iter()
        .filter(|doctor| {
            let matches_search = search.as_deref().is_none_or(|term| {
                contains(&doctor.username, term)
                    || contains(&doctor.email, term)
                    || contains(doctor.specialty(), term)
                    || doctor.fullname.as_deref().is_some_and(|name| contains(name, term))
            });
            let matches_specialty = specialty.as_deref().is_none_or(|term| contains(doctor.specialty(), term));
            let matches_location = location.as_deref().is_none_or(|term| contains(doctor.address(), term));

            matches_search && matches_specialty && matches_location
        })
        .collect()
}

/// `search` matches diagnosis or doctor name; `status` must match exactly,
/// ignoring case. Newest records first.
pub fn filter_records(records: Vec<MedicalRecord>, query: &RecordSearchQuery) -> Vec<MedicalRecord> {
    let search = normalized(&query.search);
    let status = normalized(&query.status);

    let mut filtered: Vec<MedicalRecord> = records
        .into_iter()
        .filter(|record| {
            let matches_search = search.as_deref().is_none_or(|term| {
                contains(&record.diagnosis, term)
                    || record.doctor_name.as_deref().is_some_and(|name| contains(name, term))
            });
            let matches_status = status
                .as_deref()
                .is_none_or(|term| record.status.as_deref().is_some_and(|s| s.to_lowercase() == term));

            matches_search && matches_status
        })
        .collect();

    filtered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    filtered
}
