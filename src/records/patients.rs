use super::{Records, RecordsError};
use crate::authorization::Capability;
use crate::db::repository::{
    delete_patient_cascade, find_patient_by_name, get_patient, insert_patient, list_patients,
    search_patients, update_patient, CascadeReport,
};
use crate::models::Patient;
use crate::session::Session;
use crate::validation::validate_patient;

impl Records {
    /// Validate and insert a patient. The stored value (with its id) is cached.
    pub fn register_patient(
        &self,
        session: &Session,
        patient: &Patient,
    ) -> Result<Patient, RecordsError> {
        session.require(Capability::EditPatients)?;
        validate_patient(patient)?;
        self.recorder.record("Register Patient", || {
            self.patients.write_then_put(|| {
                let conn = self.connect()?;
                Ok(insert_patient(&conn, patient)?)
            })
        })
    }

    pub fn get_patient(&self, session: &Session, id: i64) -> Result<Patient, RecordsError> {
        self.run(session, Capability::ViewPatients, "Get Patient", || {
            self.patients
                .get_or_load(id, || {
                    let conn = self.connect()?;
                    Ok::<_, RecordsError>(get_patient(&conn, id)?)
                })?
                .ok_or_else(|| RecordsError::not_found("patient", id))
        })
    }

    /// Full reload from the store; the cache is replaced with the result.
    pub fn list_patients(&self, session: &Session) -> Result<Vec<Patient>, RecordsError> {
        self.run(session, Capability::ViewPatients, "Load All Patients", || {
            self.patients.refresh_all(|| {
                let conn = self.connect()?;
                Ok(list_patients(&conn)?)
            })
        })
    }

    pub fn update_patient(
        &self,
        session: &Session,
        patient: &Patient,
    ) -> Result<Patient, RecordsError> {
        session.require(Capability::EditPatients)?;
        validate_patient(patient)?;
        self.recorder.record("Update Patient", || {
            self.patients.write_then_put(|| {
                let conn = self.connect()?;
                Ok(update_patient(&conn, patient)?)
            })
        })
    }

    /// Remove a patient with all dependent rows. Missing ids succeed.
    pub fn delete_patient(
        &self,
        session: &Session,
        id: i64,
    ) -> Result<CascadeReport, RecordsError> {
        self.run(session, Capability::EditPatients, "Delete Patient", || {
            self.patients.write_then_invalidate(id, || {
                let conn = self.connect()?;
                Ok(delete_patient_cascade(&conn, id)?)
            })
        })
    }

    /// Name-fragment search against the store.
    pub fn search_patients(
        &self,
        session: &Session,
        fragment: &str,
    ) -> Result<Vec<Patient>, RecordsError> {
        self.run(session, Capability::ViewPatients, "Search Patients", || {
            let conn = self.connect()?;
            Ok(search_patients(&conn, fragment)?)
        })
    }

    /// Name-fragment search over cached patients only. Sorted like `sort_patients`.
    pub fn search_patients_cached(
        &self,
        session: &Session,
        fragment: &str,
    ) -> Result<Vec<Patient>, RecordsError> {
        self.run(session, Capability::ViewPatients, "Search Cached Patients", || {
            let needle = fragment.trim().to_lowercase();
            let mut hits = self.patients.search(|p| {
                p.first_name.to_lowercase().contains(&needle)
                    || p.last_name.to_lowercase().contains(&needle)
            });
            sort_patients(&mut hits);
            Ok(hits)
        })
    }

    pub fn find_patient_by_name(
        &self,
        session: &Session,
        full_name: &str,
    ) -> Result<Option<Patient>, RecordsError> {
        self.run(session, Capability::ViewPatients, "Find Patient By Name", || {
            let conn = self.connect()?;
            Ok(find_patient_by_name(&conn, full_name)?)
        })
    }
}

/// Order by last name, then first name, ignoring case.
pub fn sort_patients(patients: &mut [Patient]) {
    patients.sort_by(|a, b| {
        a.last_name
            .to_lowercase()
            .cmp(&b.last_name.to_lowercase())
            .then_with(|| a.first_name.to_lowercase().cmp(&b.first_name.to_lowercase()))
    });
}
