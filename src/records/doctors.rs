use super::{Records, RecordsError};
use crate::authorization::Capability;
use crate::db::repository::{
    delete_doctor_cascade, find_doctor_by_name, get_doctor, insert_doctor, list_doctors,
    update_doctor, CascadeReport,
};
use crate::models::Doctor;
use crate::session::Session;
use crate::validation::validate_doctor;

impl Records {
    pub fn add_doctor(&self, session: &Session, doctor: &Doctor) -> Result<Doctor, RecordsError> {
        session.require(Capability::EditDoctors)?;
        validate_doctor(doctor)?;
        self.recorder.record("Add Doctor", || {
            self.doctors.write_then_put(|| {
                let conn = self.connect()?;
                Ok(insert_doctor(&conn, doctor)?)
            })
        })
    }

    pub fn get_doctor(&self, session: &Session, id: i64) -> Result<Doctor, RecordsError> {
        self.run(session, Capability::ViewDoctors, "Get Doctor", || {
            self.doctors
                .get_or_load(id, || {
                    let conn = self.connect()?;
                    Ok::<_, RecordsError>(get_doctor(&conn, id)?)
                })?
                .ok_or_else(|| RecordsError::not_found("doctor", id))
        })
    }

    pub fn list_doctors(&self, session: &Session) -> Result<Vec<Doctor>, RecordsError> {
        self.run(session, Capability::ViewDoctors, "Load All Doctors", || {
            self.doctors.refresh_all(|| {
                let conn = self.connect()?;
                Ok(list_doctors(&conn)?)
            })
        })
    }

    pub fn update_doctor(
        &self,
        session: &Session,
        doctor: &Doctor,
    ) -> Result<Doctor, RecordsError> {
        session.require(Capability::EditDoctors)?;
        validate_doctor(doctor)?;
        self.recorder.record("Update Doctor", || {
            self.doctors.write_then_put(|| {
                let conn = self.connect()?;
                Ok(update_doctor(&conn, doctor)?)
            })
        })
    }

    /// Remove a doctor with their appointments and prescriptions. Missing ids succeed.
    pub fn delete_doctor(&self, session: &Session, id: i64) -> Result<CascadeReport, RecordsError> {
        self.run(session, Capability::EditDoctors, "Delete Doctor", || {
            self.doctors.write_then_invalidate(id, || {
                let conn = self.connect()?;
                Ok(delete_doctor_cascade(&conn, id)?)
            })
        })
    }

    pub fn find_doctor_by_name(
        &self,
        session: &Session,
        full_name: &str,
    ) -> Result<Option<Doctor>, RecordsError> {
        self.run(session, Capability::ViewDoctors, "Find Doctor By Name", || {
            let conn = self.connect()?;
            Ok(find_doctor_by_name(&conn, full_name)?)
        })
    }
}
