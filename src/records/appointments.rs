use super::{Records, RecordsError};
use crate::authorization::Capability;
use crate::db::repository::{
    delete_appointment, get_appointment, insert_appointment, list_appointments,
    list_appointments_for_doctor, list_appointments_for_patient, set_appointment_status,
    update_appointment,
};
use crate::models::{Appointment, AppointmentStatus};
use crate::session::Session;

impl Records {
    /// Book a new appointment. The status is forced to `Scheduled`.
    pub fn schedule_appointment(
        &self,
        session: &Session,
        appointment: &Appointment,
    ) -> Result<Appointment, RecordsError> {
        self.run(session, Capability::BookAppointment, "Book Appointment", || {
            let conn = self.connect()?;
            let booking = Appointment {
                status: AppointmentStatus::Scheduled,
                ..appointment.clone()
            };
            Ok(insert_appointment(&conn, &booking)?)
        })
    }

    pub fn get_appointment(
        &self,
        session: &Session,
        id: i64,
    ) -> Result<Appointment, RecordsError> {
        self.run(session, Capability::ManageAppointments, "Get Appointment", || {
            let conn = self.connect()?;
            get_appointment(&conn, id)?.ok_or_else(|| RecordsError::not_found("appointment", id))
        })
    }

    pub fn list_appointments(&self, session: &Session) -> Result<Vec<Appointment>, RecordsError> {
        self.run(session, Capability::ManageAppointments, "Load All Appointments", || {
            let conn = self.connect()?;
            Ok(list_appointments(&conn)?)
        })
    }

    pub fn list_appointments_for_patient(
        &self,
        session: &Session,
        patient_id: i64,
    ) -> Result<Vec<Appointment>, RecordsError> {
        self.run(
            session,
            Capability::ManageAppointments,
            "Load Patient Appointments",
            || {
                let conn = self.connect()?;
                Ok(list_appointments_for_patient(&conn, patient_id)?)
            },
        )
    }

    pub fn list_appointments_for_doctor(
        &self,
        session: &Session,
        doctor_id: i64,
    ) -> Result<Vec<Appointment>, RecordsError> {
        self.run(
            session,
            Capability::ManageAppointments,
            "Load Doctor Appointments",
            || {
                let conn = self.connect()?;
                Ok(list_appointments_for_doctor(&conn, doctor_id)?)
            },
        )
    }

    pub fn update_appointment(
        &self,
        session: &Session,
        appointment: &Appointment,
    ) -> Result<Appointment, RecordsError> {
        self.run(session, Capability::ManageAppointments, "Update Appointment", || {
            let conn = self.connect()?;
            Ok(update_appointment(&conn, appointment)?)
        })
    }

    pub fn cancel_appointment(
        &self,
        session: &Session,
        id: i64,
    ) -> Result<Appointment, RecordsError> {
        self.run(session, Capability::ManageAppointments, "Cancel Appointment", || {
            let conn = self.connect()?;
            Ok(set_appointment_status(&conn, id, AppointmentStatus::Cancelled)?)
        })
    }

    pub fn complete_appointment(
        &self,
        session: &Session,
        id: i64,
    ) -> Result<Appointment, RecordsError> {
        self.run(session, Capability::ManageAppointments, "Complete Appointment", || {
            let conn = self.connect()?;
            Ok(set_appointment_status(&conn, id, AppointmentStatus::Completed)?)
        })
    }

    /// Remove the appointment row; prescriptions written against it are detached.
    pub fn delete_appointment(&self, session: &Session, id: i64) -> Result<bool, RecordsError> {
        self.run(session, Capability::ManageAppointments, "Delete Appointment", || {
            let conn = self.connect()?;
            Ok(delete_appointment(&conn, id)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::{new_doctor, new_patient, ts};
    use crate::models::Role;
    use crate::records::testing::*;

    fn seeded(records: &Records) -> (i64, i64) {
        let session = admin();
        let jane = records
            .register_patient(&session, &new_patient("Jane", "Doe"))
            .unwrap();
        let house = records
            .add_doctor(&session, &new_doctor("Gregory", "House", "Diagnostics"))
            .unwrap();
        (jane.id, house.id)
    }

    fn booking(patient_id: i64, doctor_id: i64) -> Appointment {
        Appointment {
            id: 0,
            patient_id,
            doctor_id,
            appointment_date: ts("2024-05-06 10:30:00"),
            status: AppointmentStatus::Completed,
            notes: Some("Follow-up".into()),
        }
    }

    #[test]
    fn patient_can_book_but_not_manage() {
        let (records, _dir) = records();
        let (patient_id, doctor_id) = seeded(&records);
        let kiosk = session_as(Role::Patient);

        let booked = records
            .schedule_appointment(&kiosk, &booking(patient_id, doctor_id))
            .unwrap();
        assert_eq!(booked.status, AppointmentStatus::Scheduled);
        assert!(matches!(
            records.list_appointments(&kiosk),
            Err(RecordsError::Unauthorized(_))
        ));
    }

    #[test]
    fn cancel_and_complete_change_status() {
        let (records, _dir) = records();
        let (patient_id, doctor_id) = seeded(&records);
        let session = session_as(Role::Doctor);
        let appt = records
            .schedule_appointment(&session, &booking(patient_id, doctor_id))
            .unwrap();

        let cancelled = records.cancel_appointment(&session, appt.id).unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        let completed = records.complete_appointment(&session, appt.id).unwrap();
        assert_eq!(completed.status, AppointmentStatus::Completed);
        assert_eq!(
            records.get_appointment(&session, appt.id).unwrap().status,
            AppointmentStatus::Completed
        );
    }

    #[test]
    fn per_owner_lists_and_delete() {
        let (records, _dir) = records();
        let (patient_id, doctor_id) = seeded(&records);
        let session = admin();
        let appt = records
            .schedule_appointment(&session, &booking(patient_id, doctor_id))
            .unwrap();

        assert_eq!(
            records
                .list_appointments_for_patient(&session, patient_id)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            records
                .list_appointments_for_doctor(&session, doctor_id)
                .unwrap()
                .len(),
            1
        );

        let mut moved = appt.clone();
        moved.appointment_date = ts("2024-05-07 14:00:00");
        records.update_appointment(&session, &moved).unwrap();
        assert_eq!(
            records.get_appointment(&session, appt.id).unwrap().appointment_date,
            ts("2024-05-07 14:00:00")
        );

        assert!(records.delete_appointment(&session, appt.id).unwrap());
        assert!(records.list_appointments(&session).unwrap().is_empty());
    }

    #[test]
    fn unknown_doctor_is_storage_failure() {
        let (records, _dir) = records();
        let (patient_id, _) = seeded(&records);
        assert!(matches!(
            records.schedule_appointment(&admin(), &booking(patient_id, 4040)),
            Err(RecordsError::Storage(_))
        ));
    }
}
