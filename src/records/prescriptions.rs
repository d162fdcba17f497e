use super::{Records, RecordsError};
use crate::authorization::Capability;
use crate::db::repository::{
    create_prescription, delete_prescription, get_prescription, list_prescriptions,
    list_prescriptions_for_patient, update_prescription,
};
use crate::models::Prescription;
use crate::session::Session;
use crate::validation::validate_prescription;

impl Records {
    /// Write the header and all items as one unit.
    pub fn create_prescription(
        &self,
        session: &Session,
        prescription: &Prescription,
    ) -> Result<Prescription, RecordsError> {
        session.require(Capability::EditPrescriptions)?;
        validate_prescription(prescription)?;
        self.recorder.record("Create Prescription", || {
            let conn = self.connect()?;
            Ok(create_prescription(&conn, prescription)?)
        })
    }

    /// Replace header fields and the whole item set.
    pub fn update_prescription(
        &self,
        session: &Session,
        prescription: &Prescription,
    ) -> Result<Prescription, RecordsError> {
        session.require(Capability::EditPrescriptions)?;
        validate_prescription(prescription)?;
        self.recorder.record("Update Prescription", || {
            let conn = self.connect()?;
            Ok(update_prescription(&conn, prescription)?)
        })
    }

    pub fn delete_prescription(&self, session: &Session, id: i64) -> Result<bool, RecordsError> {
        self.run(session, Capability::EditPrescriptions, "Delete Prescription", || {
            let conn = self.connect()?;
            Ok(delete_prescription(&conn, id)?)
        })
    }

    pub fn get_prescription(
        &self,
        session: &Session,
        id: i64,
    ) -> Result<Prescription, RecordsError> {
        self.run(session, Capability::ViewPrescriptions, "Get Prescription", || {
            let conn = self.connect()?;
            get_prescription(&conn, id)?.ok_or_else(|| RecordsError::not_found("prescription", id))
        })
    }

    pub fn list_prescriptions(&self, session: &Session) -> Result<Vec<Prescription>, RecordsError> {
        self.run(session, Capability::ViewPrescriptions, "Load All Prescriptions", || {
            let conn = self.connect()?;
            Ok(list_prescriptions(&conn)?)
        })
    }

    pub fn list_prescriptions_for_patient(
        &self,
        session: &Session,
        patient_id: i64,
    ) -> Result<Vec<Prescription>, RecordsError> {
        self.run(
            session,
            Capability::ViewPrescriptions,
            "Load Patient Prescriptions",
            || {
                let conn = self.connect()?;
                Ok(list_prescriptions_for_patient(&conn, patient_id)?)
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::{new_doctor, new_inventory, new_patient, ts};
    use crate::models::{PrescriptionItem, Role};
    use crate::records::testing::*;

    struct Seeded {
        patient_id: i64,
        doctor_id: i64,
        aspirin: i64,
        insulin: i64,
    }

    fn seed(records: &Records) -> Seeded {
        let session = admin();
        let patient = records
            .register_patient(&session, &new_patient("Jane", "Doe"))
            .unwrap();
        records
            .add_doctor(&session, &new_doctor("Lisa", "Cuddy", "Endocrinology"))
            .unwrap();
        let doctor = records
            .add_doctor(&session, &new_doctor("James", "Wilson", "Oncology"))
            .unwrap();
        for filler in ["Bandage", "Gauze", "Saline", "Syringe"] {
            records
                .add_inventory_item(&session, &new_inventory(filler, 50))
                .unwrap();
        }
        let aspirin = records
            .add_inventory_item(&session, &new_inventory("Aspirin", 10))
            .unwrap();
        let insulin = records
            .add_inventory_item(&session, &new_inventory("Insulin", 2))
            .unwrap();
        Seeded {
            patient_id: patient.id,
            doctor_id: doctor.id,
            aspirin: aspirin.id,
            insulin: insulin.id,
        }
    }

    fn draft(seeded: &Seeded, items: Vec<PrescriptionItem>) -> Prescription {
        Prescription {
            id: 0,
            patient_id: seeded.patient_id,
            doctor_id: seeded.doctor_id,
            appointment_id: None,
            notes: Some("Take with food".into()),
            prescription_date: ts("2024-05-06 11:00:00"),
            items,
        }
    }

    #[test]
    fn two_item_prescription_reads_back_whole() {
        let (records, _dir) = records();
        let seeded = seed(&records);
        let session = session_as(Role::Doctor);

        let stored = records
            .create_prescription(
                &session,
                &draft(
                    &seeded,
                    vec![
                        PrescriptionItem::new(seeded.aspirin, 10, "twice daily"),
                        PrescriptionItem::new(seeded.insulin, 2, "before meals"),
                    ],
                ),
            )
            .unwrap();
        assert_eq!((seeded.patient_id, seeded.doctor_id), (1, 2));
        assert_eq!((seeded.aspirin, seeded.insulin), (5, 6));

        let read = records.get_prescription(&session, stored.id).unwrap();
        assert_eq!(read.patient_id, seeded.patient_id);
        assert_eq!(read.doctor_id, seeded.doctor_id);
        assert_eq!(read.items.len(), 2);
        assert_eq!(read.items[0].medicine_name.as_deref(), Some("Aspirin"));
        assert_eq!(read.items[0].quantity, 10);
        assert_eq!(read.items[1].quantity, 2);
        assert_eq!(read.items[1].medicine_name.as_deref(), Some("Insulin"));
        assert_eq!(read.items[1].dosage_instructions, "before meals");
        assert!(read.items.iter().all(|i| i.prescription_id == stored.id));
    }

    #[test]
    fn dangling_item_leaves_no_header_behind() {
        let (records, _dir) = records();
        let seeded = seed(&records);
        let session = admin();

        let err = records
            .create_prescription(
                &session,
                &draft(
                    &seeded,
                    vec![
                        PrescriptionItem::new(seeded.aspirin, 1, "once"),
                        PrescriptionItem::new(9999, 1, "once"),
                    ],
                ),
            )
            .unwrap_err();
        assert!(matches!(err, RecordsError::Storage(_)));
        assert_eq!(raw_count(&records, "prescriptions"), 0);
        assert_eq!(raw_count(&records, "prescription_items"), 0);
    }

    #[test]
    fn update_replaces_items_and_failed_update_keeps_old_set() {
        let (records, _dir) = records();
        let seeded = seed(&records);
        let session = admin();
        let mut stored = records
            .create_prescription(
                &session,
                &draft(&seeded, vec![PrescriptionItem::new(seeded.aspirin, 2, "twice daily")]),
            )
            .unwrap();

        stored.items = vec![PrescriptionItem::new(seeded.insulin, 3, "nightly")];
        let updated = records.update_prescription(&session, &stored).unwrap();
        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.items[0].medicine_name.as_deref(), Some("Insulin"));

        stored.items = vec![PrescriptionItem::new(424242, 1, "never")];
        assert!(records.update_prescription(&session, &stored).is_err());
        let kept = records.get_prescription(&session, stored.id).unwrap();
        assert_eq!(kept.items[0].inventory_id, seeded.insulin);
    }

    #[test]
    fn invalid_items_are_rejected_before_the_store() {
        let (records, _dir) = records();
        let seeded = seed(&records);
        let err = records
            .create_prescription(
                &admin(),
                &draft(&seeded, vec![PrescriptionItem::new(seeded.aspirin, 0, "  ")]),
            )
            .unwrap_err();
        let RecordsError::Validation(violations) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(violations.has_field("items.quantity"));
        assert!(violations.has_field("items.dosage_instructions"));
    }

    #[test]
    fn patient_can_view_but_not_write() {
        let (records, _dir) = records();
        let seeded = seed(&records);
        records
            .create_prescription(
                &admin(),
                &draft(&seeded, vec![PrescriptionItem::new(seeded.aspirin, 1, "once")]),
            )
            .unwrap();

        let kiosk = session_as(Role::Patient);
        assert_eq!(
            records
                .list_prescriptions_for_patient(&kiosk, seeded.patient_id)
                .unwrap()
                .len(),
            1
        );
        assert!(matches!(
            records.delete_prescription(&kiosk, 1),
            Err(RecordsError::Unauthorized(_))
        ));
    }

    #[test]
    fn delete_removes_items_and_is_idempotent() {
        let (records, _dir) = records();
        let seeded = seed(&records);
        let session = admin();
        let stored = records
            .create_prescription(
                &session,
                &draft(&seeded, vec![PrescriptionItem::new(seeded.aspirin, 1, "once")]),
            )
            .unwrap();

        assert!(records.delete_prescription(&session, stored.id).unwrap());
        assert!(!records.delete_prescription(&session, stored.id).unwrap());
        assert_eq!(raw_count(&records, "prescription_items"), 0);
        assert!(records.list_prescriptions(&session).unwrap().is_empty());
    }
}
