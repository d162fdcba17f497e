use super::{Records, RecordsError};
use crate::authorization::Capability;
use crate::models::PatientNote;
use crate::session::Session;
use crate::validation::validate_note;

impl Records {
    /// Store a note document. With the store disabled the note is dropped.
    pub fn add_patient_note(
        &self,
        session: &Session,
        note: &PatientNote,
    ) -> Result<(), RecordsError> {
        session.require(Capability::ManagePatientNotes)?;
        validate_note(note)?;
        self.recorder.record("Add Patient Note", || {
            self.notes.put(note)?;
            Ok(())
        })
    }

    pub fn list_patient_notes(
        &self,
        session: &Session,
        patient_id: i64,
    ) -> Result<Vec<PatientNote>, RecordsError> {
        self.run(session, Capability::ManagePatientNotes, "Load Patient Notes", || {
            Ok(self.notes.list(patient_id)?)
        })
    }

    pub fn notes_enabled(&self) -> bool {
        self.notes.is_enabled()
    }
}
