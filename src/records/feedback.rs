use super::{Records, RecordsError};
use crate::authorization::Capability;
use crate::db::repository::{
    insert_feedback, list_feedback, list_feedback_for_patient, now_timestamp,
};
use crate::models::PatientFeedback;
use crate::session::Session;
use crate::validation::validate_feedback;

impl Records {
    /// Store feedback dated now; the caller's `feedback_date` is ignored.
    pub fn submit_feedback(
        &self,
        session: &Session,
        feedback: &PatientFeedback,
    ) -> Result<PatientFeedback, RecordsError> {
        session.require(Capability::SubmitFeedback)?;
        validate_feedback(feedback)?;
        self.recorder.record("Submit Feedback", || {
            let conn = self.connect()?;
            let dated = PatientFeedback {
                feedback_date: now_timestamp(),
                ..feedback.clone()
            };
            Ok(insert_feedback(&conn, &dated)?)
        })
    }

    /// Newest first.
    pub fn list_feedback(&self, session: &Session) -> Result<Vec<PatientFeedback>, RecordsError> {
        self.run(session, Capability::ViewFeedback, "Load All Feedback", || {
            let conn = self.connect()?;
            Ok(list_feedback(&conn)?)
        })
    }

    pub fn list_feedback_for_patient(
        &self,
        session: &Session,
        patient_id: i64,
    ) -> Result<Vec<PatientFeedback>, RecordsError> {
        self.run(session, Capability::ViewFeedback, "Load Patient Feedback", || {
            let conn = self.connect()?;
            Ok(list_feedback_for_patient(&conn, patient_id)?)
        })
    }
}
