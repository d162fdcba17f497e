use super::{Records, RecordsError};
use crate::authorization::Capability;
use crate::db::repository::{
    delete_department, get_department, get_department_by_name, insert_department,
    list_departments, update_department,
};
use crate::models::Department;
use crate::session::Session;
use crate::validation::validate_department;

impl Records {
    pub fn list_departments(&self, session: &Session) -> Result<Vec<Department>, RecordsError> {
        self.run(session, Capability::ViewDepartments, "Load All Departments", || {
            let conn = self.connect()?;
            Ok(list_departments(&conn)?)
        })
    }

    pub fn get_department(&self, session: &Session, id: i64) -> Result<Department, RecordsError> {
        self.run(session, Capability::ViewDepartments, "Get Department", || {
            let conn = self.connect()?;
            get_department(&conn, id)?.ok_or_else(|| RecordsError::not_found("department", id))
        })
    }

    pub fn get_department_by_name(
        &self,
        session: &Session,
        name: &str,
    ) -> Result<Option<Department>, RecordsError> {
        self.run(session, Capability::ViewDepartments, "Get Department By Name", || {
            let conn = self.connect()?;
            Ok(get_department_by_name(&conn, name)?)
        })
    }

    pub fn add_department(
        &self,
        session: &Session,
        department: &Department,
    ) -> Result<Department, RecordsError> {
        session.require(Capability::ManageDepartments)?;
        validate_department(department)?;
        self.recorder.record("Add Department", || {
            let conn = self.connect()?;
            Ok(insert_department(&conn, department)?)
        })
    }

    pub fn update_department(
        &self,
        session: &Session,
        department: &Department,
    ) -> Result<Department, RecordsError> {
        session.require(Capability::ManageDepartments)?;
        validate_department(department)?;
        self.recorder.record("Update Department", || {
            let conn = self.connect()?;
            Ok(update_department(&conn, department)?)
        })
    }

    /// Fails with a storage error while doctors still belong to the department.
    pub fn delete_department(&self, session: &Session, id: i64) -> Result<bool, RecordsError> {
        self.run(session, Capability::ManageDepartments, "Delete Department", || {
            let conn = self.connect()?;
            Ok(delete_department(&conn, id)?)
        })
    }
}
