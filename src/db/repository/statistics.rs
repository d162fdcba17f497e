use chrono::Weekday;
use rusqlite::{params, Connection};
use serde::Serialize;

use super::{count_appointments, count_doctors, count_patients};
use crate::db::DatabaseError;

/// Monday first, the order the dashboard charts use.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStatistics {
    pub patient_count: i64,
    pub doctor_count: i64,
    pub appointment_count: i64,
    /// Seven entries, Monday to Sunday, zero-filled.
    pub appointments_per_weekday: Vec<(Weekday, i64)>,
    /// Patients grouped by the weekday they were registered on.
    pub patients_per_weekday: Vec<(Weekday, i64)>,
    pub doctors_per_specialization: Vec<(String, i64)>,
    /// Departments with at least one doctor, largest first.
    pub doctors_per_department: Vec<(String, i64)>,
}

pub fn dashboard_statistics(conn: &Connection) -> Result<DashboardStatistics, DatabaseError> {
    Ok(DashboardStatistics {
        patient_count: count_patients(conn)?,
        doctor_count: count_doctors(conn)?,
        appointment_count: count_appointments(conn)?,
        appointments_per_weekday: per_weekday(conn, "appointments", "appointment_date")?,
        patients_per_weekday: per_weekday(conn, "patients", "created_at")?,
        doctors_per_specialization: doctors_per_specialization(conn)?,
        doctors_per_department: doctors_per_department(conn)?,
    })
}

/// Row counts bucketed by the weekday of a stored timestamp column.
fn per_weekday(
    conn: &Connection,
    table: &str,
    column: &str,
) -> Result<Vec<(Weekday, i64)>, DatabaseError> {
    // strftime('%w'): 0 = Sunday .. 6 = Saturday
    let mut buckets = [0i64; 7];
    let sql = format!(
        "SELECT CAST(strftime('%w', {column}) AS INTEGER), COUNT(*)
         FROM {table}
         WHERE strftime('%w', {column}) IS NOT NULL
         GROUP BY 1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
    for row in rows {
        let (sunday_based, count) = row?;
        let monday_based = (sunday_based + 6) % 7;
        if let Some(slot) = usize::try_from(monday_based).ok().and_then(|i| buckets.get_mut(i)) {
            *slot = count;
        }
    }
    Ok(WEEK.iter().copied().zip(buckets).collect())
}

fn doctors_per_specialization(conn: &Connection) -> Result<Vec<(String, i64)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT CASE WHEN trim(specialization) = '' THEN 'Unknown' ELSE specialization END AS label,
                COUNT(*) AS n
         FROM doctors
         GROUP BY label
         ORDER BY n DESC, label",
    )?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn doctors_per_department(conn: &Connection) -> Result<Vec<(String, i64)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT dep.name, COUNT(doc.id) AS n
         FROM departments dep
         JOIN doctors doc ON doc.department_id = dep.id
         GROUP BY dep.id, dep.name
         HAVING n > 0
         ORDER BY n DESC, dep.name",
    )?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
