//! Field validation for records before they reach the store.
//!
//! Every validator collects all violations instead of stopping at the
//! first one, so a form can show the full list at once.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::models::{
    Department, Doctor, InventoryItem, Patient, PatientFeedback, PatientNote, Prescription,
};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s'-]{2,50}$").unwrap());
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{10}$").unwrap());
static ADDRESS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\s,.'-]{5,200}$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// Every rule a record broke.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{}", render(.0))]
pub struct ValidationErrors(pub Vec<FieldViolation>);

fn render(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self(vec![FieldViolation {
            field,
            message: message.into(),
        }])
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

// ═══════════════════════════════════════════════════════════
// Collector
// ═══════════════════════════════════════════════════════════

#[derive(Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldViolation {
            field,
            message: message.into(),
        });
    }

    fn required(&mut self, field: &'static str, value: &str, label: &str) -> bool {
        if value.trim().is_empty() {
            self.push(field, format!("{label} is required"));
            false
        } else {
            true
        }
    }

    fn name(&mut self, field: &'static str, value: &str, label: &str) {
        if self.required(field, value, label) && !NAME_PATTERN.is_match(value.trim()) {
            self.push(
                field,
                format!("{label} must be 2-50 letters, spaces, hyphens or apostrophes"),
            );
        }
    }

    fn optional_email(&mut self, field: &'static str, value: Option<&str>) {
        if let Some(email) = value.map(str::trim).filter(|s| !s.is_empty()) {
            if !EMAIL_PATTERN.is_match(email) {
                self.push(field, "Email must look like user@example.com");
            }
        }
    }

    fn optional_phone(&mut self, field: &'static str, value: Option<&str>) {
        if let Some(phone) = value.map(str::trim).filter(|s| !s.is_empty()) {
            if !PHONE_PATTERN.is_match(phone) {
                self.push(field, "Phone must contain exactly 10 digits");
            }
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.0))
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Validators
// ═══════════════════════════════════════════════════════════

pub fn validate_patient(patient: &Patient) -> Result<(), ValidationErrors> {
    let mut v = Violations::default();
    v.name("first_name", &patient.first_name, "First name");
    v.name("last_name", &patient.last_name, "Last name");
    v.required("gender", &patient.gender, "Gender");
    if v.required("email", &patient.email, "Email") {
        v.optional_email("email", Some(&patient.email));
    }
    v.optional_phone("phone", patient.phone.as_deref());
    if let Some(address) = patient.address.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        if !ADDRESS_PATTERN.is_match(address) {
            v.push(
                "address",
                "Address must be 5-200 letters, digits or common punctuation",
            );
        }
    }
    v.finish()
}

pub fn validate_doctor(doctor: &Doctor) -> Result<(), ValidationErrors> {
    let mut v = Violations::default();
    v.name("first_name", &doctor.first_name, "First name");
    v.name("last_name", &doctor.last_name, "Last name");
    v.required("specialization", &doctor.specialization, "Specialization");
    v.optional_email("email", doctor.email.as_deref());
    v.optional_phone("phone", doctor.phone.as_deref());
    v.finish()
}

pub fn validate_department(department: &Department) -> Result<(), ValidationErrors> {
    let mut v = Violations::default();
    let name = department.name.trim();
    if v.required("name", name, "Department name") && !(2..=100).contains(&name.chars().count())
    {
        v.push("name", "Department name must be 2-100 characters");
    }
    v.finish()
}

pub fn validate_inventory_item(item: &InventoryItem) -> Result<(), ValidationErrors> {
    let mut v = Violations::default();
    v.required("item_name", &item.item_name, "Item name");
    v.required("category", &item.category, "Category");
    if item.quantity < 0 {
        v.push("quantity", "Quantity cannot be negative");
    }
    if !item.unit_price.is_finite() || item.unit_price < 0.0 {
        v.push("unit_price", "Unit price must be a non-negative number");
    }
    v.finish()
}

pub fn validate_feedback(feedback: &PatientFeedback) -> Result<(), ValidationErrors> {
    let mut v = Violations::default();
    if !(1..=5).contains(&feedback.rating) {
        v.push("rating", "Rating must be between 1 and 5");
    }
    v.finish()
}

pub fn validate_prescription(prescription: &Prescription) -> Result<(), ValidationErrors> {
    let mut v = Violations::default();
    for item in &prescription.items {
        if item.quantity <= 0 {
            v.push("items.quantity", "Item quantity must be greater than zero");
        }
        if item.dosage_instructions.trim().is_empty() {
            v.push("items.dosage_instructions", "Dosage instructions are required");
        }
    }
    v.finish()
}

pub fn validate_note(note: &PatientNote) -> Result<(), ValidationErrors> {
    let mut v = Violations::default();
    v.required("category", &note.category, "Category");
    if note.content.values().all(|text| text.trim().is_empty()) {
        v.push("content", "Note content is required");
    }
    v.finish()
}

/// Account fields for a new user.
pub fn validate_credentials(username: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut v = Violations::default();
    v.required("username", username, "Username");
    v.required("password", password, "Password");
    v.finish()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::models::PrescriptionItem;

    fn ts() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-01-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn jane() -> Patient {
        Patient {
            id: 0,
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            gender: "Female".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            email: "jane@example.com".into(),
            phone: Some("5551234567".into()),
            address: Some("12 Elm Street, Springfield".into()),
            created_at: ts(),
        }
    }

    #[test]
    fn valid_patient_passes() {
        assert!(validate_patient(&jane()).is_ok());
    }

    #[test]
    fn all_patient_violations_are_collected() {
        let mut p = jane();
        p.first_name = "J4ne".into();
        p.last_name = String::new();
        p.email = "not-an-email".into();
        p.phone = Some("555-1234".into());
        p.address = Some("#1".into());

        let err = validate_patient(&p).unwrap_err();
        for field in ["first_name", "last_name", "email", "phone", "address"] {
            assert!(err.has_field(field), "missing violation for {field}: {err}");
        }
        assert_eq!(err.violations().len(), 5);
    }

    #[test]
    fn names_allow_hyphens_and_apostrophes() {
        let mut p = jane();
        p.first_name = "Mary-Ann".into();
        p.last_name = "O'Neil".into();
        assert!(validate_patient(&p).is_ok());
    }

    #[test]
    fn blank_optional_fields_are_accepted() {
        let mut p = jane();
        p.phone = Some("  ".into());
        p.address = None;
        assert!(validate_patient(&p).is_ok());
    }

    #[test]
    fn department_name_length_bounds() {
        let dept = |name: &str| Department {
            id: 0,
            name: name.into(),
            location: None,
        };
        assert!(validate_department(&dept("ER")).is_ok());
        assert!(validate_department(&dept("X")).is_err());
        assert!(validate_department(&dept(&"a".repeat(101))).is_err());
        assert!(validate_department(&dept("   ")).is_err());
    }

    #[test]
    fn inventory_rejects_negative_values() {
        let item = InventoryItem {
            id: 0,
            item_name: "Gauze".into(),
            category: "Supplies".into(),
            quantity: -3,
            unit_price: -1.0,
            last_updated: ts(),
        };
        let err = validate_inventory_item(&item).unwrap_err();
        assert!(err.has_field("quantity"));
        assert!(err.has_field("unit_price"));
    }

    #[test]
    fn feedback_rating_range() {
        let mut fb = PatientFeedback {
            id: 0,
            patient_id: 1,
            rating: 0,
            comments: None,
            feedback_date: ts(),
        };
        assert!(validate_feedback(&fb).is_err());
        fb.rating = 5;
        assert!(validate_feedback(&fb).is_ok());
    }

    #[test]
    fn prescription_items_need_quantity_and_dosage() {
        let p = Prescription {
            id: 0,
            patient_id: 1,
            doctor_id: 1,
            appointment_id: None,
            notes: None,
            prescription_date: ts(),
            items: vec![PrescriptionItem::new(1, 0, " ")],
        };
        let err = validate_prescription(&p).unwrap_err();
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn note_needs_category_and_content() {
        let note = PatientNote::new(1, "", BTreeMap::new(), ts());
        let err = validate_note(&note).unwrap_err();
        assert!(err.has_field("category"));
        assert!(err.has_field("content"));
    }

    #[test]
    fn display_lists_every_violation() {
        let err = validate_credentials("", "").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("username"));
        assert!(text.contains("password"));
    }
}
