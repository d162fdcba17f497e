//! Role-based capability checks.
//!
//! One table decides what each role may do. The records facade consults
//! it before dispatching any operation:
//! 1. No authenticated user → DENY
//! 2. Role grants the capability → ALLOW
//! 3. Default → DENY

use serde::Serialize;

use crate::models::Role;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Something a user can do through the records facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    ViewDashboard,
    ViewPatients,
    EditPatients,
    ViewDoctors,
    EditDoctors,
    ViewDepartments,
    ManageDepartments,
    ViewInventory,
    ManageInventory,
    BookAppointment,
    ManageAppointments,
    ViewPrescriptions,
    EditPrescriptions,
    SubmitFeedback,
    ViewFeedback,
    ManagePatientNotes,
    ViewPerformance,
    ManageUsers,
}

impl Capability {
    pub const ALL: [Capability; 18] = [
        Capability::ViewDashboard,
        Capability::ViewPatients,
        Capability::EditPatients,
        Capability::ViewDoctors,
        Capability::EditDoctors,
        Capability::ViewDepartments,
        Capability::ManageDepartments,
        Capability::ViewInventory,
        Capability::ManageInventory,
        Capability::BookAppointment,
        Capability::ManageAppointments,
        Capability::ViewPrescriptions,
        Capability::EditPrescriptions,
        Capability::SubmitFeedback,
        Capability::ViewFeedback,
        Capability::ManagePatientNotes,
        Capability::ViewPerformance,
        Capability::ManageUsers,
    ];
}

/// Why access was granted or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    /// The role's entry in the table includes the capability.
    RoleGrant,
    /// Nobody is logged in.
    NotAuthenticated,
    /// Logged in, but the role lacks the capability.
    RoleLacksCapability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Access denied: {} may not {capability:?}", role_label(*.role))]
pub struct AccessDenied {
    /// `None` when no user was authenticated.
    pub role: Option<Role>,
    pub capability: Capability,
}

fn role_label(role: Option<Role>) -> &'static str {
    role.map(|r| r.as_str()).unwrap_or("anonymous user")
}

// ═══════════════════════════════════════════════════════════
// Capability table
// ═══════════════════════════════════════════════════════════

/// Whether `role` holds `capability`.
pub fn allows(role: Role, capability: Capability) -> bool {
    use Capability::*;

    match role {
        Role::Admin => true,
        Role::Doctor => matches!(
            capability,
            ViewDashboard
                | ViewPatients
                | EditPatients
                | ViewDoctors
                | ViewDepartments
                | ViewInventory
                | BookAppointment
                | ManageAppointments
                | ViewPrescriptions
                | EditPrescriptions
                | SubmitFeedback
                | ViewFeedback
                | ManagePatientNotes
        ),
        Role::Patient => matches!(
            capability,
            BookAppointment | ViewPrescriptions | SubmitFeedback
        ),
    }
}

/// Every capability `role` holds, in table order. Drives navigation menus.
pub fn capabilities_for(role: Role) -> Vec<Capability> {
    Capability::ALL
        .iter()
        .copied()
        .filter(|&c| allows(role, c))
        .collect()
}

/// Decide whether an (optionally) authenticated role may use `capability`.
pub fn check_access(role: Option<Role>, capability: Capability) -> AccessDecision {
    match role {
        None => AccessDecision {
            allowed: false,
            reason: AccessReason::NotAuthenticated,
        },
        Some(role) if allows(role, capability) => AccessDecision {
            allowed: true,
            reason: AccessReason::RoleGrant,
        },
        Some(_) => AccessDecision {
            allowed: false,
            reason: AccessReason::RoleLacksCapability,
        },
    }
}

/// `check_access` as a `Result`.
pub fn require(role: Option<Role>, capability: Capability) -> Result<(), AccessDenied> {
    if check_access(role, capability).allowed {
        Ok(())
    } else {
        tracing::debug!(?role, ?capability, "Access denied");
        Err(AccessDenied { role, capability })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_every_capability() {
        assert_eq!(capabilities_for(Role::Admin).len(), Capability::ALL.len());
    }

    #[test]
    fn patient_capabilities_are_limited() {
        assert_eq!(
            capabilities_for(Role::Patient),
            vec![
                Capability::BookAppointment,
                Capability::ViewPrescriptions,
                Capability::SubmitFeedback,
            ]
        );
    }

    #[test]
    fn admin_only_capabilities() {
        for cap in [
            Capability::EditDoctors,
            Capability::ManageDepartments,
            Capability::ManageInventory,
            Capability::ViewPerformance,
            Capability::ManageUsers,
        ] {
            assert!(allows(Role::Admin, cap));
            assert!(!allows(Role::Doctor, cap), "Doctor should not hold {cap:?}");
            assert!(!allows(Role::Patient, cap), "Patient should not hold {cap:?}");
        }
    }

    #[test]
    fn doctor_can_edit_clinical_records() {
        for cap in [
            Capability::EditPatients,
            Capability::EditPrescriptions,
            Capability::ManageAppointments,
            Capability::ManagePatientNotes,
        ] {
            assert!(allows(Role::Doctor, cap));
        }
    }

    #[test]
    fn anonymous_is_denied_with_reason() {
        let decision = check_access(None, Capability::BookAppointment);
        assert!(!decision.allowed);
        assert_eq!(decision.reason, AccessReason::NotAuthenticated);
    }

    #[test]
    fn require_reports_role_and_capability() {
        let err = require(Some(Role::Patient), Capability::ViewPatients).unwrap_err();
        assert_eq!(err.role, Some(Role::Patient));
        assert_eq!(err.capability, Capability::ViewPatients);
        assert!(err.to_string().contains("Patient"));

        let err = require(None, Capability::ViewPatients).unwrap_err();
        assert!(err.to_string().contains("anonymous"));
    }
}
