use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Role {
    Admin => "Admin",
    Doctor => "Doctor",
    Patient => "Patient",
});

str_enum!(AppointmentStatus {
    Scheduled => "Scheduled",
    Completed => "Completed",
    Cancelled => "Cancelled",
});

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn role_round_trips_through_storage_string() {
        for role in [Role::Admin, Role::Doctor, Role::Patient] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn unknown_status_is_invalid_enum() {
        match AppointmentStatus::from_str("Postponed") {
            Err(DatabaseError::InvalidEnum { field, value }) => {
                assert_eq!(field, "AppointmentStatus");
                assert_eq!(value, "Postponed");
            }
            other => panic!("Expected InvalidEnum, got: {other:?}"),
        }
    }

    #[test]
    fn display_matches_storage_string() {
        assert_eq!(Role::Doctor.to_string(), "Doctor");
        assert_eq!(AppointmentStatus::Cancelled.to_string(), "Cancelled");
    }
}
