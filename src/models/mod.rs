pub mod appointment;
pub mod department;
pub mod doctor;
pub mod enums;
pub mod feedback;
pub mod inventory;
pub mod note;
pub mod patient;
pub mod prescription;
pub mod user;

pub use appointment::*;
pub use department::*;
pub use doctor::*;
pub use enums::*;
pub use feedback::*;
pub use inventory::*;
pub use note::*;
pub use patient::*;
pub use prescription::*;
pub use user::*;
