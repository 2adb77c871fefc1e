// src/handlers.rs

use validator::ValidationError;

pub mod billing;
pub mod bookings;
pub mod groups;
pub mod notifications;
pub mod rooms;
pub mod shifts;

// Só espaços não conta como preenchido
pub(crate) fn validate_not_blank(val: &str) -> Result<(), ValidationError> {
    if val.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("The field cannot be blank.".into());
        return Err(err);
    }
    Ok(())
}
