//! Status transition rules for material requests
use super::error::ValidationError;
use super::material::{MaterialRequest, Status, TimeStamp};
use super::session::Persona;
use chrono::Utc;

/// An event an actor asks the engine to apply to a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionEvent {
    SendEmailToIma,
    CloseRequest { material_number: String },
}

/// The partial-field shape sent to the record store for every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePatch {
    pub status: Status,
    pub modified_at: TimeStamp<Utc>,
    pub modified_by: String,
    pub material_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCommand {
    pub material_id: String,
    pub patch: UpdatePatch,
}

/// Validate `event` against the transition table and produce the update
/// command for the store, or reject without touching anything.
///
/// Only approvers may move a record forward. `SendEmailToIma` is legal from
/// `PendingApproval` alone; `CloseRequest` is legal from either pending
/// status and must carry a non-blank material number. `CompletedByIma` is
/// terminal.
pub fn request_transition(
    record: &MaterialRequest,
    event: &TransitionEvent,
    persona: Persona,
    actor: &str,
) -> Result<UpdateCommand, ValidationError> {
    // authorization first, before any state is inspected
    if persona != Persona::Approver {
        return Err(ValidationError::NotPermitted(persona));
    }

    let patch = match event {
        TransitionEvent::SendEmailToIma => match record.status {
            Status::PendingApproval => UpdatePatch {
                status: Status::PendingIma,
                modified_at: TimeStamp::new(),
                modified_by: actor.to_string(),
                material_number: None,
            },
            Status::PendingIma => return Err(ValidationError::EmailAlreadySent),
            Status::CompletedByIma => return Err(ValidationError::AlreadyCompleted),
        },
        TransitionEvent::CloseRequest { material_number } => {
            if record.status == Status::CompletedByIma {
                return Err(ValidationError::AlreadyCompleted);
            }
            let number = material_number.trim();
            if number.is_empty() {
                return Err(ValidationError::MissingMaterialNumber);
            }
            UpdatePatch {
                status: Status::CompletedByIma,
                modified_at: TimeStamp::new(),
                modified_by: actor.to_string(),
                material_number: Some(number.to_string()),
            }
        }
    };

    Ok(UpdateCommand {
        material_id: record.material_id.clone(),
        patch,
    })
}
