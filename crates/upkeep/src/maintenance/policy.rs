use super::domain::{Role, User};
use super::service::MaintenanceError;

/// True iff an identity is present and carries exactly the required role.
pub fn authorize(identity: Option<&User>, required: Role) -> bool {
    identity.map_or(false, |user| user.role == required)
}

/// Gate a service operation on the acting identity's role.
pub(crate) fn require_role(identity: &User, required: Role) -> Result<(), MaintenanceError> {
    if authorize(Some(identity), required) {
        Ok(())
    } else {
        Err(MaintenanceError::Forbidden { required })
    }
}
