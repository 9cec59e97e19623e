pub mod datasets;
pub mod orgs;
pub mod representatives;
pub mod tasks;

use crate::errors::AppError;
use crate::models::user::User;

pub(crate) fn forbidden() -> AppError {
    AppError::forbidden("insufficient permissions")
}

/// Operational endpoints (tree surgery, raw task creation) are reserved for
/// staff regardless of bindings.
pub(crate) fn require_staff(user: &User) -> Result<(), AppError> {
    if user.is_staff || user.is_superuser {
        Ok(())
    } else {
        Err(forbidden())
    }
}
