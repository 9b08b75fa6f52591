use validator::Validate;

use crate::error::ApiError;

/// Runs the declarative field checks on a request payload and hands it
/// back, so handlers can bind the validated value in one line.
pub fn validated<T: Validate>(payload: T) -> Result<T, ApiError> {
    payload
        .validate()
        .map_err(|err| ApiError::Validation(err.to_string()))?;
    Ok(payload)
}
