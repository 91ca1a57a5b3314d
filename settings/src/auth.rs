use crate::errors::SettingsError;
use subtle::ConstantTimeEq;

/// Check a caller-supplied key against the configured secret in constant time.
pub fn authenticate(expected: &str, provided: Option<&str>) -> Result<(), SettingsError> {
    let Some(provided) = provided else {
        return Err(SettingsError::InvalidApiKey);
    };

    let matches: bool = expected.as_bytes().ct_eq(provided.as_bytes()).into();

    if expected.is_empty() || !matches {
        return Err(SettingsError::InvalidApiKey);
    }
    Ok(())
}
