// Handlers module
pub mod admin;
pub mod api_keys;
pub mod auth;
pub mod health;
pub mod shoes;

use validator::{Validate, ValidationError};

use crate::error::{ApiError, ApiResult};
use crate::store::Page;

/// Run `validator` rules and turn failures into a 400 envelope.
pub(crate) fn validated<T: Validate>(value: T) -> ApiResult<T> {
    value.validate()?;
    Ok(value)
}

/// Page defaults to 1 and must be positive; limit defaults to `default_limit`
/// and is capped at `max_limit`.
pub(crate) fn resolve_page(
    page: Option<u32>,
    limit: Option<u32>,
    default_limit: u32,
    max_limit: u32,
) -> ApiResult<Page> {
    let page = page.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::validation("page must be at least 1"));
    }

    let limit = limit.unwrap_or(default_limit);
    if limit == 0 {
        return Err(ApiError::validation("limit must be at least 1"));
    }

    Ok(Page {
        page,
        limit: limit.min(max_limit),
    })
}

/// Rejects strings that are empty once trimmed.
pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_page_defaults_and_caps() {
        assert_eq!(
            resolve_page(None, None, 10, 100).unwrap(),
            Page { page: 1, limit: 10 }
        );
        assert_eq!(
            resolve_page(Some(3), Some(1000), 10, 100).unwrap(),
            Page { page: 3, limit: 100 }
        );
    }

    #[test]
    fn test_resolve_page_rejects_zero() {
        assert!(resolve_page(Some(0), None, 10, 100).is_err());
        assert!(resolve_page(None, Some(0), 10, 100).is_err());
    }
}
