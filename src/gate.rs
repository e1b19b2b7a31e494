use crate::error::ApiError;

/// Validates the caller-supplied key against the configured admin secret.
///
/// No secret configured means the whole admin surface is disabled by the
/// deployment, which is a different answer than a wrong key.
pub fn check_secret(configured: Option<&str>, supplied: Option<&str>) -> Result<(), ApiError> {
    let secret = match configured {
        Some(s) => s,
        None => {
            return Err(ApiError::NotConfigured(
                "Admin operations are not configured (set an admin secret)".to_string(),
            ));
        }
    };

    match supplied {
        Some(key) if key == secret => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_secret_is_not_configured() {
        let res = check_secret(None, Some("anything"));
        assert!(matches!(res, Err(ApiError::NotConfigured(_))));
    }

    #[test]
    fn test_wrong_or_missing_key_is_unauthorized() {
        assert_eq!(check_secret(Some("s3cret"), Some("wrong")), Err(ApiError::Unauthorized));
        assert_eq!(check_secret(Some("s3cret"), None), Err(ApiError::Unauthorized));
    }

    #[test]
    fn test_matching_key_passes() {
        assert_eq!(check_secret(Some("s3cret"), Some("s3cret")), Ok(()));
    }
}
