//! Account validation collaborator for `Register`. A trait at the seam,
//! like the oracle's test-mode split, with a permissive default
//! implementation so the rest of the stack never has to special-case "no
//! identity provider configured."
#[async_trait::async_trait]
pub trait AccountValidator: Send + Sync {
    /// Resolves `account` to a display name, or rejects it outright.
    async fn validate(&self, account: &str, requested_name: Option<&str>) -> Result<String, ValidationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidAccount,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAccount => write!(f, "invalid-account"),
        }
    }
}
impl std::error::Error for ValidationError {}

/// Accepts any non-empty account string, falling back to the account itself
/// as the display name. Good enough until a real identity provider exists.
#[derive(Debug, Default)]
pub struct PermissiveValidator;

#[async_trait::async_trait]
impl AccountValidator for PermissiveValidator {
    async fn validate(&self, account: &str, requested_name: Option<&str>) -> Result<String, ValidationError> {
        if account.trim().is_empty() {
            return Err(ValidationError::InvalidAccount);
        }
        Ok(requested_name
            .map(str::to_string)
            .unwrap_or_else(|| account.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_empty_account() {
        let v = PermissiveValidator;
        assert_eq!(
            v.validate("   ", None).await,
            Err(ValidationError::InvalidAccount)
        );
    }

    #[tokio::test]
    async fn falls_back_to_account_as_display_name() {
        let v = PermissiveValidator;
        assert_eq!(v.validate("0xabc", None).await, Ok("0xabc".to_string()));
    }

    #[tokio::test]
    async fn honors_requested_display_name() {
        let v = PermissiveValidator;
        assert_eq!(
            v.validate("0xabc", Some("alice")).await,
            Ok("alice".to_string())
        );
    }
}
