//! API key resolution and validation.
//!
//! Resolution order: session-held value, then the `OPENAI_API_KEY`
//! environment variable, then the encrypted secrets store. The first
//! candidate present is validated; a failed validation is terminal for
//! that resolution attempt (no fallthrough to later sources).

use std::fmt;

use crate::config::Config;
use crate::security::SecretStore;

/// Environment variable consulted during resolution.
pub const ENV_VAR: &str = "OPENAI_API_KEY";

const KEY_PREFIX: &str = "sk-";

/// Documentation placeholders that must never be accepted as real keys.
const PLACEHOLDER_DENY_LIST: [&str; 4] = [
    "your-openai-api-key-here",
    "sk-your-actual-openai-api-key-here",
    "your-ope************here",
    "your-api-key-here",
];

/// An accepted API key. Construction only via [`validate`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// The raw key, for the Authorization header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

// Keys must never leak through Debug output or logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(sk-***)")
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("no API key found: set {ENV_VAR}, run `streamsage key set`, or pass one interactively")]
    Missing,
    #[error("the configured API key is a documentation placeholder, not a real key")]
    Placeholder,
    #[error("API keys must start with `{KEY_PREFIX}`")]
    Malformed,
}

/// Validate a candidate key. Placeholder check runs first so a deny-listed
/// value with a correct prefix is still rejected.
pub fn validate(candidate: &str) -> Result<Credential, CredentialError> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return Err(CredentialError::Missing);
    }
    if PLACEHOLDER_DENY_LIST
        .iter()
        .any(|placeholder| candidate.contains(placeholder))
    {
        return Err(CredentialError::Placeholder);
    }
    if !candidate.starts_with(KEY_PREFIX) {
        return Err(CredentialError::Malformed);
    }
    Ok(Credential(candidate.to_string()))
}

/// Pure resolution over already-gathered candidates. The first source with a
/// value wins and is validated; later sources are not consulted after a
/// validation failure.
pub fn resolve_from(
    session: Option<&str>,
    env_value: Option<&str>,
    stored: Option<&str>,
) -> Result<Credential, CredentialError> {
    let candidate = session
        .or(env_value)
        .or(stored)
        .ok_or(CredentialError::Missing)?;
    validate(candidate)
}

/// Resolve a credential from the live environment and config.
///
/// `session` is a value already accepted earlier in this session, if any.
/// A stored key is decrypted through the secret store when encrypted.
pub fn resolve(
    session: Option<&str>,
    config: &Config,
    store: &SecretStore,
) -> Result<Credential, CredentialError> {
    let env_value = std::env::var(ENV_VAR).ok();
    let stored = config
        .api_key
        .as_deref()
        .map(|raw| {
            if SecretStore::is_encrypted(raw) {
                store.decrypt(raw).map_err(|err| {
                    tracing::warn!("failed to decrypt stored API key: {err}");
                    CredentialError::Malformed
                })
            } else {
                Ok(raw.to_string())
            }
        })
        .transpose()?;

    resolve_from(session, env_value.as_deref(), stored.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_every_placeholder_even_with_prefix() {
        for placeholder in PLACEHOLDER_DENY_LIST {
            let prefixed = format!("sk-{placeholder}");
            assert_eq!(
                validate(&prefixed).unwrap_err(),
                CredentialError::Placeholder,
                "placeholder {placeholder:?} slipped through"
            );
            // Bare placeholder fails too, whichever error fires first.
            assert!(validate(placeholder).is_err());
        }
    }

    #[test]
    fn rejects_missing_prefix() {
        assert_eq!(
            validate("pk-not-an-openai-key").unwrap_err(),
            CredentialError::Malformed
        );
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!(validate("").unwrap_err(), CredentialError::Missing);
        assert_eq!(validate("   ").unwrap_err(), CredentialError::Missing);
    }

    #[test]
    fn accepts_valid_looking_token() {
        let credential = validate("sk-proj-abc123xyz").unwrap();
        assert_eq!(credential.expose(), "sk-proj-abc123xyz");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let credential = validate("  sk-proj-abc123xyz\n").unwrap();
        assert_eq!(credential.expose(), "sk-proj-abc123xyz");
    }

    #[test]
    fn session_value_wins_over_env_and_store() {
        let credential =
            resolve_from(Some("sk-session"), Some("sk-env"), Some("sk-stored")).unwrap();
        assert_eq!(credential.expose(), "sk-session");
    }

    #[test]
    fn env_wins_over_store_when_no_session_value() {
        let credential = resolve_from(None, Some("sk-env"), Some("sk-stored")).unwrap();
        assert_eq!(credential.expose(), "sk-env");
    }

    #[test]
    fn falls_back_to_store_last() {
        let credential = resolve_from(None, None, Some("sk-stored")).unwrap();
        assert_eq!(credential.expose(), "sk-stored");
    }

    #[test]
    fn all_sources_absent_is_missing() {
        assert_eq!(
            resolve_from(None, None, None).unwrap_err(),
            CredentialError::Missing
        );
    }

    #[test]
    fn invalid_first_source_does_not_fall_through() {
        // A present-but-invalid env value must fail even though the store
        // holds a valid key.
        let result = resolve_from(None, Some("your-api-key-here"), Some("sk-stored"));
        assert_eq!(result.unwrap_err(), CredentialError::Placeholder);
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let credential = validate("sk-very-secret-value").unwrap();
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("very-secret-value"));
    }
}
