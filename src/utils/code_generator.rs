//! Random secret generation.
//!
//! Preview secrets and admin tokens are drawn from the alphanumeric alphabet
//! using the thread-local CSPRNG.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of the per-post preview secret.
pub const PREVIEW_SECRET_LENGTH: usize = 10;

/// Length of a generated admin API token.
pub const API_TOKEN_LENGTH: usize = 48;

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generates the secret that unlocks the preview URL of an unpublished post.
pub fn generate_preview_secret() -> String {
    random_alphanumeric(PREVIEW_SECRET_LENGTH)
}

/// Generates a raw admin API token.
pub fn generate_api_token() -> String {
    random_alphanumeric(API_TOKEN_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_preview_secret_length_and_alphabet() {
        let secret = generate_preview_secret();
        assert_eq!(secret.len(), PREVIEW_SECRET_LENGTH);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_api_token_length() {
        assert_eq!(generate_api_token().len(), API_TOKEN_LENGTH);
    }

    #[test]
    fn test_secrets_are_unique() {
        let secrets: HashSet<String> = (0..500).map(|_| generate_preview_secret()).collect();
        assert_eq!(secrets.len(), 500);
    }
}
