// ABOUTME: PKCE (Proof Key for Code Exchange) for the installed-app authorization flow
// ABOUTME: Generates code verifiers and SHA256 challenges per RFC 7636

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

use crate::oauth::types::PkceChallenge;

const VERIFIER_LEN: usize = 64;

/// Generate a fresh verifier and its S256 challenge
pub fn generate_pkce_challenge() -> PkceChallenge {
    let code_verifier: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(VERIFIER_LEN)
        .map(char::from)
        .collect();

    let code_challenge = code_challenge_for(&code_verifier);

    PkceChallenge {
        code_verifier,
        code_challenge,
        code_challenge_method: "S256".to_string(),
    }
}

/// Base64url(SHA256(verifier)) without padding
pub fn code_challenge_for(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}
