//! Session sealing for the session cookie
//!
//! The session (tokens plus a user snapshot) is serialised to JSON and
//! encrypted with AES-256-GCM. The key is the SHA-256 digest of the cookie
//! password; every seal uses a fresh 96-bit random nonce. The cookie value is
//! `base64url(nonce || ciphertext)` without padding.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use common::Secret;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::user::{Impersonator, User};

const NONCE_SIZE: usize = 12;

/// Everything the cookie carries between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impersonator: Option<Impersonator>,
}

/// Encrypt session data into a cookie-safe string.
pub fn seal_session(data: &SessionData, password: &Secret<String>) -> Result<String> {
    let json = serde_json::to_vec(data).map_err(|e| Error::Seal(e.to_string()))?;

    let cipher = cipher(password);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, json.as_slice())
        .map_err(|_| Error::Seal("encryption failed".into()))?;

    let mut combined = nonce.to_vec();
    combined.extend_from_slice(&ciphertext);

    Ok(URL_SAFE_NO_PAD.encode(combined))
}

/// Decrypt and parse a sealed cookie value.
pub fn unseal_session(sealed: &str, password: &Secret<String>) -> Result<SessionData> {
    let decoded = URL_SAFE_NO_PAD
        .decode(sealed)
        .map_err(|_| Error::InvalidSealedSession)?;

    if decoded.len() <= NONCE_SIZE {
        return Err(Error::InvalidSealedSession);
    }

    let nonce_bytes: [u8; NONCE_SIZE] = decoded[..NONCE_SIZE]
        .try_into()
        .map_err(|_| Error::InvalidSealedSession)?;
    let nonce = Nonce::from(nonce_bytes);

    let plaintext = cipher(password)
        .decrypt(&nonce, &decoded[NONCE_SIZE..])
        .map_err(|_| Error::InvalidSealedSession)?;

    serde_json::from_slice(&plaintext).map_err(|_| Error::InvalidSealedSession)
}

fn cipher(password: &Secret<String>) -> Aes256Gcm {
    let digest: [u8; 32] = Sha256::digest(password.expose().as_bytes()).into();
    let key = Key::<Aes256Gcm>::from(digest);
    Aes256Gcm::new(&key)
}
