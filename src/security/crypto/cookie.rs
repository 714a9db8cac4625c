//! Cookie encryption.
//!
//! Implements AES-GCM encryption with HMAC-derived per-cookie keys for
//! tamper-evident session cookies.

use crate::config::{GuardError, Result};
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const TOKEN_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Minimum secret length accepted at startup.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct CookieCrypto {
    master_key: [u8; 32],
}

impl std::fmt::Debug for CookieCrypto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieCrypto").finish_non_exhaustive()
    }
}

impl CookieCrypto {
    /// Creates a new `CookieCrypto` instance using the provided secret.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Config` if the secret is shorter than
    /// [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: &str) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(GuardError::Config(format!(
                "SESSION_SECRET must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        let result = hasher.finalize();
        let mut master_key = [0u8; 32];
        master_key.copy_from_slice(&result);
        Ok(Self { master_key })
    }

    /// Encrypts data into a URL-safe string. `aad` is authenticated but
    /// not stored; decryption must present the same bytes.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Crypto` if AES-GCM encryption fails.
    pub fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> Result<String> {
        let mut token = [0u8; TOKEN_LEN];
        OsRng.fill_bytes(&mut token);

        let derived_key = self.derive_key(&token)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived_key));
        let ciphertext = cipher
            .encrypt(nonce, Payload { msg: plaintext, aad })
            .map_err(|e| GuardError::Crypto(e.to_string()))?;

        let mut combined = Vec::with_capacity(TOKEN_LEN + NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&token);
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(&combined))
    }

    /// Decrypts session data from a URL-safe string.
    ///
    /// Any malformed, truncated or tampered input, or a mismatched `aad`,
    /// yields `None`.
    #[must_use]
    pub fn decrypt(&self, encoded: &str, aad: &[u8]) -> Option<Vec<u8>> {
        let combined = URL_SAFE_NO_PAD.decode(encoded).ok()?;

        if combined.len() < TOKEN_LEN + NONCE_LEN + TAG_LEN + 1 {
            return None;
        }

        let token = &combined[..TOKEN_LEN];
        let nonce = Nonce::from_slice(&combined[TOKEN_LEN..TOKEN_LEN + NONCE_LEN]);
        let ciphertext = &combined[TOKEN_LEN + NONCE_LEN..];

        let derived_key = self.derive_key(token).ok()?;

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived_key));
        cipher
            .decrypt(nonce, Payload { msg: ciphertext, aad })
            .ok()
    }

    fn derive_key(&self, token: &[u8]) -> Result<[u8; 32]> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.master_key)
            .map_err(|e| GuardError::Crypto(e.to_string()))?;
        mac.update(token);
        let result = mac.finalize();
        let mut key = [0u8; 32];
        key.copy_from_slice(&result.into_bytes());
        Ok(key)
    }
}
