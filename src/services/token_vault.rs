//! Seals the session token for storage on disk.
//!
//! AES-256-GCM via `ring`, keyed with PBKDF2-HMAC-SHA256 over the application
//! passphrase and a random per-seal salt. Key material is zeroized after use.

use std::num::NonZeroU32;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroize;

use crate::types::errors::VaultError;
use crate::types::session::SealedToken;

const VAULT_PASSPHRASE: &str = "skillforge-session-token-v1";
const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LENGTH: usize = 16;
const KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;

/// Seals and opens session tokens.
pub struct TokenVault {
    rng: SystemRandom,
    passphrase: String,
}

impl TokenVault {
    pub fn new() -> Self {
        Self::with_passphrase(VAULT_PASSPHRASE)
    }

    pub fn with_passphrase(passphrase: impl Into<String>) -> Self {
        Self {
            rng: SystemRandom::new(),
            passphrase: passphrase.into(),
        }
    }

    fn derive_key(&self, salt: &[u8]) -> Result<LessSafeKey, VaultError> {
        let iterations = NonZeroU32::new(PBKDF2_ITERATIONS)
            .ok_or_else(|| VaultError::KeyDerivation("invalid iteration count".to_string()))?;
        let mut key = [0u8; KEY_LENGTH];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            salt,
            self.passphrase.as_bytes(),
            &mut key,
        );
        let unbound = UnboundKey::new(&AES_256_GCM, &key);
        key.zeroize();
        unbound
            .map(LessSafeKey::new)
            .map_err(|_| VaultError::KeyDerivation("failed to build AES key".to_string()))
    }

    fn random<const N: usize>(&self) -> Result<[u8; N], VaultError> {
        let mut bytes = [0u8; N];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| VaultError::RandomGeneration(format!("failed to fill {} bytes", N)))?;
        Ok(bytes)
    }

    /// Encrypts `token` under a fresh salt and nonce.
    pub fn seal(&self, token: &str) -> Result<SealedToken, VaultError> {
        let salt: [u8; SALT_LENGTH] = self.random()?;
        let iv: [u8; NONCE_LENGTH] = self.random()?;
        let key = self.derive_key(&salt)?;

        let mut in_out = token.as_bytes().to_vec();
        key.seal_in_place_append_tag(Nonce::assume_unique_for_key(iv), Aad::empty(), &mut in_out)
            .map_err(|_| VaultError::Seal("AES-GCM seal failed".to_string()))?;

        let sealed = SealedToken {
            salt: BASE64.encode(salt),
            iv: BASE64.encode(iv),
            ciphertext: BASE64.encode(&in_out),
        };
        in_out.zeroize();
        Ok(sealed)
    }

    /// Decrypts a token sealed by [`TokenVault::seal`].
    pub fn open(&self, sealed: &SealedToken) -> Result<String, VaultError> {
        let decode = |field: &str, value: &str| {
            BASE64
                .decode(value)
                .map_err(|e| VaultError::Open(format!("{}: {}", field, e)))
        };
        let salt = decode("salt", &sealed.salt)?;
        let iv = decode("iv", &sealed.iv)?;
        let mut in_out = decode("ciphertext", &sealed.ciphertext)?;

        let nonce_bytes: [u8; NONCE_LENGTH] = iv.as_slice().try_into().map_err(|_| {
            VaultError::Open(format!("iv must be {} bytes, got {}", NONCE_LENGTH, iv.len()))
        })?;
        let key = self.derive_key(&salt)?;

        let plaintext = key
            .open_in_place(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| VaultError::Open("authentication failed".to_string()))?;
        let token = String::from_utf8(plaintext.to_vec())
            .map_err(|e| VaultError::Open(e.to_string()));
        in_out.zeroize();
        token
    }
}

impl Default for TokenVault {
    fn default() -> Self {
        Self::new()
    }
}
