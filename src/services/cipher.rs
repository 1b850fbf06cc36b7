// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AES-256-GCM encryption for refresh tokens at rest.
//!
//! Envelope format: `base64(nonce):base64(tag):base64(ciphertext)`, standard
//! base64 with padding. A fresh 96-bit nonce is drawn for every call.

use crate::error::AppError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};

const KEY_LEN: usize = 32;
const ENVELOPE_PARTS: usize = 3;
const DELIMITER: char = ':';

/// Symmetric cipher for refresh tokens.
#[derive(Clone)]
pub struct TokenCipher {
    key: [u8; KEY_LEN],
    rng: SystemRandom,
}

impl TokenCipher {
    /// Derive the key from a configured secret.
    ///
    /// The secret's bytes are space-padded or truncated to exactly 32 bytes.
    /// This keeps a misconfigured dev secret usable; production secrets should
    /// already be 32 random bytes.
    pub fn new(secret: &str) -> Self {
        let mut key = [b' '; KEY_LEN];
        let bytes = secret.as_bytes();
        let len = bytes.len().min(KEY_LEN);
        key[..len].copy_from_slice(&bytes[..len]);

        Self {
            key,
            rng: SystemRandom::new(),
        }
    }

    fn sealing_key(&self) -> Option<LessSafeKey> {
        UnboundKey::new(&AES_256_GCM, &self.key)
            .ok()
            .map(LessSafeKey::new)
    }

    /// Encrypt `plaintext` into an envelope string.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, AppError> {
        let key = self
            .sealing_key()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Invalid cipher key")))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Nonce generation failed")))?;

        let mut in_out = plaintext.as_bytes().to_vec();
        let tag = key
            .seal_in_place_separate_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Encryption failed")))?;

        Ok(format!(
            "{}{DELIMITER}{}{DELIMITER}{}",
            BASE64.encode(nonce_bytes),
            BASE64.encode(tag.as_ref()),
            BASE64.encode(&in_out)
        ))
    }

    /// Decrypt an envelope produced by [`TokenCipher::encrypt`].
    ///
    /// Returns `None` for any malformed, tampered or foreign envelope.
    pub fn decrypt(&self, envelope: &str) -> Option<String> {
        let parts: Vec<&str> = envelope.split(DELIMITER).collect();
        if parts.len() != ENVELOPE_PARTS || parts.iter().any(|p| p.is_empty()) {
            return None;
        }

        let nonce_bytes = BASE64.decode(parts[0]).ok()?;
        let tag = BASE64.decode(parts[1]).ok()?;
        let ciphertext = BASE64.decode(parts[2]).ok()?;

        if tag.len() != AES_256_GCM.tag_len() {
            return None;
        }
        let nonce = Nonce::try_assume_unique_for_key(&nonce_bytes).ok()?;

        let mut in_out = ciphertext;
        in_out.extend_from_slice(&tag);

        let key = self.sealing_key()?;
        let plaintext = key.open_in_place(nonce, Aad::empty(), &mut in_out).ok()?;

        String::from_utf8(plaintext.to_vec()).ok()
    }
}
