//! AEAD encryption - AES-256-GCM and ChaCha20-Poly1305

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use chacha20poly1305::ChaCha20Poly1305;
use serde::{Deserialize, Serialize};

use super::SharedKey;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Supported cipher suites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CipherSuite {
    #[default]
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("ciphertext too short ({0} bytes)")]
    TooShort(usize),
    #[error("authentication failed")]
    Authentication,
    #[error("encryption failed")]
    Encryption,
}

/// Symmetric AEAD cipher bound to one key
#[derive(Clone)]
pub struct AeadCipher {
    suite: CipherSuite,
    key: SharedKey,
}

impl AeadCipher {
    pub fn new(suite: CipherSuite, key: SharedKey) -> Self {
        Self { suite, key }
    }

    pub fn suite(&self) -> CipherSuite {
        self.suite
    }

    /// Encrypt plaintext
    /// Returns: nonce (12 bytes) || ciphertext || tag (16 bytes)
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = match self.suite {
            CipherSuite::Aes256Gcm => {
                let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.key.as_bytes()));
                cipher
                    .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
                    .map_err(|_| CryptoError::Encryption)?
            }
            CipherSuite::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(
                    self.key.as_bytes(),
                ));
                cipher
                    .encrypt(chacha20poly1305::Nonce::from_slice(&nonce_bytes), plaintext)
                    .map_err(|_| CryptoError::Encryption)?
            }
        };

        let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    /// Decrypt ciphertext
    /// Input format: nonce (12 bytes) || ciphertext || tag (16 bytes)
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::TooShort(data.len()));
        }

        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        match self.suite {
            CipherSuite::Aes256Gcm => {
                let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.key.as_bytes()));
                cipher
                    .decrypt(Nonce::from_slice(nonce), ciphertext)
                    .map_err(|_| CryptoError::Authentication)
            }
            CipherSuite::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(
                    self.key.as_bytes(),
                ));
                cipher
                    .decrypt(chacha20poly1305::Nonce::from_slice(nonce), ciphertext)
                    .map_err(|_| CryptoError::Authentication)
            }
        }
    }
}
