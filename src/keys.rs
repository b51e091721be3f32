//! Key loading.
//!
//! The merchant signs every request with its RSA private key and verifies
//! gateway messages with the gateway's published RSA public key. Both are
//! read from PEM files once, when the client is built.

use crate::errors::{CsobError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use std::fmt;
use std::path::Path;

/// The merchant's RSA private key.
///
/// Immutable once loaded. `Debug` never prints key material.
#[derive(Clone)]
pub struct MerchantKey {
    inner: RsaPrivateKey,
}

impl MerchantKey {
    /// Reads and validates a PEM private key from `path`.
    ///
    /// Both `RSA PRIVATE KEY` (PKCS#1) and `PRIVATE KEY` (PKCS#8) files are accepted.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path).map_err(|e| {
            CsobError::KeyLoadError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_pem(&pem)
    }

    /// Parses and validates a PEM encoded private key.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let inner = if pem.contains("BEGIN RSA PRIVATE KEY") {
            RsaPrivateKey::from_pkcs1_pem(pem)
                .map_err(|e| CsobError::KeyLoadError(format!("invalid PKCS#1 key: {}", e)))?
        } else if pem.contains("BEGIN PRIVATE KEY") {
            RsaPrivateKey::from_pkcs8_pem(pem)
                .map_err(|e| CsobError::KeyLoadError(format!("invalid PKCS#8 key: {}", e)))?
        } else {
            return Err(CsobError::KeyLoadError(
                "no RSA private key found in PEM data".to_string(),
            ));
        };

        inner
            .validate()
            .map_err(|e| CsobError::KeyLoadError(format!("key failed validation: {}", e)))?;

        Ok(Self { inner })
    }

    /// The public half of this key.
    pub fn public_key(&self) -> GatewayKey {
        GatewayKey {
            inner: self.inner.to_public_key(),
        }
    }

    /// Decrypts a Base64 RSA-OAEP (SHA-1) ciphertext addressed to this key.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let bytes = BASE64.decode(ciphertext.trim().as_bytes())?;
        let plain = self
            .inner
            .decrypt(Oaep::new::<Sha1>(), &bytes)
            .map_err(|e| CsobError::DecryptionError(e.to_string()))?;
        String::from_utf8(plain)
            .map_err(|e| CsobError::DecryptionError(format!("plaintext is not UTF-8: {}", e)))
    }

    pub(crate) fn as_rsa(&self) -> &RsaPrivateKey {
        &self.inner
    }
}

impl fmt::Debug for MerchantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MerchantKey(..)")
    }
}

/// An RSA public key used to verify signatures, normally the gateway's.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayKey {
    inner: RsaPublicKey,
}

impl GatewayKey {
    /// Reads a PEM public key from `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path).map_err(|e| {
            CsobError::KeyLoadError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_pem(&pem)
    }

    /// Parses a `PUBLIC KEY` (SubjectPublicKeyInfo) or `RSA PUBLIC KEY` (PKCS#1) PEM.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let inner = if pem.contains("BEGIN RSA PUBLIC KEY") {
            RsaPublicKey::from_pkcs1_pem(pem)
                .map_err(|e| CsobError::KeyLoadError(format!("invalid PKCS#1 public key: {}", e)))?
        } else {
            RsaPublicKey::from_public_key_pem(pem)
                .map_err(|e| CsobError::KeyLoadError(format!("invalid public key: {}", e)))?
        };
        Ok(Self { inner })
    }

    pub(crate) fn as_rsa(&self) -> &RsaPublicKey {
        &self.inner
    }
}

impl From<RsaPublicKey> for GatewayKey {
    fn from(inner: RsaPublicKey) -> Self {
        Self { inner }
    }
}
