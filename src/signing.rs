//! Canonical signing strings, RSA signing and signature verification.
//!
//! Every request carries a `signature` computed as
//! `base64(RSA-PKCS#1-v1.5(digest(utf8(canonical))))`, where `canonical` is
//! the pipe-joined list of field values given by the operation's
//! [`Layout`](crate::protocol::Layout). The gateway signs its responses the
//! same way with its own key.

use crate::errors::{CsobError, Result};
use crate::keys::{GatewayKey, MerchantKey};
use crate::protocol::{DigestAlgorithm, Field, Layout, ProtocolVersion};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rsa::Pkcs1v15Sign;
use sha1::{Digest, Sha1};
use sha2::Sha256;

/// Separator between values of a signing string.
pub const DELIMITER: char = '|';

/// Ordered list of values joined with [`DELIMITER`].
///
/// # Examples
///
/// ```
/// use csob_rs::signing::SigningString;
///
/// let mut s = SigningString::new();
/// s.push("merchantId", "M1").push("payId", "P1").push("dttm", "20240101000000");
/// assert_eq!(s.build().unwrap(), "M1|P1|20240101000000");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningString {
    parts: Vec<(&'static str, String)>,
}

impl SigningString {
    /// Creates an empty signing string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value. `name` is only used in error messages.
    pub fn push(&mut self, name: &'static str, value: impl ToString) -> &mut Self {
        self.parts.push((name, value.to_string()));
        self
    }

    /// Appends a value if present; absent optional fields leave no trace,
    /// not even an empty slot.
    pub fn push_opt(&mut self, name: &'static str, value: Option<impl ToString>) -> &mut Self {
        if let Some(value) = value {
            self.push(name, value);
        }
        self
    }

    /// Builds the string for `layout`, pulling each field from `source`.
    pub fn from_layout(layout: &Layout, source: &dyn FieldSource) -> Self {
        let mut out = Self::new();
        for field in layout.fields {
            if *field == Field::Cart {
                for item in source.items() {
                    for item_field in layout.item_fields {
                        out.push_opt(item_field.json_key(), item.value(*item_field));
                    }
                }
            } else {
                out.push_opt(field.json_key(), source.value(*field));
            }
        }
        out
    }

    /// Number of values pushed so far.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether no value has been pushed.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Joins the values, rejecting any value that contains the delimiter.
    pub fn build(&self) -> Result<String> {
        if let Some((name, value)) = self.parts.iter().find(|(_, v)| v.contains(DELIMITER)) {
            return Err(CsobError::ValidationError(format!(
                "field '{}' must not contain '{}': {}",
                name, DELIMITER, value
            )));
        }
        let mut out = String::new();
        for (i, (_, value)) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push(DELIMITER);
            }
            out.push_str(value);
        }
        Ok(out)
    }
}

/// Something whose fields can be laid out into a signing string.
///
/// `value` returns the rendered text of a field, or `None` when the field is
/// absent from this message. Implementors must render exactly what they put
/// on the wire.
pub trait FieldSource {
    /// Rendered value of `field`, `None` if absent.
    fn value(&self, field: Field) -> Option<String>;

    /// Nested items substituted for [`Field::Cart`].
    fn items(&self) -> Vec<&dyn FieldSource> {
        Vec::new()
    }
}

impl DigestAlgorithm {
    /// Hashes `data` with this algorithm.
    pub fn hash(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    fn padding(self) -> Pkcs1v15Sign {
        match self {
            Self::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
            Self::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        }
    }
}

/// Signs canonical strings with the merchant key using the digest of the
/// active protocol version.
#[derive(Debug, Clone)]
pub struct Signer {
    key: MerchantKey,
    version: ProtocolVersion,
}

impl Signer {
    /// Creates a signer for `version`.
    pub fn new(key: MerchantKey, version: ProtocolVersion) -> Self {
        Self { key, version }
    }

    /// Protocol version whose digest this signer uses.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// The merchant key.
    pub fn key(&self) -> &MerchantKey {
        &self.key
    }

    /// Signs `message` and returns the Base64 signature.
    pub fn sign(&self, message: &str) -> Result<String> {
        sign(&self.key, self.version.digest(), message)
    }

    /// Lays out `source` per `layout`, then signs it.
    pub fn sign_fields(&self, layout: &Layout, source: &dyn FieldSource) -> Result<String> {
        let canonical = SigningString::from_layout(layout, source).build()?;
        tracing::trace!(%canonical, "signing");
        self.sign(&canonical)
    }
}

/// Signs `message` with `key` and returns the Base64 signature.
///
/// The digest is computed over the UTF-8 bytes of `message`; the RSA
/// operation is blinded with fresh randomness from the thread RNG.
pub fn sign(key: &MerchantKey, digest: DigestAlgorithm, message: &str) -> Result<String> {
    let hashed = digest.hash(message.as_bytes());
    let mut rng = rand::thread_rng();
    let signature = key
        .as_rsa()
        .sign_with_rng(&mut rng, digest.padding(), &hashed)
        .map_err(|e| CsobError::SigningError(e.to_string()))?;
    Ok(BASE64.encode(signature))
}

/// Verifies a Base64 `signature` over `message` with `key`.
pub fn verify(
    key: &GatewayKey,
    digest: DigestAlgorithm,
    message: &str,
    signature: &str,
) -> Result<()> {
    let raw = BASE64.decode(signature.trim().as_bytes())?;
    let hashed = digest.hash(message.as_bytes());
    key.as_rsa()
        .verify(digest.padding(), &hashed, &raw)
        .map_err(|_| {
            CsobError::SignatureMismatch(format!("signature does not match '{}'", message))
        })
}

/// Lays out `source` per `layout` and verifies `signature` over it.
pub fn verify_fields(
    key: &GatewayKey,
    digest: DigestAlgorithm,
    layout: &Layout,
    source: &dyn FieldSource,
    signature: &str,
) -> Result<()> {
    let canonical = SigningString::from_layout(layout, source).build()?;
    verify(key, digest, &canonical, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Operation;

    const MERCHANT_KEY: &str = include_str!("../tests/fixtures/merchant_test.key");

    const GOLDEN_MESSAGE: &str = "A1233aBcVn|554822|20151013133307|payment|card|1789600|CZK|true|https://vasobchod.cz/return-gateway|POST|žluťoučký kůň|1|1789600|Lenovo ThinkPad Edge E540|Poštovné|1|0|Doprava PPL|Nákup žluťoučký kůň na vasobchod.cz (Lenovo ThinkPad Edge E540, Doprava PPL)|c29tZS1iYXNlNjQtZW5jb2RlZC1tZXJjaGFudC1kYXRh|CZ";
    const GOLDEN_SHA1: &str = "CWrrR/6qPej2gxTSwSZ7Q2c2M+MmM4iOVohoj9VWPvkH6dlP3rO0LteX/Z8+q600XC6nPWft2g4FKZoaluABAd330h/cniQjZw2VqYYdxcfJILqWundXVKBvCH9vPETxM4h8FR8htOJZPHTiU+m3wwEPsXZi5ZdYYPj+pBPnkZ4wvwWwOdTvBU7S9Pr56w0NWAj3iByXajtOmBZ6T7tT3SLRceIRC4J37ygyfdRnb3qHn4YY7ipQQPdYMadtPnr6jSz21VFDMIDfYm36Xx4XwxmVePrjjw6HXUb8snvOQEk52XMPXvKRbySBU32dDArGGnKSAcdOSsMxPbQ5cs5/kQ==";
    const GOLDEN_SHA256: &str = "uZd+Qt4vRgxbrVw2AAABdvtqNGNlTlKOnaFQPiSuwv76t3+4+hj5dmfejkBh07DHhchxj+VJ+RJwGWS/WRZPAv20CZjA5dDPVcTZs77xeaqZP1GxLmqTQY9XOi6hVz0yN8I3vLo9crunNQWKxe2nHzlbdyixCgJRuF5+RBMhJw7egx3fEJPYZqKZYOiI82kolXSKCYqpC0IBIoyZR55YUeAC+Fao353yY+xSLUKk38ogysHPqOa+d5vW+mSd+i8ajJr9P5XkcerSGCKH/f7UgmO0Wg5F6/JAAJkKosp1Lt7+pbSYIWqr4QMqP4UvzX6WEG5Oba3aOUHva/KvtjuRog==";

    fn merchant_key() -> MerchantKey {
        MerchantKey::from_pem(MERCHANT_KEY).unwrap()
    }

    struct PayIdFields;

    impl FieldSource for PayIdFields {
        fn value(&self, field: Field) -> Option<String> {
            match field {
                Field::MerchantId => Some("M1".to_string()),
                Field::PayId => Some("P1".to_string()),
                Field::Dttm => Some("20240101000000".to_string()),
                _ => None,
            }
        }
    }

    #[test]
    fn test_build_joins_in_order() {
        let mut s = SigningString::new();
        s.push("a", "x").push("b", 12).push("c", true).push("d", "");
        assert_eq!(s.build().unwrap(), "x|12|true|");
        assert_eq!(s.len(), 4);
        assert_eq!(SigningString::new().build().unwrap(), "");
    }

    #[test]
    fn test_optional_values_are_omitted() {
        let mut s = SigningString::new();
        s.push("a", "x")
            .push_opt("b", None::<String>)
            .push_opt("c", Some("y"));
        assert_eq!(s.build().unwrap(), "x|y");
    }

    #[test]
    fn test_delimiter_in_value_is_rejected() {
        let mut s = SigningString::new();
        s.push("description", "a|b");
        match s.build().unwrap_err() {
            CsobError::ValidationError(msg) => assert!(msg.contains("description")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_from_layout() {
        let layout = Operation::PaymentProcess.layout(ProtocolVersion::V1_5);
        let s = SigningString::from_layout(&layout, &PayIdFields);
        assert_eq!(s.build().unwrap(), "M1|P1|20240101000000");
    }

    #[test]
    fn test_golden_signature_sha1() {
        let signature = sign(&merchant_key(), DigestAlgorithm::Sha1, GOLDEN_MESSAGE).unwrap();
        assert_eq!(signature, GOLDEN_SHA1);
    }

    #[test]
    fn test_golden_signature_sha256() {
        let signer = Signer::new(merchant_key(), ProtocolVersion::V1_7);
        assert_eq!(signer.sign(GOLDEN_MESSAGE).unwrap(), GOLDEN_SHA256);
    }

    #[test]
    fn test_sign_then_verify() {
        let key = merchant_key();
        let public = key.public_key();
        for digest in [DigestAlgorithm::Sha1, DigestAlgorithm::Sha256] {
            let signature = sign(&key, digest, "M1|20240101000000").unwrap();
            assert!(verify(&public, digest, "M1|20240101000000", &signature).is_ok());
            assert!(matches!(
                verify(&public, digest, "M1|20240101000001", &signature),
                Err(CsobError::SignatureMismatch(_))
            ));
        }
    }

    #[test]
    fn test_verify_rejects_wrong_digest() {
        let key = merchant_key();
        let signature = sign(&key, DigestAlgorithm::Sha1, GOLDEN_MESSAGE).unwrap();
        let public = key.public_key();
        assert!(verify(&public, DigestAlgorithm::Sha256, GOLDEN_MESSAGE, &signature).is_err());
    }

    #[test]
    fn test_verify_rejects_bad_base64() {
        let key = merchant_key();
        let err = verify(&key.public_key(), DigestAlgorithm::Sha1, "x", "%%%").unwrap_err();
        assert!(matches!(err, CsobError::Base64Error(_)));
    }

    #[test]
    fn test_digest_is_deterministic() {
        let a = DigestAlgorithm::Sha256.hash(b"M1|P1|20240101000000");
        let b = DigestAlgorithm::Sha256.hash(b"M1|P1|20240101000000");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert_eq!(DigestAlgorithm::Sha1.hash(b"").len(), 20);
    }

    #[test]
    fn test_sign_fields_matches_manual_string() {
        let signer = Signer::new(merchant_key(), ProtocolVersion::V1_5);
        let layout = Operation::PaymentStatus.layout(ProtocolVersion::V1_5);
        let via_layout = signer.sign_fields(&layout, &PayIdFields).unwrap();
        assert_eq!(via_layout, signer.sign("M1|P1|20240101000000").unwrap());
        assert_eq!(
            via_layout,
            "q/RpWZrE/1dTxweKzG8151CnXNZpfiK0i9WgvQol1KLY6Brn+nnr/T2Mhvu54XkKLiCsPGIwIGMi4xiFVRFaOoIxsAShT8N1h8AIP2DxWwRkVooaEJUNvaFOGznmOWZaDKGVOcMGu7V5Mm9yxI5lx/0YH2hCwQ/plAqHr1L3xVD1488WD2cIZ44rW2IyXAC+r0P6s4ZW451oX3aAyW+dMn9Qhor749szCy6S40q9XLqjIYCqdY4eoJqj3AVgs/OAvSXIDoabTafiJbjsdzifcx6CHzPWcVMnpY4mJt1d1yH58l7egYPlrDPkFxj+SWqKbRHkFihB2lF4ytyviswowg=="
        );
    }
}
